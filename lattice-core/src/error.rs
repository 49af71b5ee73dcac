use thiserror::Error;

/// Errors returned by ring, codec and protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input ended before a complete encoding could be read
    #[error("input truncated: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Input has the wrong exact length
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Bytes decode to a value outside the allowed range
    #[error("invalid encoding: {0}")]
    InvalidEncoding(&'static str),

    /// Vector/matrix or transform dimensions do not agree
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported security level {0}")]
    UnsupportedSecurityLevel(u32),

    /// Keys or parameters belong to different parameter sets
    #[error("parameter set mismatch")]
    ParameterMismatch,

    #[error("too many recipients: at most {max}, got {actual}")]
    TooManyRecipients { max: usize, actual: usize },
}

impl Error {
    /// True for errors caused by malformed serialized input
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::Truncated { .. } | Error::InvalidLength { .. } | Error::InvalidEncoding(_)
        )
    }
}

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;
