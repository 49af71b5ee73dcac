//! Parameter sets for the three mmKyber security levels.
//!
//! The sets are static; a serialized [`ParameterSet`] loaded from a
//! configuration file is resolved to its level with
//! [`SecurityLevel::from_params`].

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::digest::XofReader;

use lattice_core::codec::packed_len;
use lattice_core::sampling::{
    decode_binary, decode_ternary, sample_binary, sample_ternary, BINARY_BYTES, TERNARY_BYTES,
};
use lattice_core::{Error, Result, XofKind};

use crate::ciphertext::Mode;

// Common ring parameters
pub use lattice_core::params::{LOG_Q, N, Q};

/// Largest number of recipients a single encapsulation may address
pub const MAX_RECIPIENTS: usize = 1024;

/// Represents the security parameter sets for mmKyber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// mmKyber-128, ternary secrets
    Level128,
    /// mmKyber-192, binary secrets
    Level192,
    /// mmKyber-256, binary secrets
    Level256,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 3] = [
        SecurityLevel::Level128,
        SecurityLevel::Level192,
        SecurityLevel::Level256,
    ];

    /// Maps a bit-security figure (128, 192, 256) to its level
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            128 => Ok(SecurityLevel::Level128),
            192 => Ok(SecurityLevel::Level192),
            256 => Ok(SecurityLevel::Level256),
            other => Err(Error::UnsupportedSecurityLevel(other)),
        }
    }

    /// Resolves a loaded parameter set to the level it describes
    ///
    /// The set must pass [`ParameterSet::validate`] and equal one of the
    /// built-in sets field for field.
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        params.validate()?;
        Self::ALL
            .into_iter()
            .find(|level| level.params() == params)
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "no supported parameter set matches the given {}-bit set",
                    params.security
                ))
            })
    }

    pub fn bits(&self) -> u32 {
        self.params().security
    }

    /// Returns the static parameter set for this level
    pub fn params(&self) -> &'static ParameterSet {
        match self {
            SecurityLevel::Level128 => &MMKYBER_128,
            SecurityLevel::Level192 => &MMKYBER_192,
            SecurityLevel::Level256 => &MMKYBER_256,
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Distribution of the small secret and error polynomials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretDistribution {
    /// Coefficients in {0, 1}, packed eight per byte
    Binary,
    /// Coefficients in {-1, 0, 1}, packed five per byte
    Ternary,
}

impl SecretDistribution {
    /// Bytes in the compact encoding of one polynomial
    pub fn encoded_len(&self) -> usize {
        match self {
            SecretDistribution::Binary => BINARY_BYTES,
            SecretDistribution::Ternary => TERNARY_BYTES,
        }
    }

    /// Draws the compact encoding of one polynomial from the stream
    pub fn sample(&self, xof: &mut impl XofReader) -> Vec<u8> {
        match self {
            SecretDistribution::Binary => sample_binary(xof),
            SecretDistribution::Ternary => sample_ternary(xof),
        }
    }

    /// Decodes one compact encoding into signed coefficients
    pub fn decode(&self, bytes: &[u8]) -> Result<[i32; N]> {
        match self {
            SecretDistribution::Binary => decode_binary(bytes),
            SecretDistribution::Ternary => decode_ternary(bytes),
        }
    }
}

/// A complete mmKyber parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Claimed security level in bits
    pub security: u32,
    /// Coefficient modulus
    pub q: i32,
    /// Ring degree
    pub d: usize,
    /// Rows of the public matrix A (length of s, u)
    pub m: usize,
    /// Columns of the public matrix A (length of b, r)
    pub n: usize,
    /// Small secret distribution
    pub secret: SecretDistribution,
    /// Bits per coefficient of the shared ciphertext
    pub du: usize,
    /// Bits per coefficient of a PKE individual ciphertext
    pub dv: usize,
    /// Gaussian width for r and e_u
    pub sigma0: f64,
    /// Gaussian width for the per-recipient noise y_i
    pub sigma1: f64,
    pub max_recipients: usize,
}

pub static MMKYBER_128: ParameterSet = ParameterSet {
    security: 128,
    q: Q,
    d: N,
    m: 4,
    n: 4,
    secret: SecretDistribution::Ternary,
    du: 14,
    dv: 2,
    sigma0: 15.90,
    sigma1: 368459.34,
    max_recipients: MAX_RECIPIENTS,
};

pub static MMKYBER_192: ParameterSet = ParameterSet {
    security: 192,
    q: Q,
    d: N,
    m: 7,
    n: 7,
    secret: SecretDistribution::Binary,
    du: 15,
    dv: 2,
    sigma0: 15.90,
    sigma1: 488797.36,
    max_recipients: MAX_RECIPIENTS,
};

pub static MMKYBER_256: ParameterSet = ParameterSet {
    security: 256,
    q: Q,
    d: N,
    m: 9,
    n: 9,
    secret: SecretDistribution::Binary,
    du: 16,
    dv: 2,
    sigma0: 15.90,
    sigma1: 554941.07,
    max_recipients: MAX_RECIPIENTS,
};

impl ParameterSet {
    /// Checks that the set is usable with the fixed ring
    pub fn validate(&self) -> Result<()> {
        if self.q != Q || self.d != N {
            return Err(Error::InvalidParameter(format!(
                "ring must be q = {}, d = {}, got q = {}, d = {}",
                Q, N, self.q, self.d
            )));
        }
        if self.m == 0 || self.n == 0 {
            return Err(Error::InvalidParameter("matrix dimensions must be non-zero".into()));
        }
        if self.du == 0 || self.du >= LOG_Q {
            return Err(Error::InvalidParameter(format!(
                "du must be in 1..{}, got {}",
                LOG_Q, self.du
            )));
        }
        if self.dv == 0 || self.dv > self.du {
            return Err(Error::InvalidParameter(format!(
                "dv must be in 1..={}, got {}",
                self.du, self.dv
            )));
        }
        if !(self.sigma0 > 0.0 && self.sigma1 > 0.0) {
            return Err(Error::InvalidParameter("Gaussian widths must be positive".into()));
        }
        if self.max_recipients == 0 {
            return Err(Error::InvalidParameter("max_recipients must be positive".into()));
        }
        Ok(())
    }

    /// SHAKE128 at 128-bit security, SHAKE256 above it; the matrix always uses SHAKE128
    pub fn xof_kind(&self) -> XofKind {
        if self.security <= 128 {
            XofKind::Shake128
        } else {
            XofKind::Shake256
        }
    }

    /// Display name in the form `mmKyber-KEM-128`
    pub fn name(&self, mode: Mode) -> String {
        format!("mmKyber-{}-{}", mode, self.security)
    }

    /// Public key size: n polynomials at log2(q) bits
    pub fn public_key_bytes(&self) -> usize {
        self.n * packed_len(LOG_Q)
    }

    /// Secret key size: m compact secret encodings
    pub fn secret_key_bytes(&self) -> usize {
        self.m * self.secret.encoded_len()
    }

    /// Shared ciphertext size: m polynomials at du bits
    pub fn shared_ciphertext_bytes(&self) -> usize {
        self.m * packed_len(self.du)
    }

    /// Individual ciphertext size: a 1-bit hint (KEM) or dv-bit polynomial (PKE)
    pub fn individual_ciphertext_bytes(&self, mode: Mode) -> usize {
        match mode {
            Mode::Kem => packed_len(1),
            Mode::Pke => packed_len(self.dv),
        }
    }

    /// Full ciphertext size for a number of recipients
    pub fn ciphertext_bytes(&self, mode: Mode, recipients: usize) -> usize {
        self.shared_ciphertext_bytes() + recipients * self.individual_ciphertext_bytes(mode)
    }
}

/// Fixed byte sizes shared by every parameter set
pub mod sizes {
    /// Public matrix seed size in bytes
    pub const MATRIX_SEED_BYTES: usize = 16;
    /// Key generation and encryption seed size in bytes
    pub const SEED_BYTES: usize = 32;
    /// Session key size in bytes
    pub const SESSION_KEY_BYTES: usize = super::N / 8;
    /// Message size in bytes
    pub const MESSAGE_BYTES: usize = super::N / 8;
}
