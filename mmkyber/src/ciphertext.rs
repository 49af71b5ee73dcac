//! Ciphertext and session key containers.
//!
//! A full ciphertext is the shared component followed by one individual
//! component per recipient, in recipient order.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use lattice_core::{Error, Result};

use crate::params::{sizes, SecurityLevel};

/// Whether a ciphertext carries encapsulated keys or encrypted messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Kem,
    Pke,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Kem => write!(f, "KEM"),
            Mode::Pke => write!(f, "PKE"),
        }
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::InvalidLength { expected, actual });
    }
    Ok(())
}

/// The component computed once and shared by all recipients
#[derive(Clone, PartialEq, Eq)]
pub struct SharedCiphertext {
    level: SecurityLevel,
    bytes: Vec<u8>,
}

impl SharedCiphertext {
    pub fn from_bytes(level: SecurityLevel, bytes: &[u8]) -> Result<Self> {
        check_len(level.params().shared_ciphertext_bytes(), bytes.len())?;
        Ok(Self {
            level,
            bytes: bytes.to_vec(),
        })
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for SharedCiphertext {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SharedCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCiphertext")
            .field("level", &self.level)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The small per-recipient component
#[derive(Clone, PartialEq, Eq)]
pub struct IndividualCiphertext {
    level: SecurityLevel,
    mode: Mode,
    bytes: Vec<u8>,
}

impl IndividualCiphertext {
    pub fn from_bytes(level: SecurityLevel, mode: Mode, bytes: &[u8]) -> Result<Self> {
        check_len(level.params().individual_ciphertext_bytes(mode), bytes.len())?;
        Ok(Self {
            level,
            mode,
            bytes: bytes.to_vec(),
        })
    }

    pub(crate) fn from_vec(level: SecurityLevel, mode: Mode, bytes: Vec<u8>) -> Self {
        Self { level, mode, bytes }
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for IndividualCiphertext {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for IndividualCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndividualCiphertext")
            .field("level", &self.level)
            .field("mode", &self.mode)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A multi-recipient ciphertext: one shared part and N individual parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    mode: Mode,
    shared: SharedCiphertext,
    individual: Vec<IndividualCiphertext>,
}

impl Ciphertext {
    pub(crate) fn new(mode: Mode, shared: SharedCiphertext, individual: Vec<IndividualCiphertext>) -> Self {
        Self {
            mode,
            shared,
            individual,
        }
    }

    pub fn level(&self) -> SecurityLevel {
        self.shared.level
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn shared(&self) -> &SharedCiphertext {
        &self.shared
    }

    /// The individual component addressed to recipient `index`
    pub fn individual(&self, index: usize) -> Option<&IndividualCiphertext> {
        self.individual.get(index)
    }

    /// Number of recipients
    pub fn len(&self) -> usize {
        self.individual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individual.is_empty()
    }

    /// Serializes as shared part followed by the individual parts
    pub fn to_bytes(&self) -> Vec<u8> {
        let params = self.level().params();
        let mut out = Vec::with_capacity(params.ciphertext_bytes(self.mode, self.len()));
        out.extend_from_slice(&self.shared.bytes);
        for ct in &self.individual {
            out.extend_from_slice(&ct.bytes);
        }
        out
    }

    /// Splits a serialized ciphertext into its shared and individual parts
    pub fn from_bytes(level: SecurityLevel, mode: Mode, bytes: &[u8]) -> Result<Self> {
        let params = level.params();
        let shared_len = params.shared_ciphertext_bytes();
        let item_len = params.individual_ciphertext_bytes(mode);

        if bytes.len() < shared_len + item_len {
            return Err(Error::Truncated {
                expected: shared_len + item_len,
                actual: bytes.len(),
            });
        }
        let rest = bytes.len() - shared_len;
        if rest % item_len != 0 {
            let count = rest / item_len + 1;
            return Err(Error::Truncated {
                expected: shared_len + count * item_len,
                actual: bytes.len(),
            });
        }
        let count = rest / item_len;
        if count > params.max_recipients {
            return Err(Error::TooManyRecipients {
                max: params.max_recipients,
                actual: count,
            });
        }

        let shared = SharedCiphertext::from_bytes(level, &bytes[..shared_len])?;
        let individual = bytes[shared_len..]
            .chunks_exact(item_len)
            .map(|chunk| IndividualCiphertext::from_vec(level, mode, chunk.to_vec()))
            .collect();

        Ok(Self {
            mode,
            shared,
            individual,
        })
    }
}

/// A 32-byte session key, wiped on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    bytes: [u8; sizes::SESSION_KEY_BYTES],
}

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; sizes::SESSION_KEY_BYTES] {
        &self.bytes
    }
}

impl From<[u8; sizes::SESSION_KEY_BYTES]> for SessionKey {
    fn from(bytes: [u8; sizes::SESSION_KEY_BYTES]) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for SessionKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ciphertext(level: SecurityLevel, mode: Mode, recipients: usize) -> Vec<u8> {
        let len = level.params().ciphertext_bytes(mode, recipients);
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_split_and_join() {
        let bytes = sample_ciphertext(SecurityLevel::Level128, Mode::Kem, 5);
        let ct = Ciphertext::from_bytes(SecurityLevel::Level128, Mode::Kem, &bytes).unwrap();

        assert_eq!(ct.len(), 5);
        assert_eq!(ct.shared().as_bytes(), &bytes[..1792]);
        assert_eq!(ct.individual(4).unwrap().as_bytes(), &bytes[1792 + 4 * 32..]);
        assert!(ct.individual(5).is_none());
        assert_eq!(ct.to_bytes(), bytes);
    }

    #[test]
    fn test_truncated_ciphertext() {
        let bytes = sample_ciphertext(SecurityLevel::Level192, Mode::Pke, 2);

        let err = Ciphertext::from_bytes(SecurityLevel::Level192, Mode::Pke, &bytes[..3360]).unwrap_err();
        assert!(err.is_decode());

        let err = Ciphertext::from_bytes(SecurityLevel::Level192, Mode::Pke, &bytes[..bytes.len() - 1])
            .unwrap_err();
        assert_eq!(
            err,
            Error::Truncated {
                expected: 3360 + 2 * 64,
                actual: 3360 + 2 * 64 - 1
            }
        );
    }

    #[test]
    fn test_too_many_recipients() {
        let bytes = sample_ciphertext(SecurityLevel::Level128, Mode::Kem, 1025);
        assert_eq!(
            Ciphertext::from_bytes(SecurityLevel::Level128, Mode::Kem, &bytes),
            Err(Error::TooManyRecipients { max: 1024, actual: 1025 })
        );
    }

    #[test]
    fn test_component_lengths() {
        assert!(SharedCiphertext::from_bytes(SecurityLevel::Level256, &[0u8; 4607]).is_err());
        assert!(SharedCiphertext::from_bytes(SecurityLevel::Level256, &[0u8; 4608]).is_ok());
        assert_eq!(
            IndividualCiphertext::from_bytes(SecurityLevel::Level256, Mode::Pke, &[0u8; 32]),
            Err(Error::InvalidLength { expected: 64, actual: 32 })
        );
    }

    #[test]
    fn test_session_key_debug_is_redacted() {
        let key = SessionKey::from([0x42; 32]);
        let shown = format!("{:?}", key);
        assert!(!shown.contains("42"));
        assert!(!shown.contains("66"));
    }
}
