//! mmKyber: multi-message multi-recipient key encapsulation and public-key
//! encryption over Z_q[X]/(X^256 + 1).
//!
//! One encapsulation to N recipients costs a single shared ciphertext plus a
//! 32-byte (KEM) or 64-byte (PKE) component per recipient. All operations
//! are deterministic functions of their seeds; callers supply the entropy.
//!
//! ```no_run
//! use mmkyber::{decapsulate, encapsulate, keygen, setup, SecurityLevel};
//!
//! let pp = setup(SecurityLevel::Level128, b"0123456789abcdef");
//! let (pk, sk) = keygen(&pp, &[1u8; 32]).unwrap();
//! let enc = encapsulate(&pp, &[pk], &[2u8; 32]).unwrap();
//! let ct = &enc.ciphertext;
//! let key = decapsulate(&sk, ct.shared(), ct.individual(0).unwrap()).unwrap();
//! assert_eq!(key, enc.keys[0]);
//! ```

pub mod ciphertext;
pub mod decrypt;
pub mod kem;
pub mod keys;
pub mod params;
pub mod pke;
mod shared;

pub use ciphertext::{Ciphertext, IndividualCiphertext, Mode, SessionKey, SharedCiphertext};
pub use decrypt::DecryptionPath;
pub use kem::{decapsulate, decapsulate_with, encapsulate, Encapsulation};
pub use keys::{keygen, setup, PublicKey, PublicParams, SecretKey};
pub use lattice_core::{Error, Result};
pub use params::{sizes, ParameterSet, SecretDistribution, SecurityLevel, MAX_RECIPIENTS};
pub use pke::{decrypt, decrypt_with, encrypt, Message};
