//! Ring arithmetic, samplers and codecs over Z_q[X]/(X^256 + 1) with
//! q = 2^25 - 2^12 + 1.

pub mod codec;
pub mod error;
pub mod hashing;
pub mod ntt;
pub mod params;
pub mod polynomial;
pub mod sampling;
pub mod vector_matrix;
pub mod zq;

pub use error::{Error, Result};
pub use hashing::{Xof, XofKind};
pub use ntt::{ntt_forward, ntt_inverse, NttPolynomial};
pub use params::{N, Q};
pub use polynomial::Polynomial;
pub use vector_matrix::{NttMatrix, NttVector, PolyVector};
