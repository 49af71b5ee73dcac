//! Public parameters, key pairs and their byte encodings.
//!
//! A public key is stored in the NTT domain exactly as serialized; a secret
//! key keeps the compact small-coefficient encoding of s.

use std::fmt;

use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use lattice_core::codec::{packed_len, vec_deserialize, vec_serialize};
use lattice_core::sampling::sample_uniform;
use lattice_core::{
    ntt_forward, Error, NttMatrix, NttPolynomial, NttVector, Polynomial, Result, Xof, XofKind, N,
};

use crate::params::{sizes, ParameterSet, SecurityLevel, LOG_Q, Q};

/// Public parameters: the m x n matrix A, sampled directly in the NTT domain
#[derive(Debug, Clone)]
pub struct PublicParams {
    level: SecurityLevel,
    a_hat: NttMatrix,
}

impl PublicParams {
    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn params(&self) -> &'static ParameterSet {
        self.level.params()
    }

    /// The matrix A in the NTT domain
    pub fn matrix(&self) -> &NttMatrix {
        &self.a_hat
    }
}

/// Implements mmSetup: expands the public matrix from a 16-byte seed
///
/// Entry (i, j) is read from SHAKE128(seed_a || i || j || "A") regardless of
/// the security level.
pub fn setup(level: SecurityLevel, seed_a: &[u8; sizes::MATRIX_SEED_BYTES]) -> PublicParams {
    let params = level.params();

    let a_hat = NttMatrix::from_fn(params.m, params.n, |i, j| {
        let mut xof = Xof::new(XofKind::Shake128, &[seed_a, &[i as u8, j as u8], b"A"]);
        NttPolynomial::from_evaluations(sample_uniform(&mut xof, Q))
    });

    debug!(level = level.bits(), m = params.m, n = params.n, "expanded public matrix");

    PublicParams { level, a_hat }
}

/// A recipient public key b = Aᵀs + e, kept in the NTT domain
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    level: SecurityLevel,
    bytes: Vec<u8>,
    b_hat: NttVector,
}

impl PublicKey {
    /// Parses a serialized public key, rejecting coefficients outside [0, q)
    pub fn from_bytes(level: SecurityLevel, bytes: &[u8]) -> Result<Self> {
        let params = level.params();
        let expected = params.public_key_bytes();
        if bytes.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: bytes.len(),
            });
        }

        let (polys, _) = vec_deserialize(bytes, params.n, LOG_Q)?;
        if polys.iter().flatten().any(|&c| c >= Q) {
            return Err(Error::InvalidEncoding("public key coefficient not below q"));
        }

        let b_hat = NttVector::new(polys.into_iter().map(NttPolynomial::from_evaluations).collect());
        Ok(Self {
            level,
            bytes: bytes.to_vec(),
            b_hat,
        })
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn b_hat(&self) -> &NttVector {
        &self.b_hat
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("level", &self.level)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// A recipient secret key: the compact encodings of the m polynomials of s
///
/// Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    level: SecurityLevel,
    bytes: Vec<u8>,
}

impl SecretKey {
    /// Parses a serialized secret key, checking every encoded polynomial
    pub fn from_bytes(level: SecurityLevel, bytes: &[u8]) -> Result<Self> {
        let expected = level.params().secret_key_bytes();
        if bytes.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: bytes.len(),
            });
        }

        let sk = Self {
            level,
            bytes: bytes.to_vec(),
        };
        sk.secret_vector()?;
        Ok(sk)
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decodes s as signed small coefficients
    pub(crate) fn secret_vector(&self) -> Result<Zeroizing<Vec<[i32; N]>>> {
        let secret = self.level.params().secret;
        let mut out = Zeroizing::new(Vec::with_capacity(self.level.params().m));
        for chunk in self.bytes.chunks_exact(secret.encoded_len()) {
            out.push(secret.decode(chunk)?);
        }
        Ok(out)
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Implements mmKGen: derives a key pair from a 32-byte seed
///
/// s is drawn from XOF(seed || "S") and e from XOF(seed || "E"); both use the
/// level's small secret distribution.
pub fn keygen(pp: &PublicParams, seed: &[u8; sizes::SEED_BYTES]) -> Result<(PublicKey, SecretKey)> {
    let params = pp.params();
    let kind = params.xof_kind();
    let secret = params.secret;

    // Secret key bytes are the compact encodings themselves
    let mut xof = Xof::new(kind, &[seed, b"S"]);
    let mut sk_bytes = Vec::with_capacity(params.secret_key_bytes());
    for _ in 0..params.m {
        sk_bytes.extend_from_slice(&secret.sample(&mut xof));
    }
    let sk = SecretKey {
        level: pp.level,
        bytes: sk_bytes,
    };

    let s_hat = NttVector::new(
        sk.secret_vector()?
            .iter()
            .map(|s| ntt_forward(&Polynomial::from_coeffs(*s)))
            .collect(),
    );

    let mut xof = Xof::new(kind, &[seed, b"E"]);
    let mut e_hat = Vec::with_capacity(params.n);
    for _ in 0..params.n {
        let mut e = secret.decode(&secret.sample(&mut xof))?;
        e_hat.push(ntt_forward(&Polynomial::from_coeffs(e)));
        e.zeroize();
    }

    // b = Aᵀ s + e
    let b_hat = pp.a_hat.mul_transpose_vec(&s_hat)?.add(&NttVector::new(e_hat))?;

    let coeffs: Vec<[i32; N]> = b_hat.entries.iter().map(|p| *p.coeffs()).collect();
    let bytes = vec_serialize(&coeffs, LOG_Q);
    debug_assert_eq!(bytes.len(), params.n * packed_len(LOG_Q));

    debug!(level = pp.level.bits(), pk_len = bytes.len(), "generated key pair");

    let pk = PublicKey {
        level: pp.level,
        bytes,
        b_hat,
    };
    Ok((pk, sk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::codec::serialize;

    const SEED_A: &[u8; 16] = b"0123456789abcdef";

    fn key_seed(i: u64) -> [u8; 32] {
        let mut seed = *b"000102030405060708090a0b0c0d0e0f";
        seed[..8].copy_from_slice(&i.to_le_bytes());
        seed
    }

    #[test]
    fn test_setup_known_entry() {
        let pp = setup(SecurityLevel::Level128, SEED_A);
        assert_eq!((pp.matrix().n_rows(), pp.matrix().n_cols()), (4, 4));
        let a00 = pp.matrix().get(0, 0).unwrap();
        assert_eq!(
            &a00.coeffs()[..6],
            &[29537246, 1357602, 33083194, 15558079, 30996139, 7603869]
        );
    }

    #[test]
    fn test_setup_uses_shake128_at_every_level() {
        let a128 = setup(SecurityLevel::Level128, SEED_A);
        let a256 = setup(SecurityLevel::Level256, SEED_A);
        assert_eq!(a128.matrix().get(3, 2), a256.matrix().get(3, 2));
        assert_eq!(a256.matrix().n_rows(), 9);
    }

    #[test]
    fn test_keygen_sizes_and_determinism() {
        for level in SecurityLevel::ALL {
            let pp = setup(level, SEED_A);
            let (pk, sk) = keygen(&pp, &key_seed(0)).unwrap();
            assert_eq!(pk.as_bytes().len(), level.params().public_key_bytes());
            assert_eq!(sk.as_bytes().len(), level.params().secret_key_bytes());

            let (pk2, sk2) = keygen(&pp, &key_seed(0)).unwrap();
            assert_eq!(pk, pk2);
            assert_eq!(sk.as_bytes(), sk2.as_bytes());

            let (pk3, _) = keygen(&pp, &key_seed(1)).unwrap();
            assert_ne!(pk, pk3);
        }
    }

    #[test]
    fn test_public_key_roundtrip() {
        let pp = setup(SecurityLevel::Level192, SEED_A);
        let (pk, sk) = keygen(&pp, &key_seed(3)).unwrap();

        let parsed = PublicKey::from_bytes(SecurityLevel::Level192, pk.as_bytes()).unwrap();
        assert_eq!(parsed, pk);
        let parsed = SecretKey::from_bytes(SecurityLevel::Level192, sk.as_bytes()).unwrap();
        assert_eq!(parsed.as_bytes(), sk.as_bytes());
    }

    #[test]
    fn test_public_key_rejects_out_of_range() {
        let mut polys = vec![[0i32; N]; 4];
        polys[2][17] = Q;
        let mut bytes = Vec::new();
        for p in &polys {
            bytes.extend_from_slice(&serialize(p, LOG_Q));
        }

        assert_eq!(
            PublicKey::from_bytes(SecurityLevel::Level128, &bytes),
            Err(Error::InvalidEncoding("public key coefficient not below q"))
        );
        assert_eq!(
            PublicKey::from_bytes(SecurityLevel::Level128, &bytes[..100]),
            Err(Error::InvalidLength { expected: 3200, actual: 100 })
        );
    }

    #[test]
    fn test_secret_key_rejects_bad_ternary() {
        let pp = setup(SecurityLevel::Level128, SEED_A);
        let (_, sk) = keygen(&pp, &key_seed(0)).unwrap();

        let mut bytes = sk.as_bytes().to_vec();
        bytes[60] = 250;
        let err = SecretKey::from_bytes(SecurityLevel::Level128, &bytes).unwrap_err();
        assert!(err.is_decode());

        assert!(SecretKey::from_bytes(SecurityLevel::Level128, &bytes[..207]).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let pp = setup(SecurityLevel::Level256, SEED_A);
        let (_, sk) = keygen(&pp, &key_seed(0)).unwrap();
        let shown = format!("{:?}", sk);
        assert_eq!(shown, "SecretKey { level: Level256, .. }");
    }
}
