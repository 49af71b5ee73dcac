//! Encryption steps common to the KEM and the PKE.
//!
//! Both schemes sample the same randomness from seed_e, compute the same
//! shared ciphertext u and the same per-recipient mask c_i = <b_i, r> + y_i.
//! They differ only in how c_i is turned into an individual ciphertext.

use tracing::trace;
use zeroize::Zeroizing;

use lattice_core::codec::{compress, vec_deserialize, vec_serialize};
use lattice_core::sampling::sample_gaussian;
use lattice_core::{ntt_inverse, Error, NttVector, PolyVector, Polynomial, Result, Xof, N};

use crate::ciphertext::SharedCiphertext;
use crate::keys::{PublicKey, PublicParams, SecretKey};
use crate::params::{sizes, ParameterSet, SecurityLevel, Q};

/// Rejects empty or oversized recipient lists and keys from another level
pub(crate) fn check_recipients(pp: &PublicParams, pks: &[PublicKey]) -> Result<()> {
    let params = pp.params();
    if pks.is_empty() {
        return Err(Error::InvalidParameter("at least one recipient is required".into()));
    }
    if pks.len() > params.max_recipients {
        return Err(Error::TooManyRecipients {
            max: params.max_recipients,
            actual: pks.len(),
        });
    }
    if pks.iter().any(|pk| pk.level() != pp.level()) {
        return Err(Error::ParameterMismatch);
    }
    Ok(())
}

/// The per-recipient XOF stream seed_e || le64(index) || label
pub(crate) fn recipient_stream(
    params: &ParameterSet,
    seed_e: &[u8; sizes::SEED_BYTES],
    index: usize,
    label: &[u8],
) -> Xof {
    let index = (index as u64).to_le_bytes();
    Xof::new(params.xof_kind(), &[seed_e, &index, label])
}

/// Samples r and e_u from seed_e and computes u = compress(A r + e_u)
///
/// Returns the shared ciphertext together with r in the NTT domain, which
/// every recipient's mask reuses.
pub(crate) fn encrypt_shared(
    pp: &PublicParams,
    seed_e: &[u8; sizes::SEED_BYTES],
) -> Result<(SharedCiphertext, NttVector)> {
    let params = pp.params();
    let kind = params.xof_kind();

    let mut xof = Xof::new(kind, &[seed_e, b"R"]);
    let r_hat = gaussian_vector(&mut xof, params.n, params.sigma0).ntt();

    let mut xof = Xof::new(kind, &[seed_e, b"e"]);
    let e_u = gaussian_vector(&mut xof, params.m, params.sigma0);
    let noisy = pp.matrix().mul_vec(&r_hat)?.inverse().add(&e_u)?;

    let u: Vec<[i32; N]> = noisy
        .entries
        .iter()
        .map(|p| compress(p.coeffs(), params.du, Q as i64))
        .collect();

    let shared = SharedCiphertext::from_bytes(pp.level(), &vec_serialize(&u, params.du))?;
    trace!(len = shared.as_bytes().len(), "computed shared ciphertext");
    Ok((shared, r_hat))
}

fn gaussian_vector(xof: &mut Xof, len: usize, sigma: f64) -> PolyVector {
    PolyVector::new(
        (0..len)
            .map(|_| Polynomial::from_coeffs(sample_gaussian(&mut *xof, sigma)))
            .collect(),
    )
}

/// Computes the noisy mask c_i = intt(<b_i, r>) + y_i for recipient `index`
pub(crate) fn recipient_mask(
    params: &ParameterSet,
    pk: &PublicKey,
    r_hat: &NttVector,
    seed_e: &[u8; sizes::SEED_BYTES],
    index: usize,
) -> Result<Zeroizing<[i32; N]>> {
    let mut xof = recipient_stream(params, seed_e, index, b"r");
    let y = Polynomial::from_coeffs(sample_gaussian(&mut xof, params.sigma1));

    let c = ntt_inverse(&pk.b_hat().inner_product(r_hat)?) + y;
    Ok(Zeroizing::new(c.into_coeffs()))
}

/// Decodes the shared ciphertext u as m polynomials of du bits
pub(crate) fn decode_shared(params: &ParameterSet, shared: &SharedCiphertext) -> Result<Vec<[i32; N]>> {
    let (u, _) = vec_deserialize(shared.as_bytes(), params.m, params.du)?;
    Ok(u)
}

/// Checks that every decryption input belongs to the same parameter set
pub(crate) fn check_levels(sk: &SecretKey, shared: &SharedCiphertext, level: SecurityLevel) -> Result<()> {
    if sk.level() != shared.level() || sk.level() != level {
        return Err(Error::ParameterMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{keygen, setup};

    const SEED_A: &[u8; 16] = b"0123456789abcdef";
    const SEED_E: &[u8; 32] = b"00112233445566778899aabbccddeeff";

    #[test]
    fn test_recipient_checks() {
        let pp = setup(SecurityLevel::Level128, SEED_A);
        assert!(matches!(check_recipients(&pp, &[]), Err(Error::InvalidParameter(_))));

        let other = setup(SecurityLevel::Level192, SEED_A);
        let (pk, _) = keygen(&other, &[7u8; 32]).unwrap();
        assert_eq!(check_recipients(&pp, &[pk]), Err(Error::ParameterMismatch));

        let (pk, _) = keygen(&pp, &[7u8; 32]).unwrap();
        let many = vec![pk; 1025];
        assert_eq!(
            check_recipients(&pp, &many),
            Err(Error::TooManyRecipients { max: 1024, actual: 1025 })
        );
        check_recipients(&pp, &many[..1024]).unwrap();
    }

    #[test]
    fn test_shared_ciphertext_is_deterministic() {
        let pp = setup(SecurityLevel::Level128, SEED_A);
        let (a, r1) = encrypt_shared(&pp, SEED_E).unwrap();
        let (b, r2) = encrypt_shared(&pp, SEED_E).unwrap();
        assert_eq!(a, b);
        assert_eq!(r1, r2);
        assert_eq!(a.as_bytes().len(), 1792);

        let u = decode_shared(pp.params(), &a).unwrap();
        assert_eq!(u.len(), 4);
        assert!(u.iter().flatten().all(|&x| (0..1 << 14).contains(&x)));
    }

    #[test]
    fn test_recipient_streams_differ_by_index_and_label() {
        let params = SecurityLevel::Level256.params();
        let a = recipient_stream(params, SEED_E, 0, b"r").squeeze(16);
        let b = recipient_stream(params, SEED_E, 1, b"r").squeeze(16);
        let c = recipient_stream(params, SEED_E, 0, b"d").squeeze(16);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
