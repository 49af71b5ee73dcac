//! mmKyber key encapsulation: one shared ciphertext, one 32-byte session key
//! per recipient.
//!
//! Recipient i's mask c_i is randomly doubled into Z_2q. The individual
//! ciphertext is the cross-rounding hint of that value and the session key
//! is its 1-bit rounding; the recipient reconciles its own noisy copy
//! against the hint.

use rayon::prelude::*;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use lattice_core::codec::{compress, cross_round, deserialize, randomize_double, serialize};
use lattice_core::{Error, Result};

use crate::ciphertext::{Ciphertext, IndividualCiphertext, Mode, SessionKey, SharedCiphertext};
use crate::decrypt::DecryptionPath;
use crate::keys::{PublicKey, PublicParams, SecretKey};
use crate::params::{sizes, Q};
use crate::pke::pack_bits;
use crate::shared::{
    check_levels, check_recipients, decode_shared, encrypt_shared, recipient_mask, recipient_stream,
};

/// Output of an encapsulation: the ciphertext and the key of every recipient
#[derive(Debug)]
pub struct Encapsulation {
    pub ciphertext: Ciphertext,
    /// Session keys in recipient order
    pub keys: Vec<SessionKey>,
}

/// Implements mmEncap: encapsulates a fresh session key to each public key
///
/// All randomness is derived from `seed_e`.
pub fn encapsulate(
    pp: &PublicParams,
    pks: &[PublicKey],
    seed_e: &[u8; sizes::SEED_BYTES],
) -> Result<Encapsulation> {
    check_recipients(pp, pks)?;

    let params = pp.params();
    let q2 = 2 * Q as i64;
    let (shared, r_hat) = encrypt_shared(pp, seed_e)?;

    let (individual, keys): (Vec<_>, Vec<_>) = pks
        .par_iter()
        .enumerate()
        .map(|(i, pk)| -> Result<(IndividualCiphertext, SessionKey)> {
            let c = recipient_mask(params, pk, &r_hat, seed_e, i)?;

            let mut xof = recipient_stream(params, seed_e, i, b"d");
            let doubled = Zeroizing::new(randomize_double(&c, &mut xof, Q as i64));

            let hint = cross_round(&doubled, q2);
            let key = Zeroizing::new(compress(&doubled, 1, q2));

            let ct = IndividualCiphertext::from_vec(pp.level(), Mode::Kem, serialize(&hint, 1));
            Ok((ct, SessionKey::from(pack_bits(&key))))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unzip();

    debug!(
        level = pp.level().bits(),
        recipients = keys.len(),
        "encapsulated session keys"
    );
    Ok(Encapsulation {
        ciphertext: Ciphertext::new(Mode::Kem, shared, individual),
        keys,
    })
}

/// Implements mmDecap with the default schoolbook path
pub fn decapsulate(
    sk: &SecretKey,
    shared: &SharedCiphertext,
    individual: &IndividualCiphertext,
) -> Result<SessionKey> {
    decapsulate_with(DecryptionPath::default(), sk, shared, individual)
}

/// Implements mmDecap: recovers one recipient's session key
///
/// Decapsulation never fails on well-formed input; a key recovered from a
/// tampered ciphertext is simply a different key.
pub fn decapsulate_with(
    path: DecryptionPath,
    sk: &SecretKey,
    shared: &SharedCiphertext,
    individual: &IndividualCiphertext,
) -> Result<SessionKey> {
    check_levels(sk, shared, individual.level())?;
    if individual.mode() != Mode::Kem {
        return Err(Error::ParameterMismatch);
    }

    let params = sk.level().params();
    let u = decode_shared(params, shared)?;
    let (hint, _) = deserialize(individual.as_bytes(), 1)?;
    let s = sk.secret_vector()?;

    let key = Zeroizing::new(path.recover_key(params, &u, &s, &hint));
    trace!(?path, "recovered session key");
    Ok(SessionKey::from(pack_bits(&key)))
}
