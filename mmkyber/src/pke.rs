//! mmKyber public-key encryption of one 32-byte message per recipient.

use rayon::prelude::*;
use tracing::debug;
use zeroize::Zeroizing;

use lattice_core::codec::{compress, decompress, deserialize, serialize};
use lattice_core::{Error, Result, N};

use crate::ciphertext::{Ciphertext, IndividualCiphertext, Mode, SharedCiphertext};
use crate::decrypt::DecryptionPath;
use crate::keys::{PublicKey, PublicParams, SecretKey};
use crate::params::{sizes, Q};
use crate::shared::{check_levels, check_recipients, decode_shared, encrypt_shared, recipient_mask};

/// A plaintext message: 256 bits, one per ring coefficient
pub type Message = [u8; sizes::MESSAGE_BYTES];

/// Implements mmEnc: encrypts `messages[i]` to `pks[i]` under one shared ciphertext
///
/// All randomness is derived from `seed_e`, so equal inputs give equal
/// ciphertexts.
pub fn encrypt(
    pp: &PublicParams,
    pks: &[PublicKey],
    messages: &[Message],
    seed_e: &[u8; sizes::SEED_BYTES],
) -> Result<Ciphertext> {
    check_recipients(pp, pks)?;
    if messages.len() != pks.len() {
        return Err(Error::DimensionMismatch {
            expected: pks.len(),
            actual: messages.len(),
        });
    }

    let params = pp.params();
    let (shared, r_hat) = encrypt_shared(pp, seed_e)?;

    let individual = pks
        .par_iter()
        .zip(messages.par_iter())
        .enumerate()
        .map(|(i, (pk, msg))| -> Result<IndividualCiphertext> {
            let mut c = recipient_mask(params, pk, &r_hat, seed_e, i)?;

            // c_i + round(q/2) * m_i
            let (bits, _) = deserialize(msg, 1)?;
            let lifted = decompress(&bits, 1, Q as i64);
            for (x, &m) in c.iter_mut().zip(lifted.iter()) {
                *x = (*x + m) % Q;
            }

            let v = compress(&c, params.dv, Q as i64);
            Ok(IndividualCiphertext::from_vec(
                pp.level(),
                Mode::Pke,
                serialize(&v, params.dv),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        level = pp.level().bits(),
        recipients = individual.len(),
        "encrypted messages"
    );
    Ok(Ciphertext::new(Mode::Pke, shared, individual))
}

/// Implements mmDec with the default schoolbook path
pub fn decrypt(
    sk: &SecretKey,
    shared: &SharedCiphertext,
    individual: &IndividualCiphertext,
) -> Result<Message> {
    decrypt_with(DecryptionPath::default(), sk, shared, individual)
}

/// Implements mmDec: recovers one recipient's message from its parts of the ciphertext
pub fn decrypt_with(
    path: DecryptionPath,
    sk: &SecretKey,
    shared: &SharedCiphertext,
    individual: &IndividualCiphertext,
) -> Result<Message> {
    check_levels(sk, shared, individual.level())?;
    if individual.mode() != Mode::Pke {
        return Err(Error::ParameterMismatch);
    }

    let params = sk.level().params();
    let u = decode_shared(params, shared)?;
    let (v, _) = deserialize(individual.as_bytes(), params.dv)?;
    let s = sk.secret_vector()?;

    let m = Zeroizing::new(path.recover_message(params, &u, &s, &v));
    Ok(pack_bits(&m))
}

/// Packs 1-bit coefficients into 32 bytes, least significant bit first
pub(crate) fn pack_bits(bits: &[i32; N]) -> [u8; N / 8] {
    let mut out = [0u8; N / 8];
    for (i, &b) in bits.iter().enumerate() {
        out[i / 8] |= ((b & 1) as u8) << (i % 8);
    }
    out
}
