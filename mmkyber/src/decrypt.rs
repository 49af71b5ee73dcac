//! Recipient-side recovery of keys and messages.
//!
//! Two equivalent strategies compute the noisy inner product w = <u, s>:
//! an exact integer schoolbook product over the compressed u (no NTT), or
//! an NTT product over u decompressed back to Z_q.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use lattice_core::codec::{compress, decompress, reconcile};
use lattice_core::polynomial::schoolbook_mul_acc;
use lattice_core::{ntt_forward, ntt_inverse, NttPolynomial, Polynomial, N};

use crate::params::{ParameterSet, Q};

/// Strategy used to compute the inner product during decryption
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecryptionPath {
    /// Unreduced integer product of the du-bit u with s, reduced mod 2^du
    #[default]
    Schoolbook,
    /// u decompressed to Z_q and multiplied in the NTT domain
    Ntt,
}

impl DecryptionPath {
    /// Recovers the 1-bit key polynomial from u, the secret and the hint
    pub(crate) fn recover_key(
        self,
        params: &ParameterSet,
        u: &[[i32; N]],
        s: &[[i32; N]],
        hint: &[i32; N],
    ) -> [i32; N] {
        match self {
            DecryptionPath::Schoolbook => {
                let modulus = 1i64 << params.du;
                let w = Zeroizing::new(schoolbook_inner(u, s, modulus));
                reconcile(&w, hint, modulus)
            }
            DecryptionPath::Ntt => {
                let q = Q as i64;
                let w = Zeroizing::new(ntt_inner(u, s, params.du));
                // Lift w to Z_2q by doubling
                let mut w2 = [0i32; N];
                for (o, &x) in w2.iter_mut().zip(w.iter()) {
                    *o = ((2 * x as i64) % (2 * q)) as i32;
                }
                reconcile(&w2, hint, 2 * q)
            }
        }
    }

    /// Recovers the 1-bit message polynomial from u, the secret and v
    pub(crate) fn recover_message(
        self,
        params: &ParameterSet,
        u: &[[i32; N]],
        s: &[[i32; N]],
        v: &[i32; N],
    ) -> [i32; N] {
        let modulus = match self {
            DecryptionPath::Schoolbook => 1i64 << params.du,
            DecryptionPath::Ntt => Q as i64,
        };

        let w = Zeroizing::new(match self {
            DecryptionPath::Schoolbook => schoolbook_inner(u, s, modulus),
            DecryptionPath::Ntt => ntt_inner(u, s, params.du),
        });

        // v' - w at the working modulus, then round to one bit
        let v_lifted = decompress(v, params.dv, modulus);
        let mut diff = [0i32; N];
        for i in 0..N {
            diff[i] = (v_lifted[i] as i64 - w[i] as i64).rem_euclid(modulus) as i32;
        }
        compress(&diff, 1, modulus)
    }
}

/// sum_i u[i] * s[i] over the integers, then reduced mod `modulus`
fn schoolbook_inner(u: &[[i32; N]], s: &[[i32; N]], modulus: i64) -> [i32; N] {
    let mut acc = Zeroizing::new([0i64; N]);
    for (ui, si) in u.iter().zip(s.iter()) {
        schoolbook_mul_acc(&mut acc, ui, si);
    }

    let mut w = [0i32; N];
    for (o, &a) in w.iter_mut().zip(acc.iter()) {
        *o = a.rem_euclid(modulus) as i32;
    }
    w
}

/// intt(sum_i ntt(decompress(u[i])) ∘ ntt(s[i])) in Z_q
fn ntt_inner(u: &[[i32; N]], s: &[[i32; N]], du: usize) -> [i32; N] {
    let q = Q as i64;
    let mut acc = NttPolynomial::zero();
    for (ui, si) in u.iter().zip(s.iter()) {
        let c_hat = ntt_forward(&Polynomial::from_coeffs(decompress(ui, du, q)));
        let s_hat = ntt_forward(&Polynomial::from_coeffs(*si));
        acc.mul_acc(&c_hat, &s_hat);
    }
    ntt_inverse(&acc).into_coeffs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MMKYBER_128;
    use lattice_core::codec::cross_round;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_default_is_schoolbook() {
        assert_eq!(DecryptionPath::default(), DecryptionPath::Schoolbook);
    }

    #[test]
    fn test_inner_products_agree() {
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let du = MMKYBER_128.du;
        let mut u = vec![[0i32; N]; 4];
        let mut s = vec![[0i32; N]; 4];
        for i in 0..4 {
            for j in 0..N {
                u[i][j] = rng.gen_range(0..1 << du);
                s[i][j] = rng.gen_range(-1..=1);
            }
        }

        // Both inner products describe the same value at different scales
        let exact = schoolbook_inner(&u, &s, 1 << du);
        let lifted = ntt_inner(&u, &s, du);
        let rescaled = compress(&lifted, du, Q as i64);
        for i in 0..N {
            let diff = (rescaled[i] - exact[i]).rem_euclid(1 << du);
            let dist = diff.min((1 << du) - diff);
            assert!(dist <= 600, "coeff {} off by {}", i, dist);
        }
    }

    #[test]
    fn test_key_recovery_noise_free() {
        // u = 0 makes w = 0, which rounds to 0 under either hint
        let u = vec![[0i32; N]; 4];
        let s = vec![[1i32; N]; 4];
        let mut v = [0i32; N];
        v[0] = 1 << 12;
        let hint = cross_round(&v, 1 << 14);
        for path in [DecryptionPath::Schoolbook, DecryptionPath::Ntt] {
            let key = path.recover_key(&MMKYBER_128, &u, &s, &hint);
            assert!(key.iter().all(|&k| k == 0), "{:?}", path);
        }
    }

    #[test]
    fn test_message_recovery_noise_free() {
        let u = vec![[0i32; N]; 4];
        let s = vec![[0i32; N]; 4];
        let mut v = [0i32; N];
        // dv = 2: the value 2 sits at one half of the modulus
        for i in (0..N).step_by(3) {
            v[i] = 2;
        }
        for path in [DecryptionPath::Schoolbook, DecryptionPath::Ntt] {
            let m = path.recover_message(&MMKYBER_128, &u, &s, &v);
            for i in 0..N {
                assert_eq!(m[i], (i % 3 == 0) as i32, "{:?} coeff {}", path, i);
            }
        }
    }
}
