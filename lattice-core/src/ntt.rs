use std::ops::{Add, AddAssign};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::params::{N, N_INV, PSI, Q};
use crate::polynomial::Polynomial;
use crate::zq;

/// Precomputed values for the negacyclic Number Theoretic Transform
///
/// `roots[i] = psi^bitrev(i)` where bitrev reverses log2(n) bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttParams {
    /// Modulus q
    pub q: i32,
    /// Degree of polynomial X^n + 1
    pub n: usize,
    /// Primitive 2n-th root of unity
    pub psi: i32,
    /// Inverse of n modulo q
    pub n_inv: i32,
    /// Twiddle factors in bit-reversed order
    pub roots: Vec<i32>,
}

static MMKYBER_NTT: OnceLock<NttParams> = OnceLock::new();

/// Twiddle table for the mmKyber ring, built on first use
pub fn ntt_params() -> &'static NttParams {
    MMKYBER_NTT.get_or_init(|| NttParams::with_inverse(Q, N, PSI, N_INV))
}

impl NttParams {
    /// Creates precomputed NTT parameters for modulus q, degree n and root psi
    ///
    /// Fails unless n is a power of two, psi has order exactly 2n and n is
    /// invertible mod q.
    pub fn new(q: i32, n: usize, psi: i32) -> Result<Self> {
        if !n.is_power_of_two() || n < 2 {
            return Err(Error::InvalidParameter(format!(
                "NTT degree {} is not a power of two",
                n
            )));
        }
        if zq::mod_pow(psi, n as u64, q) != q - 1 {
            return Err(Error::InvalidParameter(format!(
                "{} is not a primitive {}-th root of unity mod {}",
                psi,
                2 * n,
                q
            )));
        }
        let n_inv = zq::mod_inverse(n as i32, q).ok_or_else(|| {
            Error::InvalidParameter(format!("{} is not invertible mod {}", n, q))
        })?;

        Ok(Self::with_inverse(q, n, psi, n_inv))
    }

    fn with_inverse(q: i32, n: usize, psi: i32, n_inv: i32) -> Self {
        let log_n = n.trailing_zeros();
        let roots = (0..n)
            .map(|i| zq::mod_pow(psi, bit_reverse(i, log_n) as u64, q))
            .collect();

        NttParams {
            q,
            n,
            psi,
            n_inv,
            roots,
        }
    }

    fn check_len(&self, f: &[i32]) -> Result<()> {
        if f.len() != self.n {
            return Err(Error::DimensionMismatch {
                expected: self.n,
                actual: f.len(),
            });
        }
        Ok(())
    }

    /// In-place forward transform of canonical coefficients
    pub fn forward(&self, f: &mut [i32]) -> Result<()> {
        self.check_len(f)?;
        self.forward_in_place(f);
        Ok(())
    }

    /// In-place inverse transform, including the final scaling by n^-1
    pub fn inverse(&self, f: &mut [i32]) -> Result<()> {
        self.check_len(f)?;
        self.inverse_in_place(f);
        Ok(())
    }

    fn forward_in_place(&self, f: &mut [i32]) {
        let (n, q) = (self.n, self.q);

        let mut l = n / 2;
        let mut wi = 0;
        while l > 0 {
            for i in (0..n).step_by(2 * l) {
                wi += 1;
                let z = self.roots[wi];
                for j in i..i + l {
                    let x = f[j];
                    let y = zq::mul_mod(f[j + l], z, q);
                    f[j] = add_mod(x, y, q);
                    f[j + l] = sub_mod(x, y, q);
                }
            }
            l >>= 1;
        }
    }

    fn inverse_in_place(&self, f: &mut [i32]) {
        let (n, q) = (self.n, self.q);

        let mut l = 1;
        let mut wi = n;
        while l < n {
            for i in (0..n).step_by(2 * l) {
                wi -= 1;
                let z = self.roots[wi];
                for j in i..i + l {
                    let x = f[j];
                    let y = f[j + l];
                    f[j] = add_mod(x, y, q);
                    f[j + l] = zq::mul_mod(z, sub_mod(y, x, q), q);
                }
            }
            l <<= 1;
        }

        for c in f.iter_mut() {
            *c = zq::mul_mod(*c, self.n_inv, q);
        }
    }
}

#[inline]
fn add_mod(a: i32, b: i32, q: i32) -> i32 {
    let s = a + b;
    if s >= q {
        s - q
    } else {
        s
    }
}

#[inline]
fn sub_mod(a: i32, b: i32, q: i32) -> i32 {
    let d = a - b;
    if d < 0 {
        d + q
    } else {
        d
    }
}

/// Reverses the low `bits` bits of an index
fn bit_reverse(index: usize, bits: u32) -> usize {
    let mut reversed = 0;

    for i in 0..bits {
        reversed |= ((index >> i) & 1) << (bits - 1 - i);
    }

    reversed
}

/// A polynomial of the mmKyber ring in the NTT (evaluation) domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttPolynomial {
    coeffs: [i32; N],
}

impl NttPolynomial {
    pub fn zero() -> Self {
        NttPolynomial { coeffs: [0; N] }
    }

    /// Wraps values that are already NTT-domain evaluations
    ///
    /// Used for uniformly sampled matrix entries and decoded public keys;
    /// values are reduced into [0, q-1].
    pub fn from_evaluations(coeffs: [i32; N]) -> Self {
        let mut coeffs = coeffs;
        for c in coeffs.iter_mut() {
            *c = zq::reduce(*c as i64, Q);
        }
        NttPolynomial { coeffs }
    }

    pub fn coeffs(&self) -> &[i32; N] {
        &self.coeffs
    }

    /// Pointwise product mod q
    pub fn pointwise_mul(&self, other: &Self) -> Self {
        let mut coeffs = [0i32; N];
        for (i, c) in coeffs.iter_mut().enumerate() {
            *c = zq::mul_mod(self.coeffs[i], other.coeffs[i], Q);
        }
        NttPolynomial { coeffs }
    }

    /// Accumulates the pointwise product a ∘ b into self
    pub fn mul_acc(&mut self, a: &Self, b: &Self) {
        for i in 0..N {
            let p = zq::mul_mod(a.coeffs[i], b.coeffs[i], Q);
            self.coeffs[i] = add_mod(self.coeffs[i], p, Q);
        }
    }
}

impl Add for NttPolynomial {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += &other;
        self
    }
}

impl AddAssign<&NttPolynomial> for NttPolynomial {
    fn add_assign(&mut self, other: &NttPolynomial) {
        for (a, &b) in self.coeffs.iter_mut().zip(other.coeffs.iter()) {
            *a = add_mod(*a, b, Q);
        }
    }
}

/// Performs forward NTT on a coefficient-domain polynomial
pub fn ntt_forward(poly: &Polynomial) -> NttPolynomial {
    let mut coeffs = *poly.coeffs();
    ntt_params().forward_in_place(&mut coeffs);
    NttPolynomial { coeffs }
}

/// Performs inverse NTT back to the coefficient domain
pub fn ntt_inverse(poly: &NttPolynomial) -> Polynomial {
    let mut coeffs = poly.coeffs;
    ntt_params().inverse_in_place(&mut coeffs);
    Polynomial::from_coeffs(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;
    use crate::polynomial::negacyclic_mul;

    fn create_test_params() -> NttParams {
        // q = 97, n = 8 with psi = 8 (8^8 = -1 mod 97)
        NttParams::new(97, 8, 8).unwrap()
    }

    fn random_poly(rng: &mut ChaCha20Rng) -> Polynomial {
        let mut coeffs = [0i32; N];
        for c in coeffs.iter_mut() {
            *c = rng.gen_range(0..Q);
        }
        Polynomial::from_coeffs(coeffs)
    }

    #[test]
    fn test_small_ring_table() {
        let params = create_test_params();
        assert_eq!(params.roots, vec![1, 22, 64, 50, 8, 79, 27, 12]);
        assert_eq!(params.n_inv, 85);
    }

    #[test]
    fn test_small_ring_forward() {
        let params = create_test_params();
        let mut f = [1, 2, 3, 4, 5, 6, 7, 8];
        params.forward(&mut f).unwrap();
        assert_eq!(f, [86, 56, 41, 67, 4, 4, 53, 85]);

        params.inverse(&mut f).unwrap();
        assert_eq!(f, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_small_ring_convolution() {
        let params = create_test_params();
        let f = [1, 2, 3, 4, 5, 6, 7, 8];
        let g = [3, 4, 0, 0, 0, 0, 0, 1];

        let mut f_hat = f;
        let mut g_hat = g;
        params.forward(&mut f_hat).unwrap();
        params.forward(&mut g_hat).unwrap();
        let mut h: Vec<i32> = f_hat
            .iter()
            .zip(g_hat.iter())
            .map(|(&a, &b)| zq::mul_mod(a, b, 97))
            .collect();
        params.inverse(&mut h).unwrap();

        assert_eq!(h, vec![66, 7, 13, 19, 25, 31, 37, 53]);
        assert_eq!(h, negacyclic_mul(&f, &g, 97).to_vec());
    }

    #[test]
    fn test_twiddle_table() {
        let params = ntt_params();
        assert_eq!(params.roots.len(), N);
        assert_eq!(params.roots[0], 1);
        assert_eq!(params.roots[1], 12759331);
        assert_eq!(params.roots[2], 13682589);
        assert_eq!(params.roots[3], 27193631);
        assert_eq!(params.roots[128], PSI);
    }

    #[test]
    fn test_ntt_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for _ in 0..8 {
            let poly = random_poly(&mut rng);
            assert_eq!(ntt_inverse(&ntt_forward(&poly)), poly);
        }
    }

    #[test]
    fn test_ntt_polynomial_multiplication() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let a = random_poly(&mut rng);
        let b = random_poly(&mut rng);

        let product = ntt_inverse(&ntt_forward(&a).pointwise_mul(&ntt_forward(&b)));
        assert_eq!(product, a.schoolbook_mul(&b));
    }

    #[test]
    fn test_mul_acc() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let a = ntt_forward(&random_poly(&mut rng));
        let b = ntt_forward(&random_poly(&mut rng));

        let mut acc = NttPolynomial::zero();
        acc.mul_acc(&a, &b);
        acc.mul_acc(&a, &b);
        let single = a.pointwise_mul(&b);
        assert_eq!(acc, single.clone() + single);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(NttParams::new(97, 6, 8).is_err());
        // 64 = 8^2 has order 8 mod 97, not 16
        assert!(NttParams::new(97, 8, 64).is_err());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let params = create_test_params();
        let mut short = [1, 2, 3];
        assert_eq!(
            params.forward(&mut short),
            Err(Error::DimensionMismatch { expected: 8, actual: 3 })
        );
    }

    #[test]
    fn test_bit_reversal() {
        assert_eq!(bit_reverse(0, 3), 0);
        assert_eq!(bit_reverse(1, 3), 4);
        assert_eq!(bit_reverse(3, 3), 6);
        assert_eq!(bit_reverse(6, 3), 3);
        assert_eq!(bit_reverse(1, 8), 128);
    }
}
