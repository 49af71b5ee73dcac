use std::ops::{Add, AddAssign, Neg, Sub};

use crate::params::{N, Q};
use crate::zq;

/// A polynomial of R_q = Z_q[X]/(X^n + 1) in the coefficient domain
///
/// Coefficients are always kept canonical in [0, q-1].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    coeffs: [i32; N],
}

impl Polynomial {
    /// Creates a new zero polynomial
    pub fn zero() -> Self {
        Polynomial { coeffs: [0; N] }
    }

    /// Creates a polynomial from arbitrary (possibly negative) integer coefficients
    pub fn from_coeffs(coeffs: [i32; N]) -> Self {
        let mut coeffs = coeffs;
        for c in coeffs.iter_mut() {
            *c = zq::reduce(*c as i64, Q);
        }
        Polynomial { coeffs }
    }

    /// Canonical coefficients in [0, q-1]
    pub fn coeffs(&self) -> &[i32; N] {
        &self.coeffs
    }

    pub fn into_coeffs(self) -> [i32; N] {
        self.coeffs
    }

    /// Coefficients mapped to the centered range (-q/2, q/2]
    pub fn signed(&self) -> [i32; N] {
        let mut out = self.coeffs;
        for c in out.iter_mut() {
            *c = zq::centered(*c, Q);
        }
        out
    }

    /// Multiplies the polynomial by a scalar
    pub fn scale(&self, scalar: i32) -> Self {
        let s = zq::reduce(scalar as i64, Q);
        let mut result = self.clone();
        for c in result.coeffs.iter_mut() {
            *c = zq::mul_mod(*c, s, Q);
        }
        result
    }

    /// Multiplies two polynomials using the schoolbook algorithm
    pub fn schoolbook_mul(&self, other: &Self) -> Self {
        Polynomial {
            coeffs: negacyclic_mul(&self.coeffs, &other.coeffs, Q),
        }
    }
}

/// Negacyclic product of two degree-L coefficient arrays modulo q
///
/// Generic over the degree so small test rings share the code.
pub fn negacyclic_mul<const L: usize>(f: &[i32; L], g: &[i32; L], q: i32) -> [i32; L] {
    let n = L;
    let mut result = [0i64; L];

    for i in 0..n {
        for j in 0..n {
            let product = f[i] as i64 * g[j] as i64;
            // X^n = -1 folds the upper half back with a sign flip
            if i + j < n {
                result[i + j] += product;
            } else {
                result[i + j - n] -= product;
            }
        }
        // Keep the accumulator small enough for any 25-bit q
        if i % 64 == 63 {
            for r in result.iter_mut() {
                *r %= q as i64;
            }
        }
    }

    result.map(|r| zq::reduce(r, q))
}

/// Adds the negacyclic product f * g into `acc` without any reduction
///
/// The accumulator stays exact as long as the operand magnitudes are small,
/// which holds for compressed ciphertext coefficients times small secrets.
pub fn schoolbook_mul_acc(acc: &mut [i64; N], f: &[i32; N], g: &[i32; N]) {
    for i in 0..N {
        let x = g[i] as i64;
        for j in i..N {
            acc[j] += x * f[j - i] as i64;
        }
        for j in 0..i {
            acc[j] -= x * f[N + j - i] as i64;
        }
    }
}

impl Add for Polynomial {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += &other;
        self
    }
}

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, other: &Polynomial) {
        for (a, &b) in self.coeffs.iter_mut().zip(other.coeffs.iter()) {
            let sum = *a + b;
            *a = if sum >= Q { sum - Q } else { sum };
        }
    }
}

impl Sub for Polynomial {
    type Output = Self;

    fn sub(mut self, other: Self) -> Self {
        for (a, &b) in self.coeffs.iter_mut().zip(other.coeffs.iter()) {
            let diff = *a - b;
            *a = if diff < 0 { diff + Q } else { diff };
        }
        self
    }
}

impl Neg for Polynomial {
    type Output = Self;

    fn neg(mut self) -> Self {
        for c in self.coeffs.iter_mut() {
            *c = if *c == 0 { 0 } else { Q - *c };
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn create_test_poly(prefix: &[i32]) -> Polynomial {
        let mut coeffs = [0i32; N];
        coeffs[..prefix.len()].copy_from_slice(prefix);
        Polynomial::from_coeffs(coeffs)
    }

    fn random_poly(rng: &mut ChaCha20Rng) -> Polynomial {
        let mut coeffs = [0i32; N];
        for c in coeffs.iter_mut() {
            *c = rng.gen_range(0..Q);
        }
        Polynomial::from_coeffs(coeffs)
    }

    #[test]
    fn test_from_coeffs_normalizes() {
        let poly = create_test_poly(&[-1, Q, Q + 5, -Q - 2]);
        assert_eq!(&poly.coeffs()[..4], &[Q - 1, 0, 5, Q - 2]);
        assert_eq!(&poly.signed()[..4], &[-1, 0, 5, -2]);
    }

    #[test]
    fn test_addition() {
        let p1 = create_test_poly(&[1, 2, Q - 1, 4]);
        let p2 = create_test_poly(&[5, 6, 7, 8]);
        let result = p1 + p2;

        assert_eq!(result, create_test_poly(&[6, 8, 6, 12]));
    }

    #[test]
    fn test_subtraction() {
        let p1 = create_test_poly(&[10, 11, 12, 0]);
        let p2 = create_test_poly(&[1, 3, 5, 7]);
        let result = p1 - p2;

        assert_eq!(result, create_test_poly(&[9, 8, 7, -7]));
    }

    #[test]
    fn test_negation() {
        let p = create_test_poly(&[0, 1, 2]);
        assert_eq!(-p, create_test_poly(&[0, -1, -2]));
    }

    #[test]
    fn test_scale() {
        let poly = create_test_poly(&[1, 2, 3, -4]);
        assert_eq!(poly.scale(2), create_test_poly(&[2, 4, 6, -8]));
        assert_eq!(poly.scale(-1), -poly.clone());
    }

    #[test]
    fn test_schoolbook_mul() {
        // (1 + 2x)(3 + 4x) = 3 + 10x + 8x^2
        let p1 = create_test_poly(&[1, 2]);
        let p2 = create_test_poly(&[3, 4]);
        assert_eq!(p1.schoolbook_mul(&p2), create_test_poly(&[3, 10, 8]));

        // x^(n-1) * x = x^n = -1
        let mut high = [0i32; N];
        high[N - 1] = 1;
        let wrapped = Polynomial::from_coeffs(high).schoolbook_mul(&create_test_poly(&[0, 1]));
        assert_eq!(wrapped, create_test_poly(&[-1]));
    }

    #[test]
    fn test_negacyclic_mul_small_ring() {
        let f = [1, 2, 3, 4, 5, 6, 7, 8];
        let g = [3, 4, 0, 0, 0, 0, 0, 1];
        assert_eq!(
            negacyclic_mul(&f, &g, 97),
            [66, 7, 13, 19, 25, 31, 37, 53]
        );
    }

    #[test]
    fn test_mul_acc_matches_schoolbook() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut u = [0i32; N];
        let mut s = [0i32; N];
        for i in 0..N {
            u[i] = rng.gen_range(0..1 << 14);
            s[i] = rng.gen_range(-1..=1);
        }

        let mut acc = [0i64; N];
        schoolbook_mul_acc(&mut acc, &u, &s);
        schoolbook_mul_acc(&mut acc, &u, &s);

        let single = Polynomial::from_coeffs(u).schoolbook_mul(&Polynomial::from_coeffs(s));
        let reduced = Polynomial::from_coeffs(acc.map(|a| zq::reduce(a, Q)));
        assert_eq!(reduced, single.clone() + single);
    }

    #[test]
    fn test_schoolbook_commutes() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let a = random_poly(&mut rng);
        let b = random_poly(&mut rng);
        assert_eq!(a.schoolbook_mul(&b), b.schoolbook_mul(&a));
    }
}
