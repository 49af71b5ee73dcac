use sha3::digest::XofReader;

use crate::error::{Error, Result};
use crate::params::N;

/// Encoded length of a ternary polynomial: five trits per byte
pub const TERNARY_BYTES: usize = (N + 4) / 5;

/// Encoded length of a binary polynomial: eight bits per byte
pub const BINARY_BYTES: usize = (N + 7) / 8;

/// Samples a polynomial with coefficients uniform in [0, q-1]
///
/// Each candidate is read as ceil(bits(q-1)/8) little-endian bytes, masked to
/// bits(q-1) bits and rejected when it is not below q.
pub fn sample_uniform(xof: &mut impl XofReader, q: i32) -> [i32; N] {
    let bits = 32 - ((q - 1) as u32).leading_zeros();
    let width = ((bits + 7) / 8) as usize;
    let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };

    let mut coeffs = [0i32; N];
    let mut filled = 0;
    let mut buf = [0u8; 4];

    while filled < N {
        xof.read(&mut buf[..width]);
        let x = u32::from_le_bytes(buf) & mask;
        if x < q as u32 {
            coeffs[filled] = x as i32;
            filled += 1;
        }
    }

    coeffs
}

/// Samples the compact encoding of a uniform ternary polynomial
///
/// Bytes of 243 and above are rejected so every accepted byte carries five
/// uniform base-3 digits.
pub fn sample_ternary(xof: &mut impl XofReader) -> Vec<u8> {
    let mut out = Vec::with_capacity(TERNARY_BYTES);
    let mut byte = [0u8; 1];

    while out.len() < TERNARY_BYTES {
        xof.read(&mut byte);
        if byte[0] < 243 {
            out.push(byte[0]);
        }
    }

    out
}

/// Decodes a ternary polynomial with coefficients in {-1, 0, 1}
pub fn decode_ternary(bytes: &[u8]) -> Result<[i32; N]> {
    if bytes.len() != TERNARY_BYTES {
        return Err(Error::InvalidLength {
            expected: TERNARY_BYTES,
            actual: bytes.len(),
        });
    }

    let mut coeffs = [0i32; N];
    for (i, &b) in bytes.iter().enumerate() {
        if b >= 243 {
            return Err(Error::InvalidEncoding("ternary byte out of range"));
        }
        let mut x = b as i32;
        for k in 0..5 {
            let idx = 5 * i + k;
            if idx < N {
                coeffs[idx] = x % 3 - 1;
            }
            x /= 3;
        }
    }

    Ok(coeffs)
}

/// Samples the compact encoding of a uniform binary polynomial
pub fn sample_binary(xof: &mut impl XofReader) -> Vec<u8> {
    let mut out = vec![0u8; BINARY_BYTES];
    xof.read(&mut out);
    out
}

/// Decodes a binary polynomial with coefficients in {0, 1}, LSB first
pub fn decode_binary(bytes: &[u8]) -> Result<[i32; N]> {
    if bytes.len() != BINARY_BYTES {
        return Err(Error::InvalidLength {
            expected: BINARY_BYTES,
            actual: bytes.len(),
        });
    }

    let mut coeffs = [0i32; N];
    for (i, c) in coeffs.iter_mut().enumerate() {
        *c = ((bytes[i / 8] >> (i % 8)) & 1) as i32;
    }

    Ok(coeffs)
}

/// Samples a rounded Gaussian polynomial of the given width
///
/// The width relates to the standard deviation by sigma = width / sqrt(2 pi).
/// Continuous samples come from the Marsaglia polar method with the variance
/// narrowed by 1/12 to account for rounding.
///
/// This sampler is approximate and NOT constant time. It is a placeholder
/// for a proper discrete Gaussian sampler.
pub fn sample_gaussian(xof: &mut impl XofReader, width: f64) -> [i32; N] {
    let cs2 = 1.0 / 6.0 - width * width / std::f64::consts::PI;
    let scale = 0.5f64.powi(63);

    let mut coeffs = [0i32; N];
    let mut filled = 0;
    let mut buf = [0u8; 8];

    while filled < N {
        xof.read(&mut buf);
        let x = scale * u64::from_le_bytes(buf) as f64 - 1.0;
        xof.read(&mut buf);
        let y = scale * u64::from_le_bytes(buf) as f64 - 1.0;

        let s = x * x + y * y;
        if s > 0.0 && s <= 1.0 {
            let w = (cs2 * s.ln() / s).sqrt();
            coeffs[filled] = (x * w).round_ties_even() as i32;
            if filled + 1 < N {
                coeffs[filled + 1] = (y * w).round_ties_even() as i32;
            }
            filled += 2;
        }
    }

    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{Xof, XofKind};
    use crate::params::Q;

    fn shake128(parts: &[&[u8]]) -> Xof {
        Xof::new(XofKind::Shake128, parts)
    }

    #[test]
    fn test_uniform_known_answer() {
        let mut xof = shake128(&[b"0123456789abcdef", &[0, 0], b"A"]);
        let poly = sample_uniform(&mut xof, Q);
        assert_eq!(
            &poly[..6],
            &[29537246, 1357602, 33083194, 15558079, 30996139, 7603869]
        );
    }

    #[test]
    fn test_uniform_histogram() {
        const BUCKETS: usize = 16;
        let mut xof = shake128(&[b"uniform"]);
        let mut counts = [0u32; BUCKETS];
        let rounds = 64;
        for _ in 0..rounds {
            let poly = sample_uniform(&mut xof, Q);
            assert!(poly.iter().all(|&c| (0..Q).contains(&c)));
            for &c in poly.iter() {
                counts[(c as i64 * BUCKETS as i64 / Q as i64) as usize] += 1;
            }
        }

        // Chi-square over 15 degrees of freedom, 0.1% critical value
        let expected = (rounds * N / BUCKETS) as f64;
        let chi2: f64 = counts
            .iter()
            .map(|&k| (k as f64 - expected).powi(2) / expected)
            .sum();
        assert!(chi2 < 37.7, "chi2 {} over {:?}", chi2, counts);
    }

    /// Replays a fixed byte pattern forever
    struct Replay {
        bytes: &'static [u8],
        pos: usize,
    }

    impl XofReader for Replay {
        fn read(&mut self, buffer: &mut [u8]) {
            for b in buffer.iter_mut() {
                *b = self.bytes[self.pos % self.bytes.len()];
                self.pos += 1;
            }
        }
    }

    #[test]
    fn test_uniform_rejects_instead_of_reducing() {
        // With q = 97 candidates are masked to 7 bits: 100 and 97 must be
        // skipped, 133 masks to 5
        let mut xof = Replay {
            bytes: &[100, 133, 97, 5],
            pos: 0,
        };
        let poly = sample_uniform(&mut xof, 97);
        assert!(poly.iter().all(|&c| c == 5), "{:?}", &poly[..8]);
        assert_eq!(xof.pos, 2 * N);
    }

    #[test]
    fn test_uniform_small_modulus() {
        let mut xof = shake128(&[b"small"]);
        let poly = sample_uniform(&mut xof, 97);
        assert!(poly.iter().all(|&c| (0..97).contains(&c)));
    }

    #[test]
    fn test_ternary_known_answer() {
        let bytes = sample_ternary(&mut shake128(&[b"0"]));
        assert_eq!(bytes.len(), TERNARY_BYTES);
        assert_eq!(hex::encode(&bytes[..6]), "628e79cf7948");

        let poly = decode_ternary(&bytes).unwrap();
        assert_eq!(&poly[..10], &[1, 1, 0, -1, 0, 0, 1, -1, 1, 0]);
        assert!(poly.iter().all(|&c| (-1..=1).contains(&c)));
    }

    #[test]
    fn test_ternary_rejects_bad_input() {
        let mut bytes = vec![0u8; TERNARY_BYTES];
        bytes[7] = 243;
        assert_eq!(
            decode_ternary(&bytes),
            Err(Error::InvalidEncoding("ternary byte out of range"))
        );
        assert!(matches!(
            decode_ternary(&bytes[1..]),
            Err(Error::InvalidLength { expected: 52, actual: 51 })
        ));
    }

    #[test]
    fn test_ternary_last_byte_truncated() {
        // 242 = 22222 in base 3, so the last byte carries a single kept digit
        let bytes = vec![242u8; TERNARY_BYTES];
        let poly = decode_ternary(&bytes).unwrap();
        assert!(poly.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_binary_decode() {
        let mut bytes = vec![0u8; BINARY_BYTES];
        bytes[0] = 0b1011_0001;
        bytes[1] = 0xff;
        let poly = decode_binary(&bytes).unwrap();
        assert_eq!(&poly[..16], &[1, 0, 0, 0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
        assert!(poly[16..].iter().all(|&c| c == 0));

        assert!(decode_binary(&bytes[..31]).is_err());
    }

    #[test]
    fn test_binary_sample_length() {
        let bytes = sample_binary(&mut shake128(&[b"bin"]));
        assert_eq!(bytes.len(), 32);
        let poly = decode_binary(&bytes).unwrap();
        assert!(poly.iter().all(|&c| c == 0 || c == 1));
    }

    #[test]
    fn test_gaussian_known_answer() {
        let poly = sample_gaussian(&mut shake128(&[b"0"]), 15.90);
        assert_eq!(&poly[..8], &[-4, -2, -6, -9, -6, 3, 1, -5]);
    }

    #[test]
    fn test_gaussian_moments() {
        let width = 15.90f64;
        let sigma2 = width * width / (2.0 * std::f64::consts::PI);

        let mut xof = shake128(&[b"gaussian moments"]);
        let (mut sum, mut sum_sq, mut count) = (0f64, 0f64, 0f64);
        // 2^20 draws
        for _ in 0..(1 << 12) {
            for c in sample_gaussian(&mut xof, width) {
                let c = c as f64;
                sum += c;
                sum_sq += c * c;
                count += 1.0;
            }
        }

        let mean = sum / count;
        let var = sum_sq / count - mean * mean;
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((var / sigma2 - 1.0).abs() < 0.02, "variance {} vs {}", var, sigma2);
    }
}
