use sha3::digest::XofReader;

use crate::error::{Error, Result};
use crate::params::N;

/// Number of bytes taken by one polynomial packed at `bits` per coefficient
pub const fn packed_len(bits: usize) -> usize {
    (N * bits + 7) / 8
}

/// Packs coefficients LSB first at `bits` bits each, masking higher bits
pub fn serialize(poly: &[i32; N], bits: usize) -> Vec<u8> {
    let mask = (1u64 << bits) - 1;
    let mut out = Vec::with_capacity(packed_len(bits));
    let mut acc = 0u64;
    let mut filled = 0;

    for &c in poly.iter() {
        acc |= (c as u64 & mask) << filled;
        filled += bits;
        while filled >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            filled -= 8;
        }
    }
    if filled > 0 {
        out.push(acc as u8);
    }

    out
}

/// Unpacks one polynomial, returning it with the number of bytes consumed
pub fn deserialize(bytes: &[u8], bits: usize) -> Result<([i32; N], usize)> {
    let needed = packed_len(bits);
    if bytes.len() < needed {
        return Err(Error::Truncated {
            expected: needed,
            actual: bytes.len(),
        });
    }

    let mask = (1u64 << bits) - 1;
    let mut coeffs = [0i32; N];
    let mut acc = 0u64;
    let mut filled = 0;
    let mut pos = 0;

    for c in coeffs.iter_mut() {
        while filled < bits {
            acc |= (bytes[pos] as u64) << filled;
            pos += 1;
            filled += 8;
        }
        *c = (acc & mask) as i32;
        acc >>= bits;
        filled -= bits;
    }

    Ok((coeffs, pos))
}

/// Packs polynomials one after another in index order
pub fn vec_serialize(polys: &[[i32; N]], bits: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(polys.len() * packed_len(bits));
    for p in polys {
        out.extend_from_slice(&serialize(p, bits));
    }
    out
}

/// Unpacks `count` consecutive polynomials and the total bytes consumed
pub fn vec_deserialize(bytes: &[u8], count: usize, bits: usize) -> Result<(Vec<[i32; N]>, usize)> {
    let needed = count * packed_len(bits);
    if bytes.len() < needed {
        return Err(Error::Truncated {
            expected: needed,
            actual: bytes.len(),
        });
    }

    let mut polys = Vec::with_capacity(count);
    let mut offset = 0;
    for _ in 0..count {
        let (p, used) = deserialize(&bytes[offset..], bits)?;
        polys.push(p);
        offset += used;
    }

    Ok((polys, offset))
}

/// Rounds coefficients in [0, q) down to `bits` bits: round(2^bits * x / q) mod 2^bits
pub fn compress(poly: &[i32; N], bits: usize, q: i64) -> [i32; N] {
    let t = 1i64 << bits;
    let half = q / 2;
    let mut out = [0i32; N];
    for (o, &x) in out.iter_mut().zip(poly.iter()) {
        *o = ((t * x as i64 + half) / q % t) as i32;
    }
    out
}

/// Scales `bits`-bit values back up to Z_q: round(q * x / 2^bits) mod q
pub fn decompress(poly: &[i32; N], bits: usize, q: i64) -> [i32; N] {
    let half = 1i64 << (bits - 1);
    let mut out = [0i32; N];
    for (o, &x) in out.iter_mut().zip(poly.iter()) {
        *o = ((q * x as i64 + half) >> bits).rem_euclid(q) as i32;
    }
    out
}

/// Maps v in Z_q to 2v + e in Z_2q with e in {-1, 0, 1} drawn from the XOF
///
/// Each block of 32 coefficients consumes one little-endian u64; coefficient
/// j of the block uses bits 2j and 2j+1 as e = bit0 - bit1.
pub fn randomize_double(poly: &[i32; N], xof: &mut impl XofReader, q: i64) -> [i32; N] {
    let q2 = 2 * q;
    let mut out = [0i32; N];
    let mut buf = [0u8; 8];

    for (block, chunk) in out.chunks_mut(32).enumerate() {
        xof.read(&mut buf);
        let mut bits = u64::from_le_bytes(buf);
        for (j, o) in chunk.iter_mut().enumerate() {
            let bit0 = (bits & 1) as i64;
            let bit1 = ((bits >> 1) & 1) as i64;
            let v = poly[32 * block + j] as i64;
            *o = (2 * v + bit0 - bit1).rem_euclid(q2) as i32;
            bits >>= 2;
        }
    }

    out
}

/// Cross rounding: floor(4x / q2) mod 2
pub fn cross_round(poly: &[i32; N], q2: i64) -> [i32; N] {
    let mut out = [0i32; N];
    for (o, &x) in out.iter_mut().zip(poly.iter()) {
        *o = ((4 * x as i64) / q2 % 2) as i32;
    }
    out
}

/// Recovers the 1-bit rounding of v from a noisy w = v + e and the hint cross_round(v)
///
/// Correct whenever |e| < q2/8.
pub fn reconcile(w: &[i32; N], hint: &[i32; N], q2: i64) -> [i32; N] {
    // Acceptance intervals for hint 0 and hint 1, widened by the error bound
    let i0_lo = (q2 + 3) / 4 + q2 / 8 - 1;
    let i0_hi = q2 - q2 / 8 - 1;
    let i1_lo = q2 / 8 - 1;
    let i1_hi = q2 - q2 / 4 - q2 / 8 - 1;

    let mut out = [0i32; N];
    for i in 0..N {
        let x = w[i] as i64;
        let (lo, hi) = if hint[i] == 0 { (i0_lo, i0_hi) } else { (i1_lo, i1_hi) };
        out[i] = (x >= lo && x < hi) as i32;
    }
    out
}
