/// Reduces a value to the canonical range [0, q-1]
#[inline]
pub fn reduce(value: i64, q: i32) -> i32 {
    value.rem_euclid(q as i64) as i32
}

/// Maps a canonical value to the centered range (-q/2, q/2]
#[inline]
pub fn centered(value: i32, q: i32) -> i32 {
    if value > q / 2 {
        value - q
    } else {
        value
    }
}

/// Computes a * b mod q for canonical inputs
#[inline]
pub fn mul_mod(a: i32, b: i32, q: i32) -> i32 {
    ((a as i64 * b as i64) % q as i64) as i32
}

/// Computes base^exponent mod q by square-and-multiply
pub fn mod_pow(base: i32, exponent: u64, q: i32) -> i32 {
    let mut result = 1i32;
    let mut base = reduce(base as i64, q);
    let mut exp = exponent;

    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, q);
        }
        base = mul_mod(base, base, q);
        exp >>= 1;
    }

    result
}

/// Computes the multiplicative inverse of a mod q
///
/// Returns `None` when a and q are not coprime.
pub fn mod_inverse(a: i32, q: i32) -> Option<i32> {
    // Extended Euclidean algorithm tracking only the coefficient of a
    let mut s = 0i64;
    let mut old_s = 1i64;
    let mut r = q as i64;
    let mut old_r = reduce(a as i64, q) as i64;

    while r != 0 {
        let quotient = old_r / r;

        let temp = r;
        r = old_r - quotient * r;
        old_r = temp;

        let temp = s;
        s = old_s - quotient * s;
        old_s = temp;
    }

    if old_r != 1 {
        return None;
    }

    Some(reduce(old_s, q))
}
