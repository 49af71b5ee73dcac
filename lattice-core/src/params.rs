/// Degree of the ring modulus X^d + 1
pub const N: usize = 256;

/// Coefficient modulus q = 2^25 - 2^12 + 1
pub const Q: i32 = 33550337;

/// Bit length of q - 1
pub const LOG_Q: usize = 25;

/// Primitive 2d-th root of unity mod q
pub const PSI: i32 = 8433925;

/// d^-1 mod q
pub const N_INV: i32 = 33419281;
