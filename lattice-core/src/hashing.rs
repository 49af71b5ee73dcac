use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Shake128, Shake128Reader, Shake256, Shake256Reader};

/// Selects the extendable-output function backing a byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XofKind {
    Shake128,
    Shake256,
}

/// An absorbed XOF, ready to squeeze an arbitrary number of bytes
pub enum Xof {
    Shake128(Shake128Reader),
    Shake256(Shake256Reader),
}

impl Xof {
    /// Absorbs the concatenation of `parts` and finalizes the sponge
    pub fn new(kind: XofKind, parts: &[&[u8]]) -> Self {
        match kind {
            XofKind::Shake128 => {
                let mut hasher = Shake128::default();
                for part in parts {
                    hasher.update(part);
                }
                Xof::Shake128(hasher.finalize_xof())
            }
            XofKind::Shake256 => {
                let mut hasher = Shake256::default();
                for part in parts {
                    hasher.update(part);
                }
                Xof::Shake256(hasher.finalize_xof())
            }
        }
    }

    /// Squeezes `len` bytes into a new buffer
    pub fn squeeze(&mut self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        self.read(&mut out);
        out
    }
}

impl XofReader for Xof {
    fn read(&mut self, buffer: &mut [u8]) {
        match self {
            Xof::Shake128(reader) => reader.read(buffer),
            Xof::Shake256(reader) => reader.read(buffer),
        }
    }
}

/// Provides a SHAKE-128 hash of the given data
pub fn shake128(data: &[u8], output_len: usize) -> Vec<u8> {
    Xof::new(XofKind::Shake128, &[data]).squeeze(output_len)
}
