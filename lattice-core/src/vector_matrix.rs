use crate::error::{Error, Result};
use crate::ntt::{ntt_forward, ntt_inverse, NttPolynomial};
use crate::polynomial::Polynomial;

fn check_dims(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Represents a vector of coefficient-domain polynomials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyVector {
    /// Vector of polynomials
    pub entries: Vec<Polynomial>,
}

/// Represents a vector of NTT-domain polynomials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttVector {
    pub entries: Vec<NttPolynomial>,
}

/// Represents a matrix of NTT-domain polynomials in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttMatrix {
    rows: Vec<Vec<NttPolynomial>>,
    n_rows: usize,
    n_cols: usize,
}

impl PolyVector {
    pub fn new(entries: Vec<Polynomial>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Elementwise sum; both vectors must have the same length
    pub fn add(&self, other: &Self) -> Result<Self> {
        check_dims(self.len(), other.len())?;
        let entries = self
            .entries
            .iter()
            .zip(other.entries.iter())
            .map(|(a, b)| a.clone() + b.clone())
            .collect();
        Ok(Self { entries })
    }

    /// Elementwise difference; both vectors must have the same length
    pub fn sub(&self, other: &Self) -> Result<Self> {
        check_dims(self.len(), other.len())?;
        let entries = self
            .entries
            .iter()
            .zip(other.entries.iter())
            .map(|(a, b)| a.clone() - b.clone())
            .collect();
        Ok(Self { entries })
    }

    /// Forward NTT of every entry
    pub fn ntt(&self) -> NttVector {
        NttVector {
            entries: self.entries.iter().map(ntt_forward).collect(),
        }
    }
}

impl NttVector {
    pub fn new(entries: Vec<NttPolynomial>) -> Self {
        Self { entries }
    }

    pub fn zero(length: usize) -> Self {
        Self {
            entries: vec![NttPolynomial::zero(); length],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inverse NTT of every entry
    pub fn inverse(&self) -> PolyVector {
        PolyVector {
            entries: self.entries.iter().map(ntt_inverse).collect(),
        }
    }

    /// Elementwise sum; both vectors must have the same length
    pub fn add(&self, other: &Self) -> Result<Self> {
        check_dims(self.len(), other.len())?;
        let entries = self
            .entries
            .iter()
            .zip(other.entries.iter())
            .map(|(a, b)| a.clone() + b.clone())
            .collect();
        Ok(Self { entries })
    }

    /// Inner product sum_i self[i] ∘ other[i], staying in the NTT domain
    pub fn inner_product(&self, other: &Self) -> Result<NttPolynomial> {
        check_dims(self.len(), other.len())?;
        let mut acc = NttPolynomial::zero();
        for (a, b) in self.entries.iter().zip(other.entries.iter()) {
            acc.mul_acc(a, b);
        }
        Ok(acc)
    }
}

impl NttMatrix {
    /// Creates a matrix from rows; every row must have the same length
    pub fn new(rows: Vec<Vec<NttPolynomial>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        for row in &rows {
            check_dims(n_cols, row.len())?;
        }
        Ok(Self { rows, n_rows, n_cols })
    }

    /// Builds an n_rows x n_cols matrix entry by entry
    pub fn from_fn(
        n_rows: usize,
        n_cols: usize,
        mut f: impl FnMut(usize, usize) -> NttPolynomial,
    ) -> Self {
        let rows = (0..n_rows)
            .map(|i| (0..n_cols).map(|j| f(i, j)).collect())
            .collect();
        Self { rows, n_rows, n_cols }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Gets a reference to an entry
    pub fn get(&self, row: usize, col: usize) -> Option<&NttPolynomial> {
        self.rows.get(row)?.get(col)
    }

    /// Matrix-vector product A·v
    pub fn mul_vec(&self, vec: &NttVector) -> Result<NttVector> {
        check_dims(self.n_cols, vec.len())?;

        let entries = self
            .rows
            .iter()
            .map(|row| {
                let mut acc = NttPolynomial::zero();
                for (a, v) in row.iter().zip(vec.entries.iter()) {
                    acc.mul_acc(a, v);
                }
                acc
            })
            .collect();

        Ok(NttVector { entries })
    }

    /// Transposed product Aᵀ·v without materializing the transpose
    pub fn mul_transpose_vec(&self, vec: &NttVector) -> Result<NttVector> {
        check_dims(self.n_rows, vec.len())?;

        let mut entries = vec![NttPolynomial::zero(); self.n_cols];
        for (row, v) in self.rows.iter().zip(vec.entries.iter()) {
            for (acc, a) in entries.iter_mut().zip(row.iter()) {
                acc.mul_acc(a, v);
            }
        }

        Ok(NttVector { entries })
    }
}
