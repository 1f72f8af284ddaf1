//! Dense complex matrices and LU decomposition.

use num_complex::Complex64;

use super::PIVOT_THRESHOLD;
use crate::error::{Result, SfgError};

/// Square complex matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CMatrix {
    data: Vec<Complex64>,
    size: usize,
}

impl CMatrix {
    /// Zero matrix of dimension `size`.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![Complex64::new(0.0, 0.0); size * size],
            size,
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut m = Self::new(size);
        for i in 0..size {
            m.set(i, i, Complex64::new(1.0, 0.0));
        }
        m
    }

    /// Build from rows; every row must have as many entries as there are rows.
    pub fn from_rows(rows: &[Vec<Complex64>]) -> Result<Self> {
        let size = rows.len();
        let mut m = Self::new(size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(SfgError::dimension_mismatch(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            m.data[i * size..(i + 1) * size].copy_from_slice(row);
        }
        Ok(m)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.size + col]
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: Complex64) {
        self.data[row * self.size + col] = value;
    }

    /// Add to element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: Complex64) {
        self.data[row * self.size + col] += value;
    }

    /// Matrix product `self * other`.
    pub fn mul(&self, other: &CMatrix) -> Result<CMatrix> {
        if self.size != other.size {
            return Err(SfgError::dimension_mismatch(format!(
                "cannot multiply {0}x{0} by {1}x{1}",
                self.size, other.size
            )));
        }
        let n = self.size;
        let mut out = CMatrix::new(n);
        for i in 0..n {
            for k in 0..n {
                let a = self.get(i, k);
                for j in 0..n {
                    out.add(i, j, a * other.get(k, j));
                }
            }
        }
        Ok(out)
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        if x.len() != self.size {
            return Err(SfgError::dimension_mismatch(format!(
                "vector of length {} for a {1}x{1} matrix",
                x.len(),
                self.size
            )));
        }
        let n = self.size;
        Ok((0..n)
            .map(|i| (0..n).map(|j| self.get(i, j) * x[j]).sum::<Complex64>())
            .collect())
    }

    /// LU decomposition with threshold pivoting.
    ///
    /// Rows are swapped only when the current pivot magnitude does not
    /// exceed [`PIVOT_THRESHOLD`]; the first row below it that does is
    /// used instead.
    pub fn lu(&self) -> Result<LuDecomposition> {
        let n = self.size;
        let mut lu = self.data.clone();
        let mut pivots: Vec<usize> = (0..n).collect();

        for k in 0..n {
            if lu[k * n + k].norm() <= PIVOT_THRESHOLD {
                let row = (k + 1..n)
                    .find(|&i| lu[i * n + k].norm() > PIVOT_THRESHOLD)
                    .ok_or(SfgError::SingularMatrix)?;
                log::trace!("pivot swap: rows {} and {}", k, row);
                pivots.swap(k, row);
                for j in 0..n {
                    lu.swap(k * n + j, row * n + j);
                }
            }

            // Eliminate
            let pivot = lu[k * n + k];
            for i in (k + 1)..n {
                let factor = lu[i * n + k] / pivot;
                lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    let upper = lu[k * n + j];
                    lu[i * n + j] -= factor * upper;
                }
            }
        }

        Ok(LuDecomposition { lu, pivots, size: n })
    }
}

/// `P·A = L·U` with unit lower-triangular `L`.
///
/// Multipliers of `L` are stored below the diagonal, `U` on and above it.
/// Row `i` of `P·A` is row `pivots[i]` of `A`.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    lu: Vec<Complex64>,
    pivots: Vec<usize>,
    size: usize,
}

impl LuDecomposition {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    pub fn lower(&self) -> CMatrix {
        let n = self.size;
        let mut l = CMatrix::identity(n);
        for i in 0..n {
            for j in 0..i {
                l.set(i, j, self.lu[i * n + j]);
            }
        }
        l
    }

    pub fn upper(&self) -> CMatrix {
        let n = self.size;
        let mut u = CMatrix::new(n);
        for i in 0..n {
            for j in i..n {
                u.set(i, j, self.lu[i * n + j]);
            }
        }
        u
    }

    /// `L·U` with the row permutation undone, i.e. the decomposed matrix.
    pub fn reconstruct(&self) -> Result<CMatrix> {
        let product = self.lower().mul(&self.upper())?;
        let n = self.size;
        let mut out = CMatrix::new(n);
        for (i, &row) in self.pivots.iter().enumerate() {
            for j in 0..n {
                out.set(row, j, product.get(i, j));
            }
        }
        Ok(out)
    }

    /// Solve `A·x = b`.
    pub fn solve(&self, b: &[Complex64]) -> Result<Vec<Complex64>> {
        let n = self.size;
        if b.len() != n {
            return Err(SfgError::dimension_mismatch(format!(
                "right-hand side of length {} for a {1}x{1} system",
                b.len(),
                n
            )));
        }

        // Apply pivot permutation to b
        let mut x: Vec<Complex64> = self.pivots.iter().map(|&row| b[row]).collect();

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                let l = self.lu[i * n + j];
                x[i] = x[i] - l * x[j];
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                let u = self.lu[i * n + j];
                x[i] = x[i] - u * x[j];
            }
            x[i] /= self.lu[i * n + i];
        }

        Ok(x)
    }
}
