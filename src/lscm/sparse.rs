//! Simple sparse matrix and iterative solver.
//!
//! This module provides a lightweight sparse matrix implementation (CSR
//! format) and a Jacobi-preconditioned BiCGSTAB solver. The conformal system
//! assembled by the LSCM module is square but not symmetric, so a stabilized
//! bi-conjugate gradient method is used instead of plain CG; the diagonal
//! preconditioner also absorbs the large pin weights, keeping the iteration
//! well scaled.

use nalgebra::DVector;

use crate::error::{Result, UnwrapError};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in CSR format for efficient matrix-vector
/// multiplication.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Row pointers: row_ptr[i] is the index in col_idx/values where row i
    /// starts. Length is rows + 1, with row_ptr[rows] = nnz.
    row_ptr: Vec<usize>,
    /// Column indices for each non-zero value.
    col_idx: Vec<usize>,
    /// Non-zero values.
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        if triplets.is_empty() {
            return Self {
                rows,
                cols,
                row_ptr: vec![0; rows + 1],
                col_idx: Vec::new(),
                values: Vec::new(),
            };
        }

        // Sort by (row, col) for CSR construction
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        // Merge duplicates and build CSR
        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());

        let mut prev_row = usize::MAX;
        let mut prev_col = usize::MAX;

        for (row, col, val) in triplets {
            if row == prev_row && col == prev_col {
                // Same position: accumulate value
                *values.last_mut().unwrap() += val;
            } else {
                // New entry
                col_idx.push(col);
                values.push(val);
                // Update row pointers for any skipped rows
                for r in (prev_row.wrapping_add(1))..=row {
                    row_ptr[r] = col_idx.len() - 1;
                }
                prev_row = row;
                prev_col = col;
            }
        }

        // Fill remaining row pointers
        let nnz = col_idx.len();
        for r in (prev_row + 1)..=rows {
            row_ptr[r] = nnz;
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the main diagonal as a dense vector.
    pub fn diagonal(&self) -> DVector<f64> {
        let mut diag = DVector::zeros(self.rows.min(self.cols));
        for i in 0..diag.len() {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];
            for k in start..end {
                if self.col_idx[k] == i {
                    diag[i] = self.values[k];
                    break;
                }
            }
        }
        diag
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.rows);

        for i in 0..self.rows {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];

            let mut sum = 0.0;
            for k in start..end {
                sum += self.values[k] * x[self.col_idx[k]];
            }
            y[i] = sum;
        }

        y
    }
}

/// Solve A*x = b using BiCGSTAB with Jacobi preconditioning.
///
/// Works for general square matrices; symmetry is not required. The system
/// is left-preconditioned with the inverse diagonal of A, and convergence is
/// measured on the preconditioned residual, so rows of very different scale
/// (such as penalty-weighted constraint rows) do not distort the stopping
/// test.
///
/// # Arguments
///
/// * `a` - The system matrix (square)
/// * `b` - The right-hand side vector
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative preconditioned residual)
///
/// # Returns
///
/// The solution vector x, or an error if convergence fails or the iteration
/// breaks down.
pub fn bicgstab(
    a: &CsrMatrix,
    b: &DVector<f64>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "Matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "Matrix must be square");

    // Jacobi preconditioner: zero diagonal entries are left unscaled.
    let inv_diag = a
        .diagonal()
        .map(|d| if d.abs() > 1e-300 { 1.0 / d } else { 1.0 });
    let precondition = |v: DVector<f64>| v.component_mul(&inv_diag);

    let pb = precondition(b.clone());
    let pb_norm = pb.norm();
    if pb_norm < 1e-15 {
        return Ok(DVector::zeros(n));
    }

    let mut x = DVector::zeros(n);
    let mut r = pb;
    let r_hat = r.clone();

    let mut rho = 1.0;
    let mut alpha = 1.0;
    let mut omega = 1.0;
    let mut v = DVector::zeros(n);
    let mut p = DVector::zeros(n);

    for _iter in 0..max_iter {
        let rho_new = r_hat.dot(&r);
        if rho_new.abs() < 1e-300 {
            // Breakdown: the shadow residual became orthogonal to r
            break;
        }

        let beta = (rho_new / rho) * (alpha / omega);
        p = &r + beta * (&p - omega * &v);

        v = precondition(a.mul_vec(&p));
        let denom = r_hat.dot(&v);
        if denom.abs() < 1e-300 {
            break;
        }
        alpha = rho_new / denom;

        let s = &r - alpha * &v;
        if s.norm() / pb_norm < tolerance {
            x += alpha * &p;
            return Ok(x);
        }

        let t = precondition(a.mul_vec(&s));
        let tt = t.dot(&t);
        if tt < 1e-300 {
            break;
        }
        omega = t.dot(&s) / tt;

        x += alpha * &p + omega * &s;
        r = &s - omega * &t;

        if r.norm() / pb_norm < tolerance {
            return Ok(x);
        }

        rho = rho_new;
    }

    // Did not converge
    Err(UnwrapError::ConvergenceFailed {
        iterations: max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_from_triplets() {
        // 2x2 matrix:
        // [ 4  1 ]
        // [ 1  3 ]
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        assert_eq!(a.nrows(), 2);
        assert_eq!(a.ncols(), 2);
        assert_eq!(a.nnz(), 4);
    }

    #[test]
    fn test_csr_from_triplets_with_duplicates() {
        // Duplicate entries at (0, 0) should sum to 4.0
        let triplets = vec![
            (0, 0, 2.0),
            (0, 0, 2.0),
            (0, 1, 1.0),
            (1, 0, 1.0),
            (1, 1, 3.0),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        let x = DVector::from_vec(vec![1.0, 0.0]);
        let y = a.mul_vec(&x);

        assert!((y[0] - 4.0).abs() < 1e-10);
        assert!((y[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_csr_mul_vec() {
        // [ 4  1 ]   [ 1 ]   [ 5 ]
        // [ 1  3 ] * [ 1 ] = [ 4 ]
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        let x = DVector::from_vec(vec![1.0, 1.0]);
        let y = a.mul_vec(&x);

        assert!((y[0] - 5.0).abs() < 1e-10);
        assert!((y[1] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_csr_diagonal() {
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let diag = a.diagonal();
        assert!((diag[0] - 4.0).abs() < 1e-12);
        assert!((diag[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bicgstab_symmetric() {
        // Solve:
        // [ 4  1 ]   [ x ]   [ 1 ]
        // [ 1  3 ] * [ y ] = [ 2 ]
        //
        // Solution: x = 1/11, y = 7/11
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![1.0, 2.0]);

        let x = bicgstab(&a, &b, 100, 1e-12).unwrap();

        assert!((x[0] - 1.0 / 11.0).abs() < 1e-8);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-8);
    }

    #[test]
    fn test_bicgstab_nonsymmetric() {
        // [ 2  1 ]   [ 1 ]   [ 3 ]
        // [ 0  3 ] * [ 1 ] = [ 3 ]
        let triplets = vec![(0, 0, 2.0), (0, 1, 1.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![3.0, 3.0]);

        let x = bicgstab(&a, &b, 100, 1e-12).unwrap();

        assert!((x[0] - 1.0).abs() < 1e-8);
        assert!((x[1] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_bicgstab_larger_nonsymmetric() {
        // 4x4 diagonally dominant, not symmetric
        let triplets = vec![
            (0, 0, 10.0),
            (0, 1, 1.0),
            (0, 2, 2.0),
            (1, 0, -1.0),
            (1, 1, 10.0),
            (1, 3, 1.0),
            (2, 1, 3.0),
            (2, 2, 10.0),
            (3, 0, 1.0),
            (3, 3, 10.0),
        ];
        let a = CsrMatrix::from_triplets(4, 4, triplets);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);

        let x = bicgstab(&a, &b, 200, 1e-12).unwrap();

        let residual = a.mul_vec(&x) - &b;
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_bicgstab_penalty_weighted_rows() {
        // Mixed scales: two rows carry a 1e10 penalty weight like the pinned
        // LSCM rows. The preconditioner must keep the stopping test honest.
        let w = 1e10;
        let triplets = vec![
            (0, 0, w),
            (1, 0, 0.5),
            (1, 1, 2.0),
            (1, 2, -0.25),
            (2, 1, 0.75),
            (2, 2, 1.5),
            (3, 3, w),
        ];
        let a = CsrMatrix::from_triplets(4, 4, triplets);
        let mut b = DVector::zeros(4);
        b[0] = 0.0;
        b[1] = 1.0;
        b[2] = 2.0;
        b[3] = w; // pins x[3] at 1.0

        let x = bicgstab(&a, &b, 200, 1e-12).unwrap();

        assert!(x[0].abs() < 1e-8);
        assert!((x[3] - 1.0).abs() < 1e-8);
        // Interior rows solved accurately at their own scale
        assert!((0.5 * x[0] + 2.0 * x[1] - 0.25 * x[2] - 1.0).abs() < 1e-8);
        assert!((0.75 * x[1] + 1.5 * x[2] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn test_bicgstab_zero_rhs() {
        let triplets = vec![(0, 0, 2.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::zeros(2);

        let x = bicgstab(&a, &b, 100, 1e-12).unwrap();
        assert!(x.norm() < 1e-15);
    }

    #[test]
    fn test_bicgstab_divergence() {
        // Row 0 is all zeros but b[0] is not: no solution exists and the
        // solver must report failure.
        let triplets = vec![(1, 1, 1.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![1.0, 1.0]);

        let result = bicgstab(&a, &b, 10, 1e-12);
        assert!(matches!(
            result,
            Err(UnwrapError::ConvergenceFailed { iterations: 10 })
        ));
    }
}
