//! Dense linear algebra for coefficient solves.
//!
//! Everything here runs in `f64` regardless of the table scalar; the
//! handful of systems involved are tiny (at most 8x8) and solving them in
//! working `f32` would throw away coefficient accuracy for no speedup.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Vandermonde matrix over the given sample points, one row per point,
/// columns in rising powers.
pub fn vandermonde(points: &[f64], ncols: usize) -> DMatrix<f64> {
    let mut a = DMatrix::from_element(points.len(), ncols, 1.0);
    for (row, &x) in points.iter().enumerate() {
        for col in 1..ncols {
            a[(row, col)] = a[(row, col - 1)] * x;
        }
    }
    a
}

/// `len` equally spaced points from `a` through `b` inclusive.
pub fn linspace(a: f64, b: f64, len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![a];
    }
    let h = (b - a) / (len - 1) as f64;
    (0..len).map(|i| a + h * i as f64).collect()
}

/// LU solve with one step of iterative refinement.
///
/// Returns `None` when the matrix is singular to working precision.
pub fn solve_refined(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let lu = a.clone().lu();
    let mut x = lu.solve(b)?;
    let residual = b - a * &x;
    if let Some(correction) = lu.solve(&residual) {
        x += correction;
    }
    Some(x)
}

/// A unit-norm vector `v` with `a * v ≈ 0`, taken as the eigenvector of
/// `aᵀa` with the smallest eigenvalue. For the rectangular systems Padé
/// construction produces (`n` rows, `n + 1` columns) the nullspace is at
/// least one-dimensional, so the smallest eigenvalue is zero up to
/// conditioning.
pub fn nullspace_vector(a: &DMatrix<f64>) -> Option<DVector<f64>> {
    let ata = a.transpose() * a;
    let eigen = SymmetricEigen::new(ata);
    let mut smallest = 0;
    for i in 1..eigen.eigenvalues.len() {
        if eigen.eigenvalues[i].abs() < eigen.eigenvalues[smallest].abs() {
            smallest = i;
        }
    }
    let v = eigen.eigenvectors.column(smallest).into_owned();
    if v.iter().all(|c| c.is_finite()) {
        Some(v)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vandermonde_solve_recovers_coefficients() {
        // samples of 2 + 3x - x^2 at three points
        let pts = [0.0, 0.5, 1.0];
        let a = vandermonde(&pts, 3);
        let p = |x: f64| 2.0 + 3.0 * x - x * x;
        let b = DVector::from_iterator(3, pts.iter().map(|&x| p(x)));
        let c = solve_refined(&a, &b).unwrap();
        assert_relative_eq!(c[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(c[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(c[2], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_solve_is_none() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let b = DVector::from_row_slice(&[1.0, 3.0]);
        assert!(solve_refined(&a, &b).is_none());
    }

    #[test]
    fn nullspace_of_a_wide_matrix() {
        // rows are orthogonal to (1, -2, 1)
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 1.0, 0.0, 1.0, 2.0]);
        let v = nullspace_vector(&a).unwrap();
        let residual = &a * &v;
        for r in residual.iter() {
            assert!(r.abs() < 1e-10);
        }
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn linspace_hits_both_endpoints() {
        let pts = linspace(-1.0, 1.0, 5);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], -1.0);
        assert_relative_eq!(pts[2], 0.0, epsilon = 1e-15);
        assert_relative_eq!(pts[4], 1.0, epsilon = 1e-15);
    }
}
