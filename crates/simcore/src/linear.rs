//! Small dense linear solves for the reduced root system.

use nalgebra::{DMatrix, DVector};

use crate::error::NumericalFailure;

/// Reciprocal condition number below which a system is rejected.
pub const MIN_RCOND: f64 = 1e-12;

/// Solves `a * x = b` with an LU decomposition.
///
/// Singular matrices and matrices whose singular-value ratio falls below
/// [`MIN_RCOND`] are reported as [`NumericalFailure`].
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, NumericalFailure> {
    let size = a.nrows();
    if a.ncols() != size {
        return Err(NumericalFailure::DimensionMismatch {
            quantity: "linear system columns",
            expected: size,
            actual: a.ncols(),
        });
    }
    if b.len() != size {
        return Err(NumericalFailure::DimensionMismatch {
            quantity: "linear system right-hand side",
            expected: size,
            actual: b.len(),
        });
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(NumericalFailure::NonFinite {
            quantity: "linear system entry",
            t: f64::NAN,
        });
    }

    let singular_values = a.singular_values();
    let max = singular_values.max();
    let min = singular_values.min();
    if max == 0.0 {
        return Err(NumericalFailure::Singular { size });
    }
    let rcond = min / max;
    if rcond < MIN_RCOND {
        return Err(NumericalFailure::IllConditioned { size, rcond });
    }

    a.clone()
        .lu()
        .solve(b)
        .ok_or(NumericalFailure::Singular { size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solves_well_posed_system() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x = solve_dense(&a, &b).unwrap();
        assert_relative_eq!(&a * &x, b, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_matrix_is_singular() {
        let a = DMatrix::zeros(3, 3);
        let b = DVector::from_element(3, 1.0);
        assert_eq!(solve_dense(&a, &b), Err(NumericalFailure::Singular { size: 3 }));
    }

    #[test]
    fn test_rank_deficient_is_rejected() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let b = DVector::from_vec(vec![1.0, 1.0]);
        assert!(matches!(
            solve_dense(&a, &b),
            Err(NumericalFailure::IllConditioned { size: 2, .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = DMatrix::identity(2, 2);
        let b = DVector::from_element(3, 1.0);
        assert!(matches!(
            solve_dense(&a, &b),
            Err(NumericalFailure::DimensionMismatch { expected: 2, actual: 3, .. })
        ));
    }
}
