//! Mathematical utilities for frame element calculations

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

use crate::error::{SolverError, SolverResult};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 12x12 matrix for member stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for member forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// Members longer than this contribute zero stiffness
pub const EXTREME_LENGTH: f64 = 1e6;
/// Cross product magnitude below which a reference axis is rejected
pub const BASIS_TOLERANCE: f64 = 1e-12;
/// Floor for rotational inertia terms in kg·m²
pub const MIN_ROTATIONAL_INERTIA: f64 = 1e-6;

/// Check that a member length is usable for element matrices
pub fn validate_length(length: f64) -> SolverResult<()> {
    if !length.is_finite() {
        return Err(SolverError::InvalidGeometry(format!(
            "member length is not finite ({length})"
        )));
    }
    if length <= 0.0 {
        return Err(SolverError::InvalidGeometry(format!(
            "member length must be positive ({length})"
        )));
    }
    Ok(())
}

/// Compute the local axes of a member as the rows of a direction cosine matrix.
///
/// The reference vector used to fix the member's roll is the global axis
/// along which the member has its smallest direction cosine. If that yields
/// a degenerate cross product another global axis is tried, then global Z.
pub fn member_local_axes(i_node: &[f64; 3], j_node: &[f64; 3]) -> SolverResult<Mat3> {
    let d = Vec3::new(j_node[0] - i_node[0], j_node[1] - i_node[1], j_node[2] - i_node[2]);
    let length = d.norm();
    validate_length(length)?;

    let x = d / length;

    let min_idx = x.iamin();
    let fallback_idx = if min_idx == 0 { 1 } else { 0 };

    let z = [min_idx, fallback_idx, 2]
        .iter()
        .map(|&axis| x.cross(&Vec3::ith(axis, 1.0)))
        .find(|z| z.norm() >= BASIS_TOLERANCE)
        .ok_or(SolverError::DegenerateBasis)?
        .normalize();

    let y = z.cross(&x).normalize();

    #[rustfmt::skip]
    let r = Mat3::new(
        x[0], x[1], x[2],
        y[0], y[1], y[2],
        z[0], z[1], z[2],
    );
    Ok(r)
}

/// Compute the transformation matrix for a 3D frame element
///
/// # Arguments
/// * `i_node` - Start point coordinates [X, Y, Z]
/// * `j_node` - End point coordinates [X, Y, Z]
///
/// # Returns
/// 12x12 block-diagonal matrix mapping global to local DOFs, so that
/// `d_local = T * d_global` and `K_global = Tᵀ * k_local * T`
pub fn member_transformation_matrix(i_node: &[f64; 3], j_node: &[f64; 3]) -> SolverResult<Mat12> {
    let r = member_local_axes(i_node, j_node)?;

    let mut t = Mat12::zeros();
    for block in 0..4 {
        t.fixed_view_mut::<3, 3>(block * 3, block * 3).copy_from(&r);
    }
    Ok(t)
}

/// Compute the local stiffness matrix for a 3D frame element
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `g` - Shear modulus
/// * `a` - Cross-sectional area
/// * `iy` - Moment of inertia about local y-axis
/// * `iz` - Moment of inertia about local z-axis
/// * `j` - Torsional constant
/// * `length` - Member length
///
/// # Returns
/// 12x12 local stiffness matrix, all zeros beyond [`EXTREME_LENGTH`]
pub fn member_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    iy: f64,
    iz: f64,
    j: f64,
    length: f64,
) -> SolverResult<Mat12> {
    validate_length(length)?;
    if length > EXTREME_LENGTH {
        return Ok(Mat12::zeros());
    }

    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * a / l;
    let gj_l = g * j / l;

    let eiy_l3 = e * iy / l3;
    let eiy_l2 = e * iy / l2;
    let eiy_l = e * iy / l;

    let eiz_l3 = e * iz / l3;
    let eiz_l2 = e * iz / l2;
    let eiz_l = e * iz / l;

    #[rustfmt::skip]
    let data = [
        // Row 0: axial at i
        ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,          -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,
        // Row 1: shear Fy at i
        0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           6.0*eiz_l2,   0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           6.0*eiz_l2,
        // Row 2: shear Fz at i
        0.0,       0.0,          12.0*eiy_l3,   0.0,    -6.0*eiy_l2,   0.0,          0.0,       0.0,          -12.0*eiy_l3,  0.0,    -6.0*eiy_l2,   0.0,
        // Row 3: torsion at i
        0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,          0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,
        // Row 4: moment My at i
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    4.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    2.0*eiy_l,     0.0,
        // Row 5: moment Mz at i
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           4.0*eiz_l,    0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           2.0*eiz_l,
        // Row 6: axial at j
        -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,          ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,
        // Row 7: shear Fy at j
        0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           -6.0*eiz_l2,  0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           -6.0*eiz_l2,
        // Row 8: shear Fz at j
        0.0,       0.0,          -12.0*eiy_l3,  0.0,    6.0*eiy_l2,    0.0,          0.0,       0.0,          12.0*eiy_l3,   0.0,    6.0*eiy_l2,    0.0,
        // Row 9: torsion at j
        0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,          0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,
        // Row 10: moment My at j
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    2.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    4.0*eiy_l,     0.0,
        // Row 11: moment Mz at j
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           2.0*eiz_l,    0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           4.0*eiz_l,
    ];

    Ok(Mat12::from_row_slice(&data))
}

/// Compute the lumped mass matrix for a 3D frame element
///
/// Half of the member mass is lumped at each end on the translational DOFs.
/// Each end also receives a rotational inertia of `(m/2)·L²/12`, floored at
/// [`MIN_ROTATIONAL_INERTIA`].
pub fn member_lumped_mass(density: f64, a: f64, length: f64) -> Mat12 {
    let half = 0.5 * density * a * length;
    let rot = (half * length * length / 12.0).max(MIN_ROTATIONAL_INERTIA);

    let diag = Vec12::from_fn(|i, _| if i % 6 < 3 { half } else { rot });
    Mat12::from_diagonal(&diag)
}

/// Outcome of a dense linear solve
#[derive(Debug, Clone)]
pub enum LinearSolve {
    /// Solved directly by LU decomposition
    Exact(Vec),
    /// Matrix was singular; minimum-norm least-squares solution
    LeastSquares(Vec),
    /// No solution could be computed
    Singular,
}

impl LinearSolve {
    /// The solution vector, if any
    pub fn solution(self) -> Option<Vec> {
        match self {
            LinearSolve::Exact(x) | LinearSolve::LeastSquares(x) => Some(x),
            LinearSolve::Singular => None,
        }
    }

    /// Whether the direct solve succeeded
    pub fn is_exact(&self) -> bool {
        matches!(self, LinearSolve::Exact(_))
    }
}

/// Solve a linear system using LU decomposition
pub fn solve_linear_system(a: &Mat, b: &Vec) -> Option<Vec> {
    a.clone().lu().solve(b)
}

/// Singular value cutoff used for rank and pseudo-inverse: `σ_max · n · ε`
fn singular_value_tolerance(singular_values: &Vec, n: usize) -> f64 {
    singular_values.max() * n as f64 * f64::EPSILON
}

/// Numerical rank of a square matrix
pub fn numerical_rank(a: &Mat) -> usize {
    if a.is_empty() {
        return 0;
    }
    let svd = a.clone().svd(false, false);
    let tol = singular_value_tolerance(&svd.singular_values, a.nrows().max(a.ncols()));
    svd.rank(tol)
}

/// Minimum-norm least-squares solution using the SVD pseudo-inverse
pub fn solve_least_squares(a: &Mat, b: &Vec) -> Option<Vec> {
    if a.is_empty() {
        return Some(Vec::zeros(a.ncols()));
    }
    let svd = a.clone().svd(true, true);
    let tol = singular_value_tolerance(&svd.singular_values, a.nrows().max(a.ncols()));
    svd.solve(b, tol).ok()
}

/// Solve directly, falling back to least squares when the matrix is singular
pub fn solve_with_fallback(a: &Mat, b: &Vec) -> LinearSolve {
    if let Some(x) = solve_linear_system(a, b).filter(|x| x.iter().all(|v| v.is_finite())) {
        return LinearSolve::Exact(x);
    }
    match solve_least_squares(a, b) {
        Some(x) => LinearSolve::LeastSquares(x),
        None => LinearSolve::Singular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(t: &Mat12) {
        let r = t.fixed_view::<3, 3>(0, 0).into_owned();
        let identity = r * r.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[(i, j)], expected, epsilon = 1e-12);
            }
        }
        // Right-handed basis
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transformation_matrix_horizontal() {
        let t = member_transformation_matrix(&[0.0, 0.0, 0.0], &[10.0, 0.0, 0.0]).unwrap();

        // local x = global X, local y = global Y, local z = global Z
        assert_relative_eq!(t[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t[(1, 1)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t[(9, 9)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transformation_matrix_vertical() {
        let t = member_transformation_matrix(&[0.0, 0.0, 0.0], &[0.0, 10.0, 0.0]).unwrap();

        assert_relative_eq!(t[(0, 1)], 1.0, epsilon = 1e-12);  // local x = global Y
        assert_relative_eq!(t[(1, 0)], 1.0, epsilon = 1e-12);  // local y = global X
        assert_relative_eq!(t[(2, 2)], -1.0, epsilon = 1e-12); // local z = -global Z
        assert_orthonormal(&t);
    }

    #[test]
    fn test_transformation_matrix_skewed() {
        let t = member_transformation_matrix(&[1.0, -2.0, 0.5], &[4.0, 2.0, 3.0]).unwrap();
        assert_orthonormal(&t);

        let axis = Vec3::new(3.0, 4.0, 2.5).normalize();
        assert_relative_eq!(t[(6, 6)], axis[0], epsilon = 1e-12);
        assert_relative_eq!(t[(6, 7)], axis[1], epsilon = 1e-12);
        assert_relative_eq!(t[(6, 8)], axis[2], epsilon = 1e-12);
    }

    #[test]
    fn test_transformation_rejects_zero_length() {
        let err = member_transformation_matrix(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]);
        assert!(matches!(err, Err(SolverError::InvalidGeometry(_))));

        let err = member_transformation_matrix(&[0.0, 0.0, 0.0], &[f64::NAN, 0.0, 0.0]);
        assert!(matches!(err, Err(SolverError::InvalidGeometry(_))));
    }

    #[test]
    fn test_local_stiffness_symmetry() {
        for &(e, a, iy, iz, j, l) in &[
            (200e9, 0.01, 1e-4, 2e-4, 1e-5, 10.0),
            (12e9, 0.01, 8.3e-6, 8.3e-6, 2.5e-6, 0.3),
            (1e3, 1e-4, 1e-8, 3e-8, 1e-9, 2.0),
        ] {
            let k = member_local_stiffness(e, 0.4 * e, a, iy, iz, j, l).unwrap();
            assert_relative_eq!(k[(0, 0)], a * e / l, max_relative = 1e-12);
            for i in 0..12 {
                for jj in 0..12 {
                    assert_relative_eq!(k[(i, jj)], k[(jj, i)], max_relative = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_local_stiffness_extreme_length() {
        let k = member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 1e-4, 1e-5, 2e6).unwrap();
        assert_eq!(k, Mat12::zeros());
    }

    #[test]
    fn test_local_stiffness_invalid_length() {
        for l in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let res = member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 1e-4, 1e-5, l);
            assert!(matches!(res, Err(SolverError::InvalidGeometry(_))));
        }
    }

    #[test]
    fn test_lumped_mass() {
        let m = member_lumped_mass(500.0, 0.01, 2.0);
        // 10 kg member, 5 kg per end
        assert_relative_eq!(m[(0, 0)], 5.0, epsilon = 1e-12);
        assert_relative_eq!(m[(8, 8)], 5.0, epsilon = 1e-12);
        assert_relative_eq!(m[(3, 3)], 5.0 * 4.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(m[(11, 11)], 5.0 * 4.0 / 12.0, epsilon = 1e-12);
        assert_eq!(m[(0, 1)], 0.0);

        let tiny = member_lumped_mass(0.0, 0.01, 2.0);
        assert_eq!(tiny[(0, 0)], 0.0);
        assert_eq!(tiny[(4, 4)], MIN_ROTATIONAL_INERTIA);
    }

    #[test]
    fn test_solve_with_fallback() {
        let a = Mat::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
        let b = Vec::from_row_slice(&[2.0, 8.0]);
        match solve_with_fallback(&a, &b) {
            LinearSolve::Exact(x) => {
                assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
                assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
            }
            other => panic!("expected exact solve, got {other:?}"),
        }

        // Singular: minimum-norm solution ignores the null space
        let a = Mat::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 0.0]);
        let res = solve_with_fallback(&a, &b);
        assert!(!res.is_exact());
        let x = res.solution().unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_numerical_rank() {
        let a = Mat::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0]);
        assert_eq!(numerical_rank(&a), 2);
        assert_eq!(numerical_rank(&Mat::identity(4, 4)), 4);
        assert_eq!(numerical_rank(&Mat::zeros(6, 6)), 0);
    }
}
