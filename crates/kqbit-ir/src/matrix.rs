//! Dense kernels for leaf matrices.
//!
//! Leaves are small (usually 2x2, at most a few qubits wide), so these are
//! plain loops over `ndarray` storage rather than BLAS calls.

use ndarray::Array2;
use num_complex::Complex64;

/// Tolerance used by every approximate comparison on the tree.
pub const EPSILON: f64 = 1e-15;

/// Dense row-major complex matrix stored in a leaf.
pub type Matrix = Array2<Complex64>;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Returns the `dim x dim` identity matrix.
pub fn identity(dim: usize) -> Matrix {
    Array2::from_shape_fn((dim, dim), |(r, c)| if r == c { ONE } else { ZERO })
}

/// Returns the `dim x dim` zero matrix.
pub fn zeros(dim: usize) -> Matrix {
    Array2::from_elem((dim, dim), ZERO)
}

/// Number of qubits a square matrix of power-of-two side acts on.
///
/// Returns `None` for non-square matrices, sides that are not a power of two,
/// and the 1x1 matrix (a leaf spans at least one qubit).
pub fn qubits_for(matrix: &Matrix) -> Option<u32> {
    let (rows, cols) = matrix.dim();
    if rows != cols || rows < 2 || !rows.is_power_of_two() {
        return None;
    }
    Some(rows.trailing_zeros())
}

/// Every entry lies within [`EPSILON`] of the identity.
pub fn is_identity(matrix: &Matrix) -> bool {
    matrix.indexed_iter().all(|((r, c), &value)| {
        let expected = if r == c { ONE } else { ZERO };
        (value - expected).norm() <= EPSILON
    })
}

/// Every entry lies within [`EPSILON`] of zero.
pub fn is_zero(matrix: &Matrix) -> bool {
    matrix.iter().all(|value| value.norm() <= EPSILON)
}

/// Same shape and entry-wise agreement within [`EPSILON`].
pub fn approx_eq(a: &Matrix, b: &Matrix) -> bool {
    a.dim() == b.dim() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() <= EPSILON)
}

/// Matrix product `a * b`.
///
/// Entries of `a` with magnitude at or below [`EPSILON`] are skipped, which
/// makes products of projectors and permutations cheap.
pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let (n, inner) = a.dim();
    let (inner_b, m) = b.dim();
    assert_eq!(
        inner, inner_b,
        "cannot multiply a {n}x{inner} matrix by a {inner_b}x{m} matrix"
    );

    let mut out = Array2::from_elem((n, m), ZERO);
    for i in 0..n {
        for k in 0..inner {
            let lhs = a[[i, k]];
            if lhs.norm() <= EPSILON {
                continue;
            }
            for j in 0..m {
                out[[i, j]] += lhs * b[[k, j]];
            }
        }
    }
    out
}

/// Entry-wise sum `a + b`.
pub fn add(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(
        a.dim(),
        b.dim(),
        "cannot add matrices of shapes {:?} and {:?}",
        a.dim(),
        b.dim()
    );
    a + b
}

/// Kronecker product `a ⊗ b`; `a` owns the most-significant index bits.
pub fn kron(a: &Matrix, b: &Matrix) -> Matrix {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(r, c)| {
        a[[r / br, c / bc]] * b[[r % br, c % bc]]
    })
}
