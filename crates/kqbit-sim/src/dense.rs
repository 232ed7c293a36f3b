//! Dense reference evaluation.
//!
//! [`materialize`] builds the full `2^n x 2^n` matrix of a tree. It costs
//! O(4^n) memory and exists to cross-check the strided evaluator in tests and
//! benches.

use ndarray::Array1;
use num_complex::Complex64;

use kqbit_ir::matrix::{self, Matrix};
use kqbit_ir::{Node, NodeKind};

use crate::error::{SimError, SimResult};

/// The full matrix of `tree`.
pub fn materialize(tree: &Node) -> Matrix {
    match tree.kind() {
        NodeKind::Leaf(leaf) => leaf.clone(),
        NodeKind::Sum(terms) => terms
            .iter()
            .fold(matrix::zeros(tree.dim()), |acc, term| acc + materialize(term)),
        NodeKind::Product(factors) => factors
            .iter()
            .fold(matrix::identity(tree.dim()), |acc, factor| {
                acc.dot(&materialize(factor))
            }),
        NodeKind::Tensor(factors) => factors
            .iter()
            .fold(matrix::identity(1), |acc, factor| {
                matrix::kron(&acc, &materialize(factor))
            }),
    }
}

/// `materialize(tree) · state`.
pub fn apply_dense(tree: &Node, state: &[Complex64]) -> SimResult<Vec<Complex64>> {
    if state.len() != tree.dim() {
        return Err(SimError::StateLengthMismatch {
            expected: tree.dim(),
            got: state.len(),
        });
    }
    let vector = Array1::from(state.to_vec());
    Ok(materialize(tree).dot(&vector).to_vec())
}
