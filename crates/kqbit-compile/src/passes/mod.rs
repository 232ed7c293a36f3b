//! Built-in rewrite passes.
//!
//! Passes are organized into two categories:
//! - [`structural`]: passes that only reshape the tree
//! - [`algebraic`]: passes that regroup factors or compute new leaves
//!
//! [`FixedPoint`] repeats a list of passes until the tree stops changing.

pub mod algebraic;
pub mod fixed_point;
pub mod structural;

pub use algebraic::{
    DEFAULT_MAX_FUSED_QUBITS, FactoriseSum, FactoriseTensor, ProductFusion, SumFusion,
    TensorFusion, factorise_sum, factorise_tensor, product_fusion, sum_fusion, tensor_fusion,
};
pub use fixed_point::{DEFAULT_MAX_ROUNDS, FixedPoint};
pub use structural::{Flatten, Simplify, flatten, simplify};

use kqbit_ir::{Node, Operation};

/// Rebuilds an operator node, collapsing it to its only child when one remains.
pub(crate) fn rebuild(op: Operation, mut children: Vec<Node>) -> Node {
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return only;
        }
    }
    Node::operation(op, children)
}
