//! Leaf fusion passes.

use kqbit_ir::matrix::{self, Matrix};
use kqbit_ir::{Node, Operation};

use crate::pass::{Pass, PassKind};
use crate::passes::rebuild;

/// Widest leaf [`TensorFusion`] produces unless configured otherwise.
pub const DEFAULT_MAX_FUSED_QUBITS: u32 = 2;

/// Multiplies adjacent leaves of a product into one leaf.
pub struct ProductFusion;

impl Pass for ProductFusion {
    fn name(&self) -> &'static str {
        "product_fusion"
    }

    fn kind(&self) -> PassKind {
        PassKind::Algebraic
    }

    fn run(&self, tree: Node) -> Node {
        product_fusion(tree)
    }

    fn should_run(&self, tree: &Node) -> bool {
        !tree.is_leaf()
    }
}

/// Adds adjacent leaves of a sum into one leaf.
pub struct SumFusion;

impl Pass for SumFusion {
    fn name(&self) -> &'static str {
        "sum_fusion"
    }

    fn kind(&self) -> PassKind {
        PassKind::Algebraic
    }

    fn run(&self, tree: Node) -> Node {
        sum_fusion(tree)
    }

    fn should_run(&self, tree: &Node) -> bool {
        !tree.is_leaf()
    }
}

/// Replaces adjacent tensor leaves by their Kronecker product.
///
/// Only pairs whose combined width stays within `max_qubits` are merged, so
/// leaves never grow past `2^max_qubits` on a side.
pub struct TensorFusion {
    max_qubits: u32,
}

impl TensorFusion {
    /// Create a tensor fusion pass producing leaves of at most `max_qubits`.
    pub fn new(max_qubits: u32) -> Self {
        Self {
            max_qubits: max_qubits.max(1),
        }
    }

    /// Get the fused width limit.
    pub fn max_qubits(&self) -> u32 {
        self.max_qubits
    }
}

impl Default for TensorFusion {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FUSED_QUBITS)
    }
}

impl Pass for TensorFusion {
    fn name(&self) -> &'static str {
        "tensor_fusion"
    }

    fn kind(&self) -> PassKind {
        PassKind::Algebraic
    }

    fn run(&self, tree: Node) -> Node {
        tensor_fusion(tree, self.max_qubits)
    }

    fn should_run(&self, tree: &Node) -> bool {
        self.max_qubits >= 2 && !tree.is_leaf()
    }
}

/// Fuses adjacent product leaves, bottom-up.
pub fn product_fusion(tree: Node) -> Node {
    match tree.map_children(product_fusion).into_operator() {
        Ok((Operation::Product, children)) => rebuild(
            Operation::Product,
            fuse_adjacent_leaves(children, same_width, matrix::multiply),
        ),
        Ok((op, children)) => rebuild(op, children),
        Err(leaf) => leaf,
    }
}

/// Fuses adjacent sum leaves, bottom-up.
pub fn sum_fusion(tree: Node) -> Node {
    match tree.map_children(sum_fusion).into_operator() {
        Ok((Operation::Sum, children)) => rebuild(
            Operation::Sum,
            fuse_adjacent_leaves(children, same_width, matrix::add),
        ),
        Ok((op, children)) => rebuild(op, children),
        Err(leaf) => leaf,
    }
}

/// Fuses adjacent tensor leaves up to `max_qubits` wide, bottom-up.
pub fn tensor_fusion(tree: Node, max_qubits: u32) -> Node {
    match tree
        .map_children(|child| tensor_fusion(child, max_qubits))
        .into_operator()
    {
        Ok((Operation::Tensor, children)) => rebuild(
            Operation::Tensor,
            fuse_adjacent_leaves(
                children,
                |a, b| a.num_qubits() + b.num_qubits() <= max_qubits,
                matrix::kron,
            ),
        ),
        Ok((op, children)) => rebuild(op, children),
        Err(leaf) => leaf,
    }
}

fn same_width(a: &Node, b: &Node) -> bool {
    a.num_qubits() == b.num_qubits()
}

/// Merges neighbouring leaves left to right until no accepted pair remains.
///
/// A merged leaf is immediately tried against its next neighbour.
fn fuse_adjacent_leaves(
    mut children: Vec<Node>,
    accept: impl Fn(&Node, &Node) -> bool,
    combine: impl Fn(&Matrix, &Matrix) -> Matrix,
) -> Vec<Node> {
    let mut i = 0;
    while i + 1 < children.len() {
        let (left, right) = (&children[i], &children[i + 1]);
        let fused = match (left.as_leaf(), right.as_leaf()) {
            (Some(a), Some(b)) if accept(left, right) => Some(combine(a, b)),
            _ => None,
        };
        match fused {
            Some(matrix) => {
                children[i] = Node::leaf(matrix);
                children.remove(i + 1);
            }
            None => i += 1,
        }
    }
    children
}
