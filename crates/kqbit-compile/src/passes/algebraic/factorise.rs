//! Factorisation passes.

use kqbit_ir::{Node, NodeType, Operation};

use crate::pass::{Pass, PassKind};
use crate::passes::rebuild;

/// Distributes a product over aligned tensors.
///
/// `Product(Tensor(a0..ak), Tensor(b0..bk), ...)` becomes
/// `Tensor(Product(a0, b0, ...), ..., Product(ak, bk, ...))` when every
/// factor is a Tensor with the same number of children and the same qubit
/// count at each position. Other products are left untouched.
pub struct FactoriseTensor;

impl Pass for FactoriseTensor {
    fn name(&self) -> &'static str {
        "factorise_tensor"
    }

    fn kind(&self) -> PassKind {
        PassKind::Algebraic
    }

    fn run(&self, tree: Node) -> Node {
        factorise_tensor(tree)
    }

    fn should_run(&self, tree: &Node) -> bool {
        !tree.is_leaf()
    }
}

/// Pulls shared leading and trailing factors out of a sum of tensors.
///
/// `Sum(Tensor(p, a, s), Tensor(p, b, s))` becomes
/// `Tensor(p, Sum(a, b), s)`. Terms must share their positional shape, and the
/// sum is left alone when the terms agree at every position.
pub struct FactoriseSum;

impl Pass for FactoriseSum {
    fn name(&self) -> &'static str {
        "factorise_sum"
    }

    fn kind(&self) -> PassKind {
        PassKind::Algebraic
    }

    fn run(&self, tree: Node) -> Node {
        factorise_sum(tree)
    }

    fn should_run(&self, tree: &Node) -> bool {
        !tree.is_leaf()
    }
}

/// Turns products of aligned tensors into tensors of products, bottom-up.
pub fn factorise_tensor(tree: Node) -> Node {
    factorise_product(tree.map_children(factorise_tensor))
}

fn factorise_product(tree: Node) -> Node {
    match tree.into_operator() {
        Ok((Operation::Product, factors)) if has_uniform_tensor_shape(&factors) => {
            let arity = factors[0].children().len();
            let mut columns: Vec<Vec<Node>> = (0..arity)
                .map(|_| Vec::with_capacity(factors.len()))
                .collect();
            for tensor in factors {
                for (column, factor) in columns.iter_mut().zip(tensor.into_children()) {
                    // Splice nested products so each column stays flat.
                    if factor.node_type() == NodeType::Product {
                        column.extend(factor.into_children());
                    } else {
                        column.push(factor);
                    }
                }
            }
            Node::tensor_list(
                columns
                    .into_iter()
                    .map(|column| factorise_product(rebuild(Operation::Product, column)))
                    .collect(),
            )
        }
        Ok((op, children)) => Node::operation(op, children),
        Err(leaf) => leaf,
    }
}

/// Factors shared tensor prefixes and suffixes out of sums, bottom-up.
pub fn factorise_sum(tree: Node) -> Node {
    factorise_terms(tree.map_children(factorise_sum))
}

fn factorise_terms(tree: Node) -> Node {
    match tree.into_operator() {
        Ok((Operation::Sum, terms)) if terms.len() > 1 && has_uniform_tensor_shape(&terms) => {
            let arity = terms[0].children().len();
            let shared = |position: usize| {
                let first = &terms[0].children()[position];
                terms[1..]
                    .iter()
                    .all(|term| term.children()[position].approx_eq(first))
            };
            let prefix = (0..arity - 1).take_while(|&p| shared(p)).count();
            let suffix = (prefix + 1..arity).rev().take_while(|&p| shared(p)).count();
            let identical = prefix == arity - 1 && shared(arity - 1);
            if identical || (prefix == 0 && suffix == 0) {
                return Node::sum_list(terms);
            }

            let middle_end = arity - suffix;
            let mut outer = Vec::new();
            let mut tail = Vec::new();
            let mut middles = Vec::with_capacity(terms.len());
            for (index, term) in terms.into_iter().enumerate() {
                let mut factors = term.into_children();
                let trailing = factors.split_off(middle_end);
                let middle = factors.split_off(prefix);
                if index == 0 {
                    outer = factors;
                    tail = trailing;
                }
                middles.push(rebuild(Operation::Tensor, middle));
            }

            outer.push(Node::sum_list(middles));
            outer.extend(tail);
            Node::tensor_list(outer)
        }
        Ok((op, children)) => Node::operation(op, children),
        Err(leaf) => leaf,
    }
}

/// All nodes are Tensors with matching child count and per-position qubits.
pub(super) fn has_uniform_tensor_shape(nodes: &[Node]) -> bool {
    let Some(first) = nodes.first() else {
        return false;
    };
    nodes.iter().all(|node| {
        node.node_type() == NodeType::Tensor
            && node.children().len() == first.children().len()
            && node
                .children()
                .iter()
                .zip(first.children())
                .all(|(a, b)| a.num_qubits() == b.num_qubits())
    })
}
