//! Structural passes.

use kqbit_ir::{Node, NodeType, Operation};

use super::rebuild;
use crate::pass::{Pass, PassKind};

/// Splices children into a parent of the same variant.
///
/// `Product(a, Product(b, c))` becomes `Product(a, b, c)`, and likewise for
/// Sum and Tensor. Afterwards no node has a direct child of its own variant.
pub struct Flatten;

impl Pass for Flatten {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn kind(&self) -> PassKind {
        PassKind::Structural
    }

    fn run(&self, tree: Node) -> Node {
        flatten(tree)
    }

    fn should_run(&self, tree: &Node) -> bool {
        !tree.is_leaf()
    }
}

/// Removes identity factors and zero terms.
///
/// - Product: a zero child replaces the whole product; identity children are
///   dropped while more than one child remains.
/// - Sum: zero children are dropped while more than one child remains.
/// - Any operator left with a single child collapses to it.
pub struct Simplify;

impl Pass for Simplify {
    fn name(&self) -> &'static str {
        "simplify"
    }

    fn kind(&self) -> PassKind {
        PassKind::Structural
    }

    fn run(&self, tree: Node) -> Node {
        simplify(tree)
    }

    fn should_run(&self, tree: &Node) -> bool {
        !tree.is_leaf()
    }
}

/// Flattens nested operators of the same variant, bottom-up.
pub fn flatten(tree: Node) -> Node {
    match tree.map_children(flatten).into_operator() {
        Ok((op, children)) => {
            let own = NodeType::from(op);
            let mut spliced = Vec::with_capacity(children.len());
            for child in children {
                if child.node_type() == own {
                    spliced.extend(child.into_children());
                } else {
                    spliced.push(child);
                }
            }
            Node::operation(op, spliced)
        }
        Err(leaf) => leaf,
    }
}

/// Drops identity factors and zero terms, bottom-up.
pub fn simplify(tree: Node) -> Node {
    match tree.map_children(simplify).into_operator() {
        Ok((Operation::Product, mut children)) => {
            if let Some(zero) = children.iter().position(Node::is_zero) {
                return children.swap_remove(zero);
            }
            rebuild(
                Operation::Product,
                drop_while_several(children, Node::is_identity),
            )
        }
        Ok((Operation::Sum, children)) => {
            rebuild(Operation::Sum, drop_while_several(children, Node::is_zero))
        }
        Ok((op, children)) => rebuild(op, children),
        Err(leaf) => leaf,
    }
}

/// Removes children matching `redundant`, never going below one child.
fn drop_while_several(children: Vec<Node>, redundant: impl Fn(&Node) -> bool) -> Vec<Node> {
    let mut remaining = children.len();
    let mut kept = Vec::with_capacity(remaining);
    for child in children {
        if remaining > 1 && redundant(&child) {
            remaining -= 1;
        } else {
            kept.push(child);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use kqbit_ir::{Gate, identity_tree, matrix};

    fn zero() -> Node {
        Node::leaf(matrix::zeros(2))
    }

    #[test]
    fn test_flatten_splices_same_variant() {
        let tree = Node::product(
            Gate::X.leaf(),
            Node::product(Gate::Y.leaf(), Node::product(Gate::Z.leaf(), Gate::H.leaf())),
        );
        let flat = flatten(tree);
        assert_eq!(flat.node_type(), NodeType::Product);
        assert_eq!(flat.children().len(), 4);
        assert!(flat.children().iter().all(Node::is_leaf));
    }

    #[test]
    fn test_flatten_keeps_mixed_variants() {
        let tree = Node::product(
            Node::tensor(Gate::X.leaf(), Node::tensor(Gate::Y.leaf(), Gate::Z.leaf())),
            identity_tree(3),
        );
        let flat = flatten(tree);
        assert_eq!(flat.children().len(), 2);
        assert_eq!(flat.children()[0].children().len(), 3);
        assert_eq!(flat.children()[1].children().len(), 3);
    }

    #[test]
    fn test_simplify_drops_identities() {
        let tree = Node::product_list(vec![Gate::I.leaf(), Gate::X.leaf(), Gate::I.leaf()]);
        let simple = simplify(tree);
        assert!(simple.approx_eq(&Gate::X.leaf()));
    }

    #[test]
    fn test_simplify_keeps_one_identity() {
        let simple = simplify(Node::product(Gate::I.leaf(), Gate::I.leaf()));
        assert!(simple.is_leaf());
        assert!(simple.is_identity());
    }

    #[test]
    fn test_simplify_zero_product() {
        let tree = Node::product_list(vec![Gate::X.leaf(), zero(), Gate::H.leaf()]);
        let simple = simplify(tree);
        assert!(simple.is_leaf());
        assert!(simple.is_zero());
    }

    #[test]
    fn test_simplify_sum_drops_zero_terms() {
        let tree = Node::sum_list(vec![zero(), Gate::X.leaf(), zero()]);
        assert!(simplify(tree).approx_eq(&Gate::X.leaf()));

        let all_zero = simplify(Node::sum(zero(), zero()));
        assert!(all_zero.is_leaf());
        assert!(all_zero.is_zero());
    }

    #[test]
    fn test_simplify_sum_keeps_identity_terms() {
        let tree = Node::sum(Gate::I.leaf(), Gate::I.leaf());
        let simple = simplify(tree);
        assert_eq!(simple.node_type(), NodeType::Sum);
        assert_eq!(simple.children().len(), 2);
    }

    #[test]
    fn test_simplify_collapses_identity_layers() {
        // Product(Tensor(I, X), Tensor(I, I)) loses the identity layer.
        let tree = Node::product(
            Node::tensor(Gate::I.leaf(), Gate::X.leaf()),
            identity_tree(2),
        );
        let simple = simplify(tree);
        assert_eq!(simple.node_type(), NodeType::Tensor);
        assert!(simple.children()[1].approx_eq(&Gate::X.leaf()));
    }

    #[test]
    fn test_structural_passes_skip_leaves() {
        assert!(!Flatten.should_run(&Gate::H.leaf()));
        assert!(Simplify.should_run(&identity_tree(2)));
    }
}
