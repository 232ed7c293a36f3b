//! Repeating a pass sequence until the tree settles.

use tracing::debug;

use kqbit_ir::Node;

use crate::pass::{Pass, PassKind};

/// Round limit used by [`FixedPoint::default`].
pub const DEFAULT_MAX_ROUNDS: usize = 16;

/// Runs a list of passes in rounds until a round leaves the tree unchanged.
///
/// One sweep of the algebraic passes often exposes new work for an earlier
/// pass (tensor fusion creates leaves that product fusion can multiply), so
/// the rounds continue until the output matches the input or `max_rounds`
/// is reached.
pub struct FixedPoint {
    passes: Vec<Box<dyn Pass>>,
    max_rounds: usize,
}

impl FixedPoint {
    /// An empty loop that runs at most `max_rounds` rounds.
    pub fn new(max_rounds: usize) -> Self {
        Self {
            passes: Vec::new(),
            max_rounds: max_rounds.max(1),
        }
    }

    /// Append a pass to each round.
    #[must_use]
    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Get the round limit.
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Names of the passes in one round.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    fn round(&self, tree: Node) -> Node {
        self.passes.iter().fold(tree, |tree, pass| {
            if pass.should_run(&tree) {
                pass.run(tree)
            } else {
                tree
            }
        })
    }
}

impl Default for FixedPoint {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUNDS)
    }
}

impl Pass for FixedPoint {
    fn name(&self) -> &'static str {
        "fixed_point"
    }

    fn kind(&self) -> PassKind {
        PassKind::Algebraic
    }

    fn run(&self, tree: Node) -> Node {
        let mut tree = tree;
        for round in 1..=self.max_rounds {
            let next = self.round(tree.clone());
            let settled = next.approx_eq(&tree);
            debug!(
                "Round {}: nodes {} -> {}",
                round,
                tree.node_count(),
                next.node_count()
            );
            tree = next;
            if settled {
                break;
            }
        }
        tree
    }

    fn should_run(&self, tree: &Node) -> bool {
        !self.passes.is_empty() && !tree.is_leaf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{Flatten, ProductFusion, Simplify, TensorFusion};
    use kqbit_ir::Gate;

    #[test]
    fn test_empty_loop_is_skipped() {
        let pass = FixedPoint::default();
        assert_eq!(pass.max_rounds(), DEFAULT_MAX_ROUNDS);
        assert!(!pass.should_run(&Node::tensor(Gate::H.leaf(), Gate::X.leaf())));
    }

    #[test]
    fn test_rounds_reach_work_exposed_by_later_passes() {
        // product(tensor(H, X), tensor(Z, H)): tensor fusion runs after
        // product fusion in a round, so the 4x4 product needs a second round.
        let tree = Node::product(
            Node::tensor(Gate::H.leaf(), Gate::X.leaf()),
            Node::tensor(Gate::Z.leaf(), Gate::H.leaf()),
        );
        let expected = kqbit_ir::matrix::multiply(
            &kqbit_ir::matrix::kron(&Gate::H.matrix(), &Gate::X.matrix()),
            &kqbit_ir::matrix::kron(&Gate::Z.matrix(), &Gate::H.matrix()),
        );

        let single = FixedPoint::new(1)
            .with_pass(ProductFusion)
            .with_pass(TensorFusion::new(2));
        let once = single.run(tree.clone());
        assert_eq!(once.node_type(), kqbit_ir::NodeType::Product);
        assert_eq!(once.node_count(), 3);

        let looped = FixedPoint::default()
            .with_pass(ProductFusion)
            .with_pass(TensorFusion::new(2))
            .with_pass(Simplify)
            .with_pass(Flatten);
        let out = looped.run(tree);
        assert!(out.approx_eq(&Node::leaf(expected)));
    }

    #[test]
    fn test_settled_tree_is_returned_unchanged() {
        let tree = Node::tensor(Gate::H.leaf(), Gate::X.leaf());
        let pass = FixedPoint::default().with_pass(ProductFusion);
        assert!(pass.run(tree.clone()).approx_eq(&tree));
    }
}
