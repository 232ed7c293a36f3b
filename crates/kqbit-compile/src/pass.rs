//! Pass trait and types for tree rewrites.

use serde::{Deserialize, Serialize};

use kqbit_ir::Node;

/// The kind of rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    /// Reshapes the tree without touching leaf matrices.
    Structural,
    /// Computes new leaf matrices or regroups factors.
    Algebraic,
}

/// A rewrite pass over an operator tree.
///
/// Passes consume the tree and return an equivalent one. They are total:
/// any well-formed input produces a well-formed output acting on the same
/// qubits.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Rewrite the tree.
    fn run(&self, tree: Node) -> Node;

    /// Check if this pass should run on the current tree.
    ///
    /// This can be overridden to skip passes that cannot change the tree.
    fn should_run(&self, _tree: &Node) -> bool {
        true
    }
}
