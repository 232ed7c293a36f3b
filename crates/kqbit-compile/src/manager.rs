//! Pass manager for orchestrating tree rewrites.

use tracing::{debug, info, instrument};

use kqbit_ir::Node;

use crate::pass::Pass;
use crate::passes::{
    DEFAULT_MAX_FUSED_QUBITS, FactoriseSum, FactoriseTensor, FixedPoint, Flatten, ProductFusion,
    Simplify, SumFusion, TensorFusion,
};
use crate::report::PassReport;

/// Manages and executes a sequence of rewrite passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// The fixed optimization pipeline:
    /// flatten, simplify, factorise_tensor, product_fusion, sum_fusion,
    /// simplify, flatten.
    pub fn full() -> Self {
        let mut pm = Self::new();
        pm.add_pass(Flatten);
        pm.add_pass(Simplify);
        pm.add_pass(FactoriseTensor);
        pm.add_pass(ProductFusion);
        pm.add_pass(SumFusion);
        pm.add_pass(Simplify);
        pm.add_pass(Flatten);
        pm
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given tree.
    pub fn run(&self, tree: Node) -> Node {
        self.run_with_report(tree).0
    }

    /// Run all passes and collect per-pass node counts.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if a pass returns a tree that fails
    /// [`Node::validate`].
    #[instrument(skip(self, tree), fields(passes = self.passes.len()))]
    pub fn run_with_report(&self, tree: Node) -> (Node, PassReport) {
        let mut report = PassReport::start(tree.num_qubits(), tree.node_count(), tree.depth());
        info!(
            "Running pass manager with {} passes on {}-qubit tree ({} nodes)",
            self.passes.len(),
            tree.num_qubits(),
            report.initial_nodes
        );

        let mut tree = tree;
        for pass in &self.passes {
            if !pass.should_run(&tree) {
                debug!("Skipping pass: {}", pass.name());
                continue;
            }

            debug!("Running pass: {}", pass.name());
            let before = tree.node_count();
            tree = pass.run(tree);
            verify(pass.name(), &tree);
            let after = tree.node_count();
            debug!("Pass {} completed, nodes: {} -> {}", pass.name(), before, after);
            report.record(pass.name(), pass.kind(), before, after);
        }

        report.finish(tree.node_count(), tree.depth());
        info!(
            "Pass manager completed, final depth: {}, nodes: {}",
            report.final_depth, report.final_nodes
        );

        (tree, report)
    }

    /// Names of the passes, in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

fn verify(pass_name: &str, tree: &Node) {
    if cfg!(debug_assertions) {
        if let Err(err) = tree.validate() {
            panic!("pass '{pass_name}' produced a malformed tree: {err}");
        }
    }
}

/// Builder for creating pass managers with preset configurations.
pub struct PassManagerBuilder {
    /// Optimization level (0-3).
    optimization_level: u8,
    /// Widest leaf tensor fusion may produce.
    max_fused_qubits: u32,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            optimization_level: 2,
            max_fused_qubits: DEFAULT_MAX_FUSED_QUBITS,
        }
    }

    /// Set the optimization level.
    ///
    /// - Level 0: No passes
    /// - Level 1: Structural cleanup (flatten, simplify)
    /// - Level 2: The fixed pipeline of [`PassManager::full`] (default)
    /// - Level 3: Level 2 plus sum factorisation and tensor fusion, repeated
    ///   in a [`FixedPoint`] loop until the tree stops changing
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(3);
        self
    }

    /// Set the widest leaf tensor fusion may produce at level 3.
    #[must_use]
    pub fn with_max_fused_qubits(mut self, max_qubits: u32) -> Self {
        self.max_fused_qubits = max_qubits;
        self
    }

    /// Build the pass manager.
    pub fn build(self) -> PassManager {
        match self.optimization_level {
            0 => PassManager::new(),
            1 => {
                let mut pm = PassManager::new();
                pm.add_pass(Flatten);
                pm.add_pass(Simplify);
                pm
            }
            2 => PassManager::full(),
            _ => {
                let mut pm = PassManager::new();
                pm.add_pass(Flatten);
                pm.add_pass(Simplify);
                pm.add_pass(
                    FixedPoint::default()
                        .with_pass(FactoriseTensor)
                        .with_pass(FactoriseSum)
                        .with_pass(TensorFusion::new(self.max_fused_qubits))
                        .with_pass(SumFusion)
                        .with_pass(ProductFusion)
                        .with_pass(Simplify)
                        .with_pass(Flatten),
                );
                pm
            }
        }
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kqbit_ir::{CircuitTree, Gate, identity_tree};

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);

        let tree = CircuitTree::bell().into_root();
        let out = pm.run(tree.clone());
        assert!(out.approx_eq(&tree));
    }

    #[test]
    fn test_full_pipeline_order() {
        let pm = PassManager::full();
        assert_eq!(
            pm.pass_names(),
            vec![
                "flatten",
                "simplify",
                "factorise_tensor",
                "product_fusion",
                "sum_fusion",
                "simplify",
                "flatten"
            ]
        );
    }

    #[test]
    fn test_pass_manager_builder_levels() {
        assert!(PassManagerBuilder::new().with_optimization_level(0).build().is_empty());
        assert_eq!(PassManagerBuilder::new().with_optimization_level(1).build().len(), 2);
        assert_eq!(
            PassManagerBuilder::new().build().pass_names(),
            PassManager::full().pass_names()
        );
        let level3 = PassManagerBuilder::new().with_optimization_level(7).build();
        assert_eq!(level3.pass_names(), vec!["flatten", "simplify", "fixed_point"]);
    }

    #[test]
    fn test_builder_default_fusion_width() {
        let builder = PassManagerBuilder::default();
        assert_eq!(builder.max_fused_qubits, DEFAULT_MAX_FUSED_QUBITS);
        assert_eq!(builder.with_max_fused_qubits(4).max_fused_qubits, 4);
    }

    #[test]
    fn test_single_gate_optimizes_to_leaf() {
        let mut tree = CircuitTree::new(1);
        tree.h(0);
        let out = PassManager::full().run(tree.into_root());
        assert!(out.approx_eq(&Gate::H.leaf()));
    }

    #[test]
    fn test_report_skips_leaf_passes() {
        let (out, report) = PassManager::full().run_with_report(Gate::X.leaf());
        assert!(out.is_leaf());
        assert!(report.passes.is_empty());
        assert_eq!(report.initial_nodes, 1);
        assert_eq!(report.final_nodes, 1);
    }

    #[test]
    fn test_report_records_every_pass() {
        let (_, report) = PassManager::full().run_with_report(identity_tree(4));
        assert_eq!(report.num_qubits, 4);
        assert_eq!(report.passes.len(), 7);
        assert_eq!(report.passes[0].nodes_before, report.initial_nodes);
        assert_eq!(report.passes[6].nodes_after, report.final_nodes);
    }
}
