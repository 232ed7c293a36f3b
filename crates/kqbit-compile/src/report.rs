//! Per-pass statistics collected by the [`PassManager`](crate::PassManager).
//!
//! A [`PassReport`] records the tree size before and after every pass that
//! ran. It serializes to JSON for benchmark logs.
//!
//! ```
//! use kqbit_compile::PassManager;
//! use kqbit_ir::CircuitTree;
//!
//! let (_, report) = PassManager::full().run_with_report(CircuitTree::ghz(3).into_root());
//! assert!(report.final_nodes < report.initial_nodes);
//! assert!(report.to_json().unwrap().contains("factorise_tensor"));
//! ```

use serde::{Deserialize, Serialize};

use crate::pass::PassKind;

/// Statistics for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
    /// Name of the pass.
    pub name: String,
    /// Kind of the pass.
    pub kind: PassKind,
    /// Tree size before the pass.
    pub nodes_before: usize,
    /// Tree size after the pass.
    pub nodes_after: usize,
}

/// Statistics for a full pass manager run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Width of the tree.
    pub num_qubits: u32,
    /// Node count of the input.
    pub initial_nodes: usize,
    /// Depth of the input.
    pub initial_depth: usize,
    /// Node count of the output.
    pub final_nodes: usize,
    /// Depth of the output.
    pub final_depth: usize,
    /// Passes that ran, in order. Skipped passes are absent.
    pub passes: Vec<PassRecord>,
}

impl PassReport {
    pub(crate) fn start(num_qubits: u32, nodes: usize, depth: usize) -> Self {
        Self {
            num_qubits,
            initial_nodes: nodes,
            initial_depth: depth,
            final_nodes: nodes,
            final_depth: depth,
            passes: vec![],
        }
    }

    pub(crate) fn record(&mut self, name: &str, kind: PassKind, before: usize, after: usize) {
        self.passes.push(PassRecord {
            name: name.to_string(),
            kind,
            nodes_before: before,
            nodes_after: after,
        });
    }

    pub(crate) fn finish(&mut self, nodes: usize, depth: usize) {
        self.final_nodes = nodes;
        self.final_depth = depth;
    }

    /// Fraction of nodes removed, in `[0, 1)` for shrinking runs.
    ///
    /// Negative when the tree grew.
    pub fn reduction(&self) -> f64 {
        if self.initial_nodes == 0 {
            return 0.0;
        }
        1.0 - self.final_nodes as f64 / self.initial_nodes as f64
    }

    /// Serialize the report as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
