//! kqbit Tree Optimizer
//!
//! This crate rewrites operator trees built by `kqbit-ir` into equivalent
//! trees that are cheaper to evaluate. It uses the same pass-based layout as
//! a circuit compiler: each rewrite is a [`Pass`], and a [`PassManager`] runs
//! an ordered list of them.
//!
//! # Architecture
//!
//! ```text
//! Builder tree
//!       │
//!       ▼
//! ┌─────────────┐
//! │ PassManager │ ──► PassReport (node counts per pass)
//! └─────────────┘
//!       │
//!       ├── Flatten / Simplify
//!       ├── FactoriseTensor / FactoriseSum
//!       ├── ProductFusion / SumFusion / TensorFusion
//!       └── FixedPoint (level 3 rounds)
//!       │
//!       ▼
//! Optimized tree (same operator)
//! ```
//!
//! # Example
//!
//! ```rust
//! use kqbit_compile::optimize;
//! use kqbit_ir::CircuitTree;
//!
//! let raw = CircuitTree::ghz(4).into_root();
//! let raw_nodes = raw.node_count();
//!
//! let optimized = optimize(raw);
//! assert!(optimized.node_count() < raw_nodes);
//! assert_eq!(optimized.num_qubits(), 4);
//! ```
//!
//! # Optimization Levels
//!
//! | Level | Passes Included |
//! |-------|-----------------|
//! | 0 | none |
//! | 1 | flatten, simplify |
//! | 2 | flatten, simplify, factorise_tensor, product_fusion, sum_fusion, simplify, flatten |
//! | 3 | flatten, simplify, then factorise_tensor, factorise_sum, tensor_fusion, sum_fusion, product_fusion, simplify, flatten repeated until the tree settles |

pub mod manager;
pub mod pass;
pub mod passes;
pub mod report;

pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use report::{PassRecord, PassReport};

use kqbit_ir::Node;

/// Runs the fixed optimization pipeline.
pub fn full_optimize(tree: Node) -> Node {
    PassManager::full().run(tree)
}

/// Optimizes a tree; the same as [`full_optimize`].
///
/// Running it a second time never grows the tree and does not change the
/// operator it represents.
pub fn optimize(tree: Node) -> Node {
    full_optimize(tree)
}
