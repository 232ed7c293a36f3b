//! kqbit Strided Statevector Evaluator
//!
//! This crate applies `kqbit-ir` operator trees to statevectors. The full
//! `2^n x 2^n` operator is never formed: leaves act on strided fibers of the
//! state, so memory stays at a few statevector-sized buffers.
//!
//! # Features
//!
//! - **Strided evaluation**: a [`Plan`] flattens the tree once, then walks
//!   it over [`StridedView`]s
//! - **Buffer reuse**: a [`Workspace`] pool serves every intermediate product
//! - **Size guard**: trees wider than [`SimConfig::max_qubits`] are rejected
//!   before anything is allocated
//! - **Driver**: [`Simulator`] optimizes at the configured level, then
//!   evaluates
//!
//! # Memory
//!
//! | Qubits | Per buffer | Buffers (typical) |
//! |--------|------------|---------|
//! | 10 | ~16 KB | 4 |
//! | 20 | ~16 MB | 4 |
//! | 25 | ~512 MB | 4 |
//! | 30 | ~16 GB | 4 |
//!
//! # Example
//!
//! ```rust
//! use kqbit_ir::CircuitTree;
//! use kqbit_sim::Simulator;
//!
//! let result = Simulator::new().run(CircuitTree::ghz(3).into_root()).unwrap();
//! let outcomes = result.state.dominant_outcomes(1e-9);
//! assert_eq!(outcomes.len(), 2);
//! assert!(outcomes.iter().all(|(bits, _)| bits == "000" || bits == "111"));
//! ```

pub mod config;
pub mod dense;
pub mod error;
pub mod evaluator;
pub mod simulator;
pub mod statevector;
pub mod view;
pub mod workspace;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use evaluator::{Evaluator, Plan, apply, compute_statevector};
pub use simulator::{SimulationResult, Simulator};
pub use statevector::Statevector;
pub use view::{StridedView, StridedViewMut};
pub use workspace::Workspace;
