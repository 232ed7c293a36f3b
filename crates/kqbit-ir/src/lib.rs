//! kqbit Operator Expression Trees
//!
//! This crate provides the intermediate representation used by kqbit to
//! simulate quantum circuits without ever forming a `2^n x 2^n` matrix. A
//! circuit becomes an algebraic expression over small dense matrices, which
//! the `kqbit-compile` passes rewrite and the `kqbit-sim` evaluator applies to
//! a statevector.
//!
//! # Core Components
//!
//! - **Nodes**: [`Node`] with the variants of [`NodeKind`] (`Leaf`, `Sum`,
//!   `Product`, `Tensor`)
//! - **Gates**: [`Gate`] for the fixed single-qubit operators and the
//!   projectors `P0`, `P1`, `P01`, `P10`
//! - **Builder**: [`builder`] functions and the chainable [`CircuitTree`]
//! - **Kernels**: [`matrix`] for dense leaf arithmetic
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use kqbit_ir::{CircuitTree, NodeType};
//!
//! let mut tree = CircuitTree::new(2);
//! tree.h(0).cx(0, 1);
//!
//! let root = tree.into_root();
//! assert_eq!(root.num_qubits(), 2);
//! // The last gate is the leftmost factor.
//! assert_eq!(root.node_type(), NodeType::Product);
//! assert_eq!(root.children()[0].node_type(), NodeType::Sum);
//! ```
//!
//! # Bit Ordering
//!
//! Qubit 0 is the most significant bit of a basis index. In a `Tensor`,
//! child 0 owns the most significant qubits.
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Tree shape |
//! |------|--------|------------|
//! | `I`, `X`, `Y`, `Z`, `H`, `S`, `T`, `P(θ)` | 1 | leaf padded with identity trees |
//! | `CX`, `CZ`, `CP(θ)`, controlled `U` | 2 | sum of two flat projector tensors |
//! | `Swap` | 2 | sum of four flat projector tensors |
//! | custom | k | one leaf (adjacent qubits) or a sum of basis-unit tensors |

pub mod builder;
pub mod error;
pub mod gate;
pub mod matrix;
pub mod node;

pub use builder::{CircuitTree, identity_tree};
pub use error::{IrError, IrResult};
pub use gate::{BasisGate, Gate, ScaledGate};
pub use matrix::{EPSILON, Matrix};
pub use node::{Node, NodeKind, NodeType, Operation};
