//! Error types for the IR crate.

use thiserror::Error;

use crate::node::NodeType;

/// Invariant violations found by [`Node::validate`](crate::Node::validate).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// An operator node has no children.
    #[error("{node_type} node at {path} has no children")]
    EmptyOperator {
        /// Variant of the offending node.
        node_type: NodeType,
        /// Child-index path from the root.
        path: String,
    },

    /// A Sum or Product child does not match its siblings.
    #[error("{node_type} node at {path}: child {child} acts on {got} qubits, expected {expected}")]
    DimensionMismatch {
        /// Variant of the offending node.
        node_type: NodeType,
        /// Child-index path from the root.
        path: String,
        /// Index of the mismatching child.
        child: usize,
        /// Qubit count shared by the other children.
        expected: u32,
        /// Qubit count of the mismatching child.
        got: u32,
    },

    /// Stored qubit count disagrees with the children.
    #[error("{node_type} node at {path} records {recorded} qubits but its children imply {implied}")]
    QubitCountMismatch {
        /// Variant of the offending node.
        node_type: NodeType,
        /// Child-index path from the root.
        path: String,
        /// Qubit count stored in the node.
        recorded: u32,
        /// Qubit count derived from the children.
        implied: u32,
    },

    /// Leaf matrix has the wrong shape for its qubit count.
    #[error("leaf at {path} is {rows}x{cols}, expected a square matrix of side {expected}")]
    MalformedLeaf {
        /// Child-index path from the root.
        path: String,
        /// Row count of the stored matrix.
        rows: usize,
        /// Column count of the stored matrix.
        cols: usize,
        /// Expected side length.
        expected: usize,
    },

    /// Leaf contains a NaN or infinite entry.
    #[error("leaf at {path} has a non-finite entry at ({row}, {col})")]
    NonFiniteEntry {
        /// Child-index path from the root.
        path: String,
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        col: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
