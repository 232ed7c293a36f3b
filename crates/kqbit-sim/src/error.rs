//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced while configuring or running an evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// The tree is wider than the configured limit.
    #[error("Tree acts on {requested} qubits but the simulator is limited to {max}")]
    TooManyQubits {
        /// Width of the tree.
        requested: u32,
        /// Configured limit.
        max: u32,
    },

    /// A statevector or scratch buffer could not be allocated.
    #[error("Failed to allocate {bytes} bytes for the {purpose}")]
    AllocationFailed {
        /// What the buffer was for.
        purpose: &'static str,
        /// Requested size.
        bytes: usize,
    },

    /// The initial state does not match the tree dimension.
    #[error("Initial state has {got} amplitudes but the tree expects {expected}")]
    StateLengthMismatch {
        /// `2^num_qubits` of the tree.
        expected: usize,
        /// Length of the supplied state.
        got: usize,
    },

    /// A configuration file could not be read.
    #[error("Failed to read config file: {0}")]
    ConfigIo(String),

    /// A configuration file could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tree violates a structural invariant.
    #[error("Malformed tree: {0}")]
    Ir(#[from] kqbit_ir::IrError),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
