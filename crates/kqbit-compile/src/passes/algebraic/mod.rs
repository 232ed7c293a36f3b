//! Algebraic passes.
//!
//! Factorisation regroups a product of tensors into a tensor of products (and
//! a sum of tensors into a tensor with a summed middle). Fusion then replaces
//! runs of adjacent leaves with one precomputed leaf.

mod factorise;
mod fusion;

#[cfg(test)]
mod tests;

pub use factorise::{FactoriseSum, FactoriseTensor, factorise_sum, factorise_tensor};
pub use fusion::{
    DEFAULT_MAX_FUSED_QUBITS, ProductFusion, SumFusion, TensorFusion, product_fusion, sum_fusion,
    tensor_fusion,
};
