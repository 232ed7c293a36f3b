//! Evaluation results.

use num_complex::Complex64;

/// A statevector produced by evaluating a tree.
///
/// Basis index `i` has qubit 0 as its most significant bit.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: u32,
}

impl Statevector {
    pub(crate) fn from_parts(amplitudes: Vec<Complex64>, num_qubits: u32) -> Self {
        debug_assert_eq!(Some(amplitudes.len()), 1usize.checked_shl(num_qubits));
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of amplitudes.
    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    /// Always false; a statevector has at least two amplitudes.
    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    /// Amplitude of basis state `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn amplitude(&self, index: usize) -> Complex64 {
        self.amplitudes[index]
    }

    /// All amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Consume the statevector and return its amplitudes.
    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    /// Get the probability of each basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Squared norm; 1 for unitary evolutions of a normalised state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Largest amplitude-wise distance to `other`.
    ///
    /// Returns infinity if the lengths differ.
    pub fn max_deviation(&self, other: &[Complex64]) -> f64 {
        if other.len() != self.amplitudes.len() {
            return f64::INFINITY;
        }
        self.amplitudes
            .iter()
            .zip(other)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// Format a basis index as a bitstring, qubit 0 leftmost.
    pub fn outcome_to_bitstring(&self, outcome: usize) -> String {
        format!("{:0width$b}", outcome, width = self.num_qubits as usize)
    }

    /// Basis states with probability above `threshold`, most likely first.
    pub fn dominant_outcomes(&self, threshold: f64) -> Vec<(String, f64)> {
        let mut outcomes: Vec<(usize, f64)> = self
            .probabilities()
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > threshold)
            .collect();
        outcomes.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        outcomes
            .into_iter()
            .map(|(index, p)| (self.outcome_to_bitstring(index), p))
            .collect()
    }
}
