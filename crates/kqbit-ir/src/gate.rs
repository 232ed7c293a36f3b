//! Single-qubit gates and basis operators used as tree leaves.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};
use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;

use crate::matrix::Matrix;
use crate::node::Node;

/// A fixed 2x2 operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    /// Identity.
    I,
    /// Pauli-X (NOT).
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Hadamard.
    H,
    /// S = sqrt(Z).
    S,
    /// T = sqrt(S).
    T,
    /// Phase gate diag(1, e^{iθ}).
    Phase(f64),
    /// Projector |0⟩⟨0|.
    P0,
    /// Projector |1⟩⟨1|.
    P1,
    /// Transition |0⟩⟨1|.
    P01,
    /// Transition |1⟩⟨0|.
    P10,
    /// A gate multiplied by a complex coefficient.
    Scaled(ScaledGate),
}

/// Payload of [`Gate::Scaled`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledGate {
    /// Underlying operator. Never itself `Scaled`.
    pub base: BasisGate,
    /// Coefficient applied to every entry.
    pub coefficient: Complex64,
}

/// Unscaled gates that can carry a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasisGate {
    /// Identity.
    I,
    /// Projector |0⟩⟨0|.
    P0,
    /// Projector |1⟩⟨1|.
    P1,
    /// Transition |0⟩⟨1|.
    P01,
    /// Transition |1⟩⟨0|.
    P10,
}

impl BasisGate {
    /// The matrix unit `|row⟩⟨col|` for single-bit `row` and `col`.
    pub fn unit(row: usize, col: usize) -> Self {
        match (row & 1, col & 1) {
            (0, 0) => Self::P0,
            (0, _) => Self::P01,
            (_, 0) => Self::P10,
            _ => Self::P1,
        }
    }

    /// The unscaled gate.
    pub fn to_gate(self) -> Gate {
        match self {
            Self::I => Gate::I,
            Self::P0 => Gate::P0,
            Self::P1 => Gate::P1,
            Self::P01 => Gate::P01,
            Self::P10 => Gate::P10,
        }
    }
}

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I_UNIT: Complex64 = Complex64::new(0.0, 1.0);

impl Gate {
    /// `base` scaled by `coefficient`.
    pub fn scaled(base: BasisGate, coefficient: Complex64) -> Self {
        Self::Scaled(ScaledGate { base, coefficient })
    }

    /// Short lowercase name, as used in tree listings and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::I => "id",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::H => "h",
            Self::S => "s",
            Self::T => "t",
            Self::Phase(_) => "p",
            Self::P0 => "p0",
            Self::P1 => "p1",
            Self::P01 => "p01",
            Self::P10 => "p10",
            Self::Scaled(_) => "scaled",
        }
    }

    /// Row-major entries `[m00, m01, m10, m11]`.
    pub fn entries(&self) -> [Complex64; 4] {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        match self {
            Self::I => [ONE, ZERO, ZERO, ONE],
            Self::X => [ZERO, ONE, ONE, ZERO],
            Self::Y => [ZERO, -I_UNIT, I_UNIT, ZERO],
            Self::Z => [ONE, ZERO, ZERO, -ONE],
            Self::H => [h, h, h, -h],
            Self::S => [ONE, ZERO, ZERO, I_UNIT],
            Self::T => [ONE, ZERO, ZERO, Complex64::from_polar(1.0, FRAC_PI_4)],
            Self::Phase(theta) => [ONE, ZERO, ZERO, Complex64::from_polar(1.0, *theta)],
            Self::P0 => [ONE, ZERO, ZERO, ZERO],
            Self::P1 => [ZERO, ZERO, ZERO, ONE],
            Self::P01 => [ZERO, ONE, ZERO, ZERO],
            Self::P10 => [ZERO, ZERO, ONE, ZERO],
            Self::Scaled(scaled) => scaled.base.to_gate().entries().map(|v| v * scaled.coefficient),
        }
    }

    /// The gate as a 2x2 matrix.
    pub fn matrix(&self) -> Matrix {
        let entries = self.entries();
        Array2::from_shape_fn((2, 2), |(r, c)| entries[2 * r + c])
    }

    /// A fresh 1-qubit leaf holding this gate.
    pub fn leaf(&self) -> Node {
        Node::leaf(self.matrix())
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phase(theta) => write!(f, "p({theta})"),
            Self::Scaled(scaled) => write!(
                f,
                "({}{:+}i)*{}",
                scaled.coefficient.re,
                scaled.coefficient.im,
                scaled.base.to_gate().name()
            ),
            other => f.write_str(other.name()),
        }
    }
}
