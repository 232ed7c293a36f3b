//! Tree construction from gate sequences.
//!
//! Every `add_*` function consumes the current root and returns
//! `Product(layer, root)`, so the most recently added gate is the leftmost
//! factor and acts last. [`CircuitTree`] wraps the same functions in a
//! chainable builder.

use std::f64::consts::PI;

use num_complex::Complex64;
use tracing::{debug, trace_span};

use crate::gate::{BasisGate, Gate};
use crate::matrix::{EPSILON, Matrix};
use crate::node::Node;

/// Balanced tensor product of `num_qubits` identity leaves.
///
/// The left half gets `⌊n/2⌋` qubits, so the depth is `O(log n)`.
///
/// # Panics
///
/// Panics if `num_qubits` is zero.
pub fn identity_tree(num_qubits: u32) -> Node {
    assert!(num_qubits >= 1, "identity tree needs at least one qubit");
    if num_qubits == 1 {
        return Gate::I.leaf();
    }
    let left = num_qubits / 2;
    Node::tensor(identity_tree(left), identity_tree(num_qubits - left))
}

/// Embeds `gate` at qubits `start..start + gate.num_qubits()` of a
/// `total_qubits`-wide layer, padding both sides with identity trees.
///
/// # Panics
///
/// Panics if the gate does not fit.
pub fn gate_layer(gate: Node, total_qubits: u32, start: u32) -> Node {
    let width = gate.num_qubits();
    let end = start.checked_add(width).filter(|&end| end <= total_qubits);
    let Some(end) = end else {
        panic!(
            "{width}-qubit gate at qubit {start} does not fit in a {total_qubits}-qubit layer"
        );
    };

    let mut layer = gate;
    if end < total_qubits {
        layer = Node::tensor(layer, identity_tree(total_qubits - end));
    }
    if start > 0 {
        layer = Node::tensor(identity_tree(start), layer);
    }
    layer
}

/// Appends `layer` after everything already in `root`.
///
/// # Panics
///
/// Panics if the widths differ.
pub fn compose(root: Node, layer: Node) -> Node {
    Node::product(layer, root)
}

/// Applies a single-qubit gate to `target`.
pub fn add_gate(root: Node, gate: Gate, target: u32) -> Node {
    let n = root.num_qubits();
    check_qubit(n, target, "target");
    compose(root, gate_layer(gate.leaf(), n, target))
}

/// Applies Pauli-X to `target`.
pub fn add_x(root: Node, target: u32) -> Node {
    add_gate(root, Gate::X, target)
}

/// Applies Pauli-Y to `target`.
pub fn add_y(root: Node, target: u32) -> Node {
    add_gate(root, Gate::Y, target)
}

/// Applies Pauli-Z to `target`.
pub fn add_z(root: Node, target: u32) -> Node {
    add_gate(root, Gate::Z, target)
}

/// Applies a Hadamard to `target`.
pub fn add_h(root: Node, target: u32) -> Node {
    add_gate(root, Gate::H, target)
}

/// Applies S to `target`.
pub fn add_s(root: Node, target: u32) -> Node {
    add_gate(root, Gate::S, target)
}

/// Applies T to `target`.
pub fn add_t(root: Node, target: u32) -> Node {
    add_gate(root, Gate::T, target)
}

/// Applies the phase gate `diag(1, e^{iθ})` to `target`.
pub fn add_phase(root: Node, target: u32, theta: f64) -> Node {
    add_gate(root, Gate::Phase(theta), target)
}

/// Applies `gate` to `target` when `control` is |1⟩.
///
/// The layer is `Sum(P0@control, P1@control ⊗ gate@target)`, each term a
/// flat tensor of one leaf per qubit.
///
/// # Panics
///
/// Panics if either qubit is out of range or `control == target`.
pub fn add_controlled(root: Node, control: u32, target: u32, gate: Gate) -> Node {
    let n = root.num_qubits();
    check_qubit(n, control, "control");
    check_qubit(n, target, "target");
    assert_ne!(control, target, "control and target must differ (both {control})");

    let idle = full_width_term(n, vec![(control, Gate::P0.leaf())]);
    let active = full_width_term(
        n,
        vec![(control, Gate::P1.leaf()), (target, gate.leaf())],
    );
    compose(root, Node::sum(idle, active))
}

/// Controlled-NOT.
pub fn add_cnot(root: Node, control: u32, target: u32) -> Node {
    add_controlled(root, control, target, Gate::X)
}

/// Controlled-Z.
pub fn add_cz(root: Node, control: u32, target: u32) -> Node {
    add_controlled(root, control, target, Gate::Z)
}

/// Controlled phase `diag(1, 1, 1, e^{iθ})`.
pub fn add_cphase(root: Node, control: u32, target: u32, theta: f64) -> Node {
    add_controlled(root, control, target, Gate::Phase(theta))
}

/// Exchanges qubits `a` and `b`.
///
/// # Panics
///
/// Panics if either qubit is out of range or `a == b`.
pub fn add_swap(root: Node, a: u32, b: u32) -> Node {
    let n = root.num_qubits();
    check_qubit(n, a, "swap");
    check_qubit(n, b, "swap");
    assert_ne!(a, b, "swap needs two distinct qubits (both {a})");

    let terms = [
        (Gate::P0, Gate::P0),
        (Gate::P1, Gate::P1),
        (Gate::P01, Gate::P10),
        (Gate::P10, Gate::P01),
    ]
    .into_iter()
    .map(|(ga, gb)| full_width_term(n, vec![(a, ga.leaf()), (b, gb.leaf())]))
    .collect();
    compose(root, Node::sum_list(terms))
}

/// Applies a dense `2^k x 2^k` matrix to `qubits`, where `k = qubits.len()`.
///
/// `qubits[0]` is the most significant bit of the matrix index. An ascending
/// run of adjacent qubits becomes a single leaf; any other list is expanded
/// into one flat tensor term per non-zero matrix entry. `label` only names the
/// tracing span.
///
/// # Panics
///
/// Panics if `qubits` is empty, has duplicates or out-of-range entries, or
/// does not match the matrix shape.
pub fn add_custom(root: Node, qubits: &[u32], matrix: &Matrix, label: Option<&str>) -> Node {
    let n = root.num_qubits();
    let label = label.unwrap_or("custom");
    let _span = trace_span!("custom_gate", label, ?qubits).entered();

    assert!(!qubits.is_empty(), "custom gate '{label}' has no qubits");
    for (i, &q) in qubits.iter().enumerate() {
        check_qubit(n, q, "custom gate");
        assert!(
            !qubits[..i].contains(&q),
            "custom gate '{label}' lists qubit {q} twice"
        );
    }
    let side = u32::try_from(qubits.len())
        .ok()
        .and_then(|k| 1usize.checked_shl(k));
    assert!(
        side.is_some_and(|side| matrix.dim() == (side, side)),
        "custom gate '{label}' on {} qubits needs a square matrix of side 2^{}, got {:?}",
        qubits.len(),
        qubits.len(),
        matrix.dim()
    );

    let contiguous = qubits.windows(2).all(|w| w[1] == w[0] + 1);
    let layer = if contiguous {
        gate_layer(Node::leaf(matrix.clone()), n, qubits[0])
    } else {
        scattered_layer(n, qubits, matrix)
    };
    debug!(
        label,
        contiguous,
        layer_nodes = layer.node_count(),
        "added custom gate"
    );
    compose(root, layer)
}

/// `Σ U[r,c] ⊗_m |r_m⟩⟨c_m|` over the non-zero entries of `matrix`.
fn scattered_layer(n: u32, qubits: &[u32], matrix: &Matrix) -> Node {
    let mut terms: Vec<Node> = matrix
        .indexed_iter()
        .filter(|(_, coefficient)| coefficient.norm() > EPSILON)
        .map(|((row, col), &coefficient)| basis_term(n, qubits, row, col, coefficient))
        .collect();

    if terms.is_empty() {
        // An all-zero gate still needs one term to keep the layer well formed.
        terms.push(basis_term(n, qubits, 0, 0, Complex64::new(0.0, 0.0)));
    }
    Node::sum_list(terms)
}

fn basis_term(n: u32, qubits: &[u32], row: usize, col: usize, coefficient: Complex64) -> Node {
    let k = qubits.len();
    let factors = qubits
        .iter()
        .enumerate()
        .map(|(m, &q)| {
            let shift = k - 1 - m;
            let unit = BasisGate::unit(row >> shift, col >> shift);
            let gate = if m == 0 {
                Gate::scaled(unit, coefficient)
            } else {
                unit.to_gate()
            };
            (q, gate.leaf())
        })
        .collect();
    full_width_term(n, factors)
}

/// A flat `n`-leaf tensor with the given leaves placed and identity elsewhere.
fn full_width_term(n: u32, placed: Vec<(u32, Node)>) -> Node {
    let mut slots: Vec<Option<Node>> = (0..n).map(|_| None).collect();
    for (qubit, leaf) in placed {
        slots[qubit as usize] = Some(leaf);
    }
    Node::tensor_list(
        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Gate::I.leaf()))
            .collect(),
    )
}

fn check_qubit(num_qubits: u32, qubit: u32, role: &str) {
    assert!(
        qubit < num_qubits,
        "{role} qubit {qubit} out of range for a {num_qubits}-qubit tree"
    );
}

/// Owns a tree root and appends gates through chainable methods.
///
/// ```
/// use kqbit_ir::CircuitTree;
///
/// let mut tree = CircuitTree::new(2);
/// tree.h(0).cx(0, 1);
/// assert_eq!(tree.num_qubits(), 2);
/// assert_eq!(tree.gate_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CircuitTree {
    root: Node,
    gate_count: usize,
}

impl CircuitTree {
    /// Starts from the identity on `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            root: identity_tree(num_qubits),
            gate_count: 0,
        }
    }

    /// Continues from an existing root.
    pub fn from_root(root: Node) -> Self {
        Self {
            root,
            gate_count: 0,
        }
    }

    /// The current root.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Releases the root.
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Width of the tree.
    pub fn num_qubits(&self) -> u32 {
        self.root.num_qubits()
    }

    /// Number of gates appended through this builder.
    pub fn gate_count(&self) -> usize {
        self.gate_count
    }

    fn push(&mut self, f: impl FnOnce(Node) -> Node) -> &mut Self {
        let root = std::mem::replace(&mut self.root, Gate::I.leaf());
        self.root = f(root);
        self.gate_count += 1;
        self
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply a single-qubit gate.
    pub fn gate(&mut self, gate: Gate, target: u32) -> &mut Self {
        self.push(|root| add_gate(root, gate, target))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, target: u32) -> &mut Self {
        self.push(|root| add_h(root, target))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, target: u32) -> &mut Self {
        self.push(|root| add_x(root, target))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, target: u32) -> &mut Self {
        self.push(|root| add_y(root, target))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, target: u32) -> &mut Self {
        self.push(|root| add_z(root, target))
    }

    /// Apply S gate.
    pub fn s(&mut self, target: u32) -> &mut Self {
        self.push(|root| add_s(root, target))
    }

    /// Apply T gate.
    pub fn t(&mut self, target: u32) -> &mut Self {
        self.push(|root| add_t(root, target))
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, target: u32) -> &mut Self {
        self.push(|root| add_phase(root, target, theta))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: u32, target: u32) -> &mut Self {
        self.push(|root| add_cnot(root, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: u32, target: u32) -> &mut Self {
        self.push(|root| add_cz(root, control, target))
    }

    /// Apply controlled phase gate.
    pub fn cp(&mut self, theta: f64, control: u32, target: u32) -> &mut Self {
        self.push(|root| add_cphase(root, control, target, theta))
    }

    /// Apply a controlled single-qubit gate.
    pub fn controlled(&mut self, gate: Gate, control: u32, target: u32) -> &mut Self {
        self.push(|root| add_controlled(root, control, target, gate))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, a: u32, b: u32) -> &mut Self {
        self.push(|root| add_swap(root, a, b))
    }

    /// Apply a dense gate to an explicit qubit list.
    pub fn custom(&mut self, qubits: &[u32], matrix: &Matrix, label: Option<&str>) -> &mut Self {
        self.push(|root| add_custom(root, qubits, matrix, label))
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// H(0) then CNOT(0, 1).
    pub fn bell() -> Self {
        let mut tree = Self::new(2);
        tree.h(0).cx(0, 1);
        tree
    }

    /// H(0) then a CNOT chain, preparing `(|0…0⟩ + |1…1⟩)/√2`.
    pub fn ghz(n: u32) -> Self {
        let mut tree = Self::new(n);
        tree.h(0);
        for i in 0..n.saturating_sub(1) {
            tree.cx(i, i + 1);
        }
        tree
    }

    /// Quantum Fourier transform, including the final bit-reversal swaps.
    pub fn qft(n: u32) -> Self {
        let mut tree = Self::new(n);
        for i in 0..n {
            tree.h(i);
            for j in (i + 1)..n {
                tree.cp(qft_angle(j - i), j, i);
            }
        }
        for i in 0..n / 2 {
            tree.swap(i, n - 1 - i);
        }
        tree
    }
}

/// Controlled-phase angle between QFT qubits `distance` apart: `π / 2^distance`.
fn qft_angle(distance: u32) -> f64 {
    PI / 2f64.powi(distance as i32)
}

impl From<CircuitTree> for Node {
    fn from(tree: CircuitTree) -> Self {
        tree.into_root()
    }
}
