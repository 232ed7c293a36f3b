//! Property-based tests for optimizer soundness.
//!
//! Random builder circuits are evaluated raw, optimized, and through the dense
//! reference; every route must produce the same statevector.

use std::f64::consts::PI;

use kqbit_compile::{PassManagerBuilder, optimize};
use kqbit_ir::{CircuitTree, Node};
use kqbit_sim::{Evaluator, dense};
use num_complex::Complex64;
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-9;

/// Generate a random circuit tree for property testing.
///
/// Generates circuits with:
/// - 1-6 qubits
/// - 1-16 gates from the single-qubit set, controlled gates and SWAP
fn arb_circuit() -> impl Strategy<Value = Node> {
    (1_u32..=6).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 1..=16).prop_map(move |ops| {
            let mut tree = CircuitTree::new(num_qubits);
            for op in ops {
                op.apply(&mut tree);
            }
            tree.into_root()
        })
    })
}

/// Gate operations that can be applied to a tree.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Y(u32),
    Z(u32),
    S(u32),
    T(u32),
    P(f64, u32),
    CX(u32, u32),
    CZ(u32, u32),
    CP(f64, u32, u32),
    Swap(u32, u32),
}

impl GateOp {
    fn apply(self, tree: &mut CircuitTree) {
        match self {
            GateOp::H(q) => {
                tree.h(q);
            }
            GateOp::X(q) => {
                tree.x(q);
            }
            GateOp::Y(q) => {
                tree.y(q);
            }
            GateOp::Z(q) => {
                tree.z(q);
            }
            GateOp::S(q) => {
                tree.s(q);
            }
            GateOp::T(q) => {
                tree.t(q);
            }
            GateOp::P(theta, q) => {
                tree.p(theta, q);
            }
            GateOp::CX(c, t) => {
                tree.cx(c, t);
            }
            GateOp::CZ(c, t) => {
                tree.cz(c, t);
            }
            GateOp::CP(theta, c, t) => {
                tree.cp(theta, c, t);
            }
            GateOp::Swap(a, b) => {
                tree.swap(a, b);
            }
        }
    }
}

/// Generate a random gate operation for a tree with given number of qubits.
fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    // For single-qubit trees, only generate single-qubit gates
    if num_qubits < 2 {
        prop_oneof![
            (0..num_qubits).prop_map(GateOp::H),
            (0..num_qubits).prop_map(GateOp::X),
            (0..num_qubits).prop_map(GateOp::Y),
            (0..num_qubits).prop_map(GateOp::Z),
            (0..num_qubits).prop_map(GateOp::S),
            (0..num_qubits).prop_map(GateOp::T),
            (-PI..PI, 0..num_qubits).prop_map(|(theta, q)| GateOp::P(theta, q)),
        ]
        .boxed()
    } else {
        let pair = move || {
            (0..num_qubits, 0..num_qubits)
                .prop_filter("Control and target must differ", |(c, t)| c != t)
        };
        prop_oneof![
            (0..num_qubits).prop_map(GateOp::H),
            (0..num_qubits).prop_map(GateOp::X),
            (0..num_qubits).prop_map(GateOp::Y),
            (0..num_qubits).prop_map(GateOp::Z),
            (0..num_qubits).prop_map(GateOp::S),
            (0..num_qubits).prop_map(GateOp::T),
            (-PI..PI, 0..num_qubits).prop_map(|(theta, q)| GateOp::P(theta, q)),
            pair().prop_map(|(c, t)| GateOp::CX(c, t)),
            pair().prop_map(|(c, t)| GateOp::CZ(c, t)),
            (-PI..PI, pair()).prop_map(|(theta, (c, t))| GateOp::CP(theta, c, t)),
            pair().prop_map(|(a, b)| GateOp::Swap(a, b)),
        ]
        .boxed()
    }
}

fn statevector(tree: &Node) -> Vec<Complex64> {
    Evaluator::default()
        .compute_statevector(tree)
        .expect("evaluation failed")
        .into_amplitudes()
}

fn max_deviation(a: &[Complex64], b: &[Complex64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

fn basis_zero(dim: usize) -> Vec<Complex64> {
    let mut state = vec![Complex64::new(0.0, 0.0); dim];
    state[0] = Complex64::new(1.0, 0.0);
    state
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    /// The raw tree evaluates like its dense matrix.
    #[test]
    fn test_raw_tree_matches_dense(tree in arb_circuit()) {
        let expected = dense::apply_dense(&tree, &basis_zero(tree.dim())).unwrap();
        let actual = statevector(&tree);
        prop_assert!(max_deviation(&actual, &expected) < TOLERANCE);
    }

    /// Optimization at levels 1-3 leaves the statevector unchanged.
    #[test]
    fn test_optimization_preserves_statevector(tree in arb_circuit()) {
        let expected = statevector(&tree);
        for level in 1..=3u8 {
            let pm = PassManagerBuilder::new().with_optimization_level(level).build();
            let optimized = pm.run(tree.clone());
            prop_assert!(optimized.validate().is_ok(), "level {} broke an invariant", level);
            prop_assert_eq!(optimized.num_qubits(), tree.num_qubits());
            let deviation = max_deviation(&statevector(&optimized), &expected);
            prop_assert!(deviation < TOLERANCE, "level {} deviates by {}", level, deviation);
        }
    }

    /// A second optimize neither shrinks the tree further nor changes its output.
    #[test]
    fn test_optimize_is_idempotent(tree in arb_circuit()) {
        let once = optimize(tree);
        let once_nodes = once.node_count();
        let once_state = statevector(&once);

        let twice = optimize(once);
        prop_assert!(twice.node_count() <= once_nodes);
        prop_assert!(max_deviation(&statevector(&twice), &once_state) < TOLERANCE);
    }

    /// Level 3 stops at a tree another level-3 run cannot shrink.
    #[test]
    fn test_level3_is_stable(tree in arb_circuit()) {
        let pm = PassManagerBuilder::new().with_optimization_level(3).build();
        let once = pm.run(tree);
        let twice = pm.run(once.clone());
        prop_assert_eq!(twice.node_count(), once.node_count());
    }

    /// The optimizer never grows a builder tree.
    #[test]
    fn test_optimization_does_not_grow(tree in arb_circuit()) {
        let raw_nodes = tree.node_count();
        prop_assert!(optimize(tree).node_count() <= raw_nodes);
    }
}
