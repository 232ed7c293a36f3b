//! Recursive strided evaluation of operator trees.
//!
//! A [`Plan`] is built once per tree and then applied to state buffers:
//!
//! - a leaf is a dense mat-vec;
//! - a sum applies every term and accumulates into the output;
//! - a product applies its factors right to left, passing intermediates
//!   between two workspace buffers;
//! - a tensor applies one factor at a time to every fiber of the state that
//!   the factor's qubits span.
//!
//! Nested products and nested tensors are flattened into one step list and
//! identity factors are dropped while planning, so the fiber loops only run
//! precomputed steps and a raw builder tree costs one pass per non-trivial
//! gate.

use num_complex::Complex64;
use tracing::{debug, instrument};

use kqbit_ir::{Matrix, Node, NodeKind, NodeType};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;
use crate::view::{StridedView, StridedViewMut};
use crate::workspace::{Workspace, zeroed};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Applies `node` to `input`, writing or accumulating into `output`.
///
/// Both views must have length `node.dim()`. Callers applying the same tree
/// repeatedly should build a [`Plan`] once instead.
pub fn apply(
    node: &Node,
    input: StridedView<'_>,
    output: StridedViewMut<'_>,
    workspace: &mut Workspace,
    accumulate: bool,
) -> SimResult<()> {
    Plan::new(node).apply(input, output, workspace, accumulate)
}

/// An operator tree prepared for evaluation.
#[derive(Debug)]
pub struct Plan<'n> {
    root: Op<'n>,
    dim: usize,
}

impl<'n> Plan<'n> {
    /// Flatten `node` into evaluation steps.
    pub fn new(node: &'n Node) -> Self {
        Self {
            root: Op::new(node),
            dim: node.dim(),
        }
    }

    /// Length of the state vectors this plan acts on.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of leaf mat-vecs in one application, ignoring fiber repeats.
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Applies the planned operator to `input`, writing or accumulating into
    /// `output`. Both views must have length [`Plan::dim`].
    pub fn apply(
        &self,
        input: StridedView<'_>,
        output: StridedViewMut<'_>,
        workspace: &mut Workspace,
        accumulate: bool,
    ) -> SimResult<()> {
        debug_assert_eq!(input.len(), self.dim);
        debug_assert_eq!(output.len(), self.dim);
        self.root.execute(input, output, workspace, accumulate)
    }
}

#[derive(Debug)]
enum Op<'n> {
    Leaf(&'n Matrix),
    Sum(Vec<Op<'n>>),
    /// Flattened product or tensor factors, in application order.
    Steps(Vec<Step<'n>>),
}

/// One factor of a flattened product or tensor.
///
/// `stride` is the product of the dimensions to the factor's right inside a
/// tensor, and 1 for product factors, which span the whole state.
#[derive(Debug)]
struct Step<'n> {
    op: Op<'n>,
    dim: usize,
    stride: usize,
}

impl<'n> Op<'n> {
    fn new(node: &'n Node) -> Self {
        match node.kind() {
            NodeKind::Leaf(matrix) => Op::Leaf(matrix),
            NodeKind::Sum(terms) => Op::Sum(terms.iter().map(Op::new).collect()),
            NodeKind::Product(_) => {
                let mut factors = Vec::new();
                collect_factors(node, NodeType::Product, &mut factors);
                // Matrix order is leftmost first; the rightmost factor acts first.
                let steps = factors
                    .into_iter()
                    .rev()
                    .filter(|factor| !factor.is_identity())
                    .map(|factor| Step::new(factor, 1))
                    .collect();
                Op::Steps(steps)
            }
            NodeKind::Tensor(_) => {
                let mut factors = Vec::new();
                collect_factors(node, NodeType::Tensor, &mut factors);
                let mut steps = Vec::with_capacity(factors.len());
                let mut stride = 1;
                for factor in factors.into_iter().rev() {
                    if !factor.is_identity() {
                        steps.push(Step::new(factor, stride));
                    }
                    stride *= factor.dim();
                }
                Op::Steps(steps)
            }
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            Op::Leaf(_) => 1,
            Op::Sum(terms) => terms.iter().map(Op::leaf_count).sum(),
            Op::Steps(steps) => steps.iter().map(|step| step.op.leaf_count()).sum(),
        }
    }

    fn execute(
        &self,
        input: StridedView<'_>,
        mut output: StridedViewMut<'_>,
        workspace: &mut Workspace,
        accumulate: bool,
    ) -> SimResult<()> {
        match self {
            Op::Leaf(matrix) => {
                apply_leaf(matrix, input, output, accumulate);
                Ok(())
            }
            Op::Sum(terms) => {
                if !accumulate {
                    output.fill(ZERO);
                }
                for term in terms {
                    term.execute(input, output.reborrow(), workspace, true)?;
                }
                Ok(())
            }
            Op::Steps(steps) => run_steps(steps, input, output, workspace, accumulate),
        }
    }
}

impl<'n> Step<'n> {
    fn new(factor: &'n Node, stride: usize) -> Self {
        Self {
            op: Op::new(factor),
            dim: factor.dim(),
            stride,
        }
    }

    /// Applies the factor to every fiber it spans.
    fn execute(
        &self,
        input: StridedView<'_>,
        mut output: StridedViewMut<'_>,
        workspace: &mut Workspace,
        accumulate: bool,
    ) -> SimResult<()> {
        if self.dim == input.len() {
            return self.op.execute(input, output, workspace, accumulate);
        }

        let block = self.dim * self.stride;
        for outer in 0..input.len() / block {
            for inner in 0..self.stride {
                let base = outer * block + inner;
                self.op.execute(
                    input.fiber(base, self.stride, self.dim),
                    output.fiber_mut(base, self.stride, self.dim),
                    workspace,
                    accumulate,
                )?;
            }
        }
        Ok(())
    }
}

/// Runs `steps` in order; only the last one writes the real output.
fn run_steps(
    steps: &[Step<'_>],
    input: StridedView<'_>,
    output: StridedViewMut<'_>,
    workspace: &mut Workspace,
    accumulate: bool,
) -> SimResult<()> {
    let (last, rest) = match steps.split_last() {
        Some(split) => split,
        None => {
            copy_into(input, output, accumulate);
            return Ok(());
        }
    };
    let Some((first, middle)) = rest.split_first() else {
        return last.execute(input, output, workspace, accumulate);
    };

    let len = input.len();
    let mut front = workspace.take(len)?;
    first.execute(input, StridedViewMut::new(&mut front), workspace, false)?;

    let mut back = if middle.is_empty() {
        Vec::new()
    } else {
        workspace.take(len)?
    };
    for step in middle {
        step.execute(
            StridedView::new(&front),
            StridedViewMut::new(&mut back),
            workspace,
            false,
        )?;
        std::mem::swap(&mut front, &mut back);
    }

    last.execute(StridedView::new(&front), output, workspace, accumulate)?;
    workspace.give(front);
    workspace.give(back);
    Ok(())
}

fn apply_leaf(
    matrix: &Matrix,
    input: StridedView<'_>,
    mut output: StridedViewMut<'_>,
    accumulate: bool,
) {
    if matrix.nrows() == 2 {
        let (x0, x1) = (input.get(0), input.get(1));
        output.write(0, matrix[[0, 0]] * x0 + matrix[[0, 1]] * x1, accumulate);
        output.write(1, matrix[[1, 0]] * x0 + matrix[[1, 1]] * x1, accumulate);
        return;
    }

    for (i, row) in matrix.rows().into_iter().enumerate() {
        let value: Complex64 = row
            .iter()
            .enumerate()
            .map(|(j, &entry)| entry * input.get(j))
            .sum();
        output.write(i, value, accumulate);
    }
}

fn copy_into(input: StridedView<'_>, mut output: StridedViewMut<'_>, accumulate: bool) {
    for k in 0..input.len() {
        output.write(k, input.get(k), accumulate);
    }
}

/// Collects the factors of nested `kind` nodes, left to right.
fn collect_factors<'n>(node: &'n Node, kind: NodeType, out: &mut Vec<&'n Node>) {
    if node.node_type() == kind {
        for child in node.children() {
            collect_factors(child, kind, out);
        }
    } else {
        out.push(node);
    }
}

/// Evaluates trees against statevectors within a qubit limit.
#[derive(Debug, Clone)]
pub struct Evaluator {
    max_qubits: u32,
}

impl Evaluator {
    /// Create an evaluator with the configured qubit limit.
    pub fn new(config: &SimConfig) -> Self {
        Self::with_max_qubits(config.max_qubits)
    }

    /// Create an evaluator that rejects trees wider than `max_qubits`.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self { max_qubits }
    }

    /// The qubit limit.
    pub fn max_qubits(&self) -> u32 {
        self.max_qubits
    }

    /// Returns the statevector length for `tree`, or `TooManyQubits`.
    pub fn check_size(&self, tree: &Node) -> SimResult<usize> {
        let requested = tree.num_qubits();
        let too_many = SimError::TooManyQubits {
            requested,
            max: self.max_qubits,
        };
        if requested > self.max_qubits {
            return Err(too_many);
        }
        1usize.checked_shl(requested).ok_or(too_many)
    }

    /// Applies `tree` to `|0…0⟩`.
    #[instrument(skip(self, tree), fields(qubits = tree.num_qubits()))]
    pub fn compute_statevector(&self, tree: &Node) -> SimResult<Statevector> {
        let dim = self.check_size(tree)?;
        let mut input = zeroed(dim, "input statevector")?;
        input[0] = ONE;
        self.evaluate(tree, &input)
    }

    /// Applies `tree` to an arbitrary initial state.
    #[instrument(skip(self, tree, state), fields(qubits = tree.num_qubits()))]
    pub fn apply_to(&self, tree: &Node, state: &[Complex64]) -> SimResult<Statevector> {
        let dim = self.check_size(tree)?;
        if state.len() != dim {
            return Err(SimError::StateLengthMismatch {
                expected: dim,
                got: state.len(),
            });
        }
        self.evaluate(tree, state)
    }

    fn evaluate(&self, tree: &Node, input: &[Complex64]) -> SimResult<Statevector> {
        let dim = input.len();
        let mut output = zeroed(dim, "output statevector")?;
        let mut workspace = Workspace::with_buffers(dim, 2)?;

        let plan = Plan::new(tree);
        plan.apply(
            StridedView::new(input),
            StridedViewMut::new(&mut output),
            &mut workspace,
            false,
        )?;

        debug!(
            nodes = tree.node_count(),
            planned_leaves = plan.leaf_count(),
            scratch_buffers = workspace.buffers_allocated(),
            "Evaluation completed"
        );
        Ok(Statevector::from_parts(output, tree.num_qubits()))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

/// Applies `tree` to `|0…0⟩` with the default qubit limit.
///
/// The result has `2^num_qubits` amplitudes, with qubit 0 as the most
/// significant bit of the index.
pub fn compute_statevector(tree: &Node) -> SimResult<Vec<Complex64>> {
    Evaluator::default()
        .compute_statevector(tree)
        .map(Statevector::into_amplitudes)
}
