//! The operator expression tree.
//!
//! A [`Node`] is either a dense [`Leaf`](NodeKind::Leaf) matrix or one of
//! three operators over child nodes:
//!
//! - `Sum` adds its children, which all act on the same qubits;
//! - `Product` composes them as a matrix chain, so the last child acts first;
//! - `Tensor` takes their Kronecker product, with child 0 on the most
//!   significant qubits.
//!
//! Every constructor checks the dimension rules and panics on violation, so a
//! tree built through this API is always well formed. [`Node::validate`]
//! re-checks a whole tree and is used after rewrite passes in debug builds.

use std::fmt;

use crate::error::{IrError, IrResult};
use crate::matrix::{self, Matrix};

/// Variant tag of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Dense matrix.
    Leaf,
    /// Linear combination.
    Sum,
    /// Matrix-chain composition.
    Product,
    /// Kronecker product.
    Tensor,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Leaf => "LEAF",
            Self::Sum => "SUM",
            Self::Product => "PRODUCT",
            Self::Tensor => "TENSOR",
        })
    }
}

/// The three operator variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Linear combination.
    Sum,
    /// Matrix-chain composition.
    Product,
    /// Kronecker product.
    Tensor,
}

impl From<Operation> for NodeType {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Sum => Self::Sum,
            Operation::Product => Self::Product,
            Operation::Tensor => Self::Tensor,
        }
    }
}

/// Payload of a [`Node`].
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Dense `dim x dim` matrix.
    Leaf(Matrix),
    /// Children of a sum.
    Sum(Vec<Node>),
    /// Children of a product, leftmost first.
    Product(Vec<Node>),
    /// Children of a tensor product, most significant first.
    Tensor(Vec<Node>),
}

/// A node of the expression tree.
///
/// Nodes own their children outright. Cloning is a deep copy and dropping a
/// node releases its whole subtree.
#[derive(Debug, Clone)]
pub struct Node {
    num_qubits: u32,
    kind: NodeKind,
}

impl Node {
    /// Creates a leaf from a square matrix whose side is a power of two.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square, its side is not a power of two, or
    /// it is 1x1.
    pub fn leaf(matrix: Matrix) -> Self {
        let Some(num_qubits) = matrix::qubits_for(&matrix) else {
            panic!(
                "leaf matrix must be square with a power-of-two side of at least 2, got {:?}",
                matrix.dim()
            );
        };
        Self {
            num_qubits,
            kind: NodeKind::Leaf(matrix),
        }
    }

    /// Creates a leaf from a row-major buffer of `4^num_qubits` entries.
    ///
    /// The data is copied.
    ///
    /// # Panics
    ///
    /// Panics if `num_qubits` is zero or the buffer has the wrong length.
    pub fn leaf_from_slice(data: &[num_complex::Complex64], num_qubits: u32) -> Self {
        assert!(num_qubits >= 1, "a leaf acts on at least one qubit");
        let dim = 1usize
            .checked_shl(num_qubits)
            .unwrap_or_else(|| panic!("{num_qubits}-qubit leaf is too large"));
        assert_eq!(
            data.len(),
            dim * dim,
            "{num_qubits}-qubit leaf needs {} entries, got {}",
            dim * dim,
            data.len()
        );
        Self::leaf(Matrix::from_shape_fn((dim, dim), |(r, c)| data[r * dim + c]))
    }

    /// `left + right`.
    pub fn sum(left: Node, right: Node) -> Self {
        Self::operation(Operation::Sum, vec![left, right])
    }

    /// `left * right`; `right` acts first.
    pub fn product(left: Node, right: Node) -> Self {
        Self::operation(Operation::Product, vec![left, right])
    }

    /// `left ⊗ right`.
    pub fn tensor(left: Node, right: Node) -> Self {
        Self::operation(Operation::Tensor, vec![left, right])
    }

    /// Sum of a list of terms.
    pub fn sum_list(children: Vec<Node>) -> Self {
        Self::operation(Operation::Sum, children)
    }

    /// Product of a list of factors, leftmost first.
    pub fn product_list(children: Vec<Node>) -> Self {
        Self::operation(Operation::Product, children)
    }

    /// Tensor product of a list of factors, most significant first.
    pub fn tensor_list(children: Vec<Node>) -> Self {
        Self::operation(Operation::Tensor, children)
    }

    /// Builds an operator node, checking the dimension rules.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty, if Sum or Product children act on
    /// different numbers of qubits, or if a Tensor would exceed `u32` qubits.
    pub fn operation(op: Operation, children: Vec<Node>) -> Self {
        assert!(!children.is_empty(), "{op:?} node needs at least one child");

        let num_qubits = match op {
            Operation::Sum | Operation::Product => {
                let expected = children[0].num_qubits;
                if let Some((index, child)) = children
                    .iter()
                    .enumerate()
                    .find(|(_, child)| child.num_qubits != expected)
                {
                    panic!(
                        "{op:?} children must share a dimension: child {index} acts on {} qubits, expected {expected}",
                        child.num_qubits
                    );
                }
                expected
            }
            Operation::Tensor => children
                .iter()
                .try_fold(0u32, |acc, child| acc.checked_add(child.num_qubits))
                .unwrap_or_else(|| panic!("tensor product exceeds {} qubits", u32::MAX)),
        };

        let kind = match op {
            Operation::Sum => NodeKind::Sum(children),
            Operation::Product => NodeKind::Product(children),
            Operation::Tensor => NodeKind::Tensor(children),
        };
        Self { num_qubits, kind }
    }

    /// Number of qubits this node acts on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Side length of the operator, `2^num_qubits`.
    ///
    /// # Panics
    ///
    /// Panics if the dimension does not fit in `usize`.
    #[inline]
    pub fn dim(&self) -> usize {
        1usize
            .checked_shl(self.num_qubits)
            .unwrap_or_else(|| panic!("{}-qubit dimension overflows usize", self.num_qubits))
    }

    /// The node payload.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The variant tag.
    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Leaf(_) => NodeType::Leaf,
            NodeKind::Sum(_) => NodeType::Sum,
            NodeKind::Product(_) => NodeType::Product,
            NodeKind::Tensor(_) => NodeType::Tensor,
        }
    }

    /// The operator variant, or `None` for a leaf.
    pub fn operation_type(&self) -> Option<Operation> {
        match self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Sum(_) => Some(Operation::Sum),
            NodeKind::Product(_) => Some(Operation::Product),
            NodeKind::Tensor(_) => Some(Operation::Tensor),
        }
    }

    /// Whether this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Children of an operator node; empty for a leaf.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Sum(children) | NodeKind::Product(children) | NodeKind::Tensor(children) => {
                children
            }
        }
    }

    /// The leaf matrix, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&Matrix> {
        match &self.kind {
            NodeKind::Leaf(matrix) => Some(matrix),
            _ => None,
        }
    }

    /// Moves the children out of an operator node.
    ///
    /// A leaf is handed back unchanged as the error value.
    pub fn into_operator(self) -> Result<(Operation, Vec<Node>), Node> {
        match self.kind {
            NodeKind::Sum(children) => Ok((Operation::Sum, children)),
            NodeKind::Product(children) => Ok((Operation::Product, children)),
            NodeKind::Tensor(children) => Ok((Operation::Tensor, children)),
            NodeKind::Leaf(_) => Err(self),
        }
    }

    /// Moves the children out of an operator node; a leaf yields none.
    pub fn into_children(self) -> Vec<Node> {
        self.into_operator()
            .map(|(_, children)| children)
            .unwrap_or_default()
    }

    /// Rebuilds an operator node with every child passed through `f`.
    ///
    /// Leaves are returned unchanged.
    pub fn map_children<F>(self, f: F) -> Node
    where
        F: FnMut(Node) -> Node,
    {
        match self.into_operator() {
            Ok((op, children)) => Node::operation(op, children.into_iter().map(f).collect()),
            Err(leaf) => leaf,
        }
    }

    /// Whether this node is the identity operator.
    ///
    /// A Sum is never reported as identity, even if its terms add up to one.
    pub fn is_identity(&self) -> bool {
        match &self.kind {
            NodeKind::Leaf(m) => matrix::is_identity(m),
            NodeKind::Tensor(children) | NodeKind::Product(children) => {
                children.iter().all(Node::is_identity)
            }
            NodeKind::Sum(_) => false,
        }
    }

    /// Whether this node is the zero operator.
    pub fn is_zero(&self) -> bool {
        match &self.kind {
            NodeKind::Leaf(m) => matrix::is_zero(m),
            NodeKind::Tensor(children) | NodeKind::Product(children) => {
                children.iter().any(Node::is_zero)
            }
            NodeKind::Sum(children) => children.iter().all(Node::is_zero),
        }
    }

    /// Structural equality with leaf entries compared within
    /// [`EPSILON`](crate::EPSILON).
    pub fn approx_eq(&self, other: &Node) -> bool {
        if self.num_qubits != other.num_qubits || self.node_type() != other.node_type() {
            return false;
        }
        match (&self.kind, &other.kind) {
            (NodeKind::Leaf(a), NodeKind::Leaf(b)) => matrix::approx_eq(a, b),
            _ => {
                let (a, b) = (self.children(), other.children());
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.approx_eq(y))
            }
        }
    }

    /// Total number of nodes in the subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Node::node_count).sum::<usize>()
    }

    /// Height of the subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Number of leaves in the subtree.
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(_) => 1,
            _ => self.children().iter().map(Node::leaf_count).sum(),
        }
    }

    /// Checks every structural invariant of the subtree.
    ///
    /// Errors report the offending node as a child-index path from this node,
    /// e.g. `root.1.0`.
    pub fn validate(&self) -> IrResult<()> {
        let mut path = vec![];
        self.validate_at(&mut path)
    }

    fn validate_at(&self, path: &mut Vec<usize>) -> IrResult<()> {
        let render = |path: &[usize]| {
            std::iter::once("root".to_string())
                .chain(path.iter().map(usize::to_string))
                .collect::<Vec<_>>()
                .join(".")
        };

        let children = match &self.kind {
            NodeKind::Leaf(m) => {
                let expected = 1usize.checked_shl(self.num_qubits).unwrap_or(0);
                let (rows, cols) = m.dim();
                if rows != expected || cols != expected || self.num_qubits == 0 {
                    return Err(IrError::MalformedLeaf {
                        path: render(path),
                        rows,
                        cols,
                        expected,
                    });
                }
                if let Some(((row, col), _)) = m
                    .indexed_iter()
                    .find(|(_, v)| !v.re.is_finite() || !v.im.is_finite())
                {
                    return Err(IrError::NonFiniteEntry {
                        path: render(path),
                        row,
                        col,
                    });
                }
                return Ok(());
            }
            NodeKind::Sum(children) | NodeKind::Product(children) | NodeKind::Tensor(children) => {
                children
            }
        };

        let node_type = self.node_type();
        if children.is_empty() {
            return Err(IrError::EmptyOperator {
                node_type,
                path: render(path),
            });
        }

        let implied = match node_type {
            NodeType::Tensor => children.iter().map(|c| c.num_qubits).sum::<u32>(),
            _ => {
                let expected = children[0].num_qubits;
                if let Some((child, c)) = children
                    .iter()
                    .enumerate()
                    .find(|(_, c)| c.num_qubits != expected)
                {
                    return Err(IrError::DimensionMismatch {
                        node_type,
                        path: render(path),
                        child,
                        expected,
                        got: c.num_qubits,
                    });
                }
                expected
            }
        };
        if implied != self.num_qubits {
            return Err(IrError::QubitCountMismatch {
                node_type,
                path: render(path),
                recorded: self.num_qubits,
                implied,
            });
        }

        for (index, child) in children.iter().enumerate() {
            path.push(index);
            child.validate_at(path)?;
            path.pop();
        }
        Ok(())
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        write!(f, "{:width$}", "", width = indent * 2)?;
        match &self.kind {
            NodeKind::Leaf(m) => {
                let first = m[[0, 0]];
                writeln!(
                    f,
                    "LEAF (qubits: {}, dim: {}) [{:.2}{:+.2}i ...]",
                    self.num_qubits,
                    m.nrows(),
                    first.re,
                    first.im
                )
            }
            _ => {
                let children = self.children();
                writeln!(
                    f,
                    "{} (qubits: {}, dim: 2^{}, children: {})",
                    self.node_type(),
                    self.num_qubits,
                    self.num_qubits,
                    children.len()
                )?;
                for child in children {
                    child.write_tree(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
