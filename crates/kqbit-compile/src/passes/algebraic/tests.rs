//! Tests for algebraic passes.

use kqbit_ir::matrix::{self, Matrix};
use kqbit_ir::{Gate, Node, NodeKind, NodeType, identity_tree};

use crate::pass::Pass;

use super::{
    FactoriseSum, FactoriseTensor, ProductFusion, SumFusion, TensorFusion, factorise_sum,
    factorise_tensor, product_fusion, sum_fusion, tensor_fusion,
};

fn dense(node: &Node) -> Matrix {
    let children = node.children().iter().map(dense);
    match node.kind() {
        NodeKind::Leaf(m) => m.clone(),
        NodeKind::Sum(_) => children.reduce(|a, b| matrix::add(&a, &b)).unwrap(),
        NodeKind::Product(_) => children.reduce(|a, b| matrix::multiply(&a, &b)).unwrap(),
        NodeKind::Tensor(_) => children.reduce(|a, b| matrix::kron(&a, &b)).unwrap(),
    }
}

fn assert_same_operator(a: &Node, b: &Node) {
    let (da, db) = (dense(a), dense(b));
    assert_eq!(da.dim(), db.dim());
    let worst = da
        .iter()
        .zip(db.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0_f64, f64::max);
    assert!(worst < 1e-12, "operators differ by {worst}");
}

// ----------------------------------------------------------------------------
// factorise_tensor
// ----------------------------------------------------------------------------

#[test]
fn test_factorise_tensor_aligned() {
    let tree = Node::product(
        Node::tensor(Gate::X.leaf(), Gate::Y.leaf()),
        Node::tensor(Gate::Z.leaf(), Gate::H.leaf()),
    );
    let out = factorise_tensor(tree.clone());

    assert_eq!(out.node_type(), NodeType::Tensor);
    assert_eq!(out.children().len(), 2);
    assert!(out.children()[0].approx_eq(&Node::product(Gate::X.leaf(), Gate::Z.leaf())));
    assert!(out.children()[1].approx_eq(&Node::product(Gate::Y.leaf(), Gate::H.leaf())));
    assert_same_operator(&tree, &out);
}

#[test]
fn test_factorise_tensor_requires_same_arity() {
    let tree = Node::product(
        Node::tensor(Gate::X.leaf(), identity_tree(2)),
        Node::tensor_list(vec![Gate::I.leaf(), Gate::I.leaf(), Gate::Z.leaf()]),
    );
    let out = factorise_tensor(tree.clone());
    assert!(out.approx_eq(&tree));
}

#[test]
fn test_factorise_tensor_requires_same_positional_widths() {
    let tree = Node::product(
        Node::tensor(Gate::X.leaf(), identity_tree(2)),
        Node::tensor(identity_tree(2), Gate::X.leaf()),
    );
    let out = factorise_tensor(tree.clone());
    assert_eq!(out.node_type(), NodeType::Product);
    assert!(out.approx_eq(&tree));
}

#[test]
fn test_factorise_tensor_recurses_into_columns() {
    let tree = Node::product(
        Node::tensor(Node::tensor(Gate::X.leaf(), Gate::Y.leaf()), Gate::Z.leaf()),
        Node::tensor(Node::tensor(Gate::H.leaf(), Gate::I.leaf()), Gate::Z.leaf()),
    );
    let out = factorise_tensor(tree.clone());

    assert_eq!(out.node_type(), NodeType::Tensor);
    let left = &out.children()[0];
    assert_eq!(left.node_type(), NodeType::Tensor);
    assert_eq!(left.children()[0].node_type(), NodeType::Product);
    assert_same_operator(&tree, &out);
}

#[test]
fn test_factorise_tensor_ignores_mixed_products() {
    let tree = Node::product(
        Node::tensor(Gate::X.leaf(), Gate::Y.leaf()),
        Node::sum(
            Node::tensor(Gate::P0.leaf(), Gate::I.leaf()),
            Node::tensor(Gate::P1.leaf(), Gate::X.leaf()),
        ),
    );
    let out = FactoriseTensor.run(tree.clone());
    assert!(out.approx_eq(&tree));
}

// ----------------------------------------------------------------------------
// factorise_sum
// ----------------------------------------------------------------------------

#[test]
fn test_factorise_sum_prefix() {
    let tree = Node::sum(
        Node::tensor(Gate::H.leaf(), Gate::P0.leaf()),
        Node::tensor(Gate::H.leaf(), Gate::P1.leaf()),
    );
    let out = factorise_sum(tree.clone());

    assert_eq!(out.node_type(), NodeType::Tensor);
    assert!(out.children()[0].approx_eq(&Gate::H.leaf()));
    assert_eq!(out.children()[1].node_type(), NodeType::Sum);
    assert_same_operator(&tree, &out);
}

#[test]
fn test_factorise_sum_prefix_only_controlled_layer() {
    // Control on qubit 1, target on qubit 2: qubit 0 is idle in both terms.
    let tree = Node::sum(
        Node::tensor_list(vec![Gate::I.leaf(), Gate::P0.leaf(), Gate::I.leaf()]),
        Node::tensor_list(vec![Gate::I.leaf(), Gate::P1.leaf(), Gate::X.leaf()]),
    );
    let out = factorise_sum(tree.clone());

    assert_eq!(out.children().len(), 2);
    assert!(out.children()[0].is_identity());
    let middle = &out.children()[1];
    assert_eq!(middle.node_type(), NodeType::Sum);
    assert!(middle.children().iter().all(|t| t.num_qubits() == 2));
    assert_same_operator(&tree, &out);
}

#[test]
fn test_factorise_sum_suffix() {
    let tree = Node::sum(
        Node::tensor_list(vec![
            Gate::P0.leaf(),
            Gate::I.leaf(),
            Gate::I.leaf(),
            Gate::I.leaf(),
        ]),
        Node::tensor_list(vec![
            Gate::P1.leaf(),
            Gate::I.leaf(),
            Gate::X.leaf(),
            Gate::I.leaf(),
        ]),
    );
    let out = FactoriseSum.run(tree.clone());

    assert_eq!(out.node_type(), NodeType::Tensor);
    assert_eq!(out.children().len(), 2);
    assert_eq!(out.children()[0].num_qubits(), 3);
    assert!(out.children()[1].is_identity());
    assert_same_operator(&tree, &out);
}

#[test]
fn test_factorise_sum_leaves_equal_terms() {
    let term = Node::tensor(Gate::H.leaf(), Gate::X.leaf());
    let tree = Node::sum(term.clone(), term);
    let out = factorise_sum(tree.clone());
    assert_eq!(out.node_type(), NodeType::Sum);
    assert!(out.approx_eq(&tree));
}

// ----------------------------------------------------------------------------
// Fusion
// ----------------------------------------------------------------------------

#[test]
fn test_product_fusion_chain() {
    let tree = Node::product_list(vec![Gate::X.leaf(), Gate::Z.leaf(), Gate::H.leaf()]);
    let out = ProductFusion.run(tree.clone());
    assert!(out.is_leaf());
    assert_same_operator(&tree, &out);
}

#[test]
fn test_product_fusion_stops_at_operators() {
    let tree = Node::product_list(vec![
        Gate::X.leaf(),
        Node::sum(Gate::P0.leaf(), Gate::P1.leaf()),
        Gate::Z.leaf(),
        Gate::S.leaf(),
    ]);
    let out = product_fusion(tree.clone());
    assert_eq!(out.children().len(), 3);
    assert_eq!(out.children()[1].node_type(), NodeType::Sum);
    assert_same_operator(&tree, &out);
}

#[test]
fn test_hh_fuses_to_identity() {
    let out = product_fusion(Node::product(Gate::H.leaf(), Gate::H.leaf()));
    let m = out.as_leaf().unwrap();
    assert!(m.iter().zip(matrix::identity(2).iter()).all(|(a, b)| (a - b).norm() < 1e-12));
}

#[test]
fn test_sum_fusion_projectors() {
    let out = SumFusion.run(Node::sum(Gate::P0.leaf(), Gate::P1.leaf()));
    assert!(out.is_leaf());
    assert!(out.is_identity());
}

#[test]
fn test_sum_fusion_inside_tensor() {
    let tree = Node::tensor(
        Gate::H.leaf(),
        Node::sum_list(vec![Gate::P0.leaf(), Gate::P01.leaf(), Gate::P1.leaf()]),
    );
    let out = sum_fusion(tree.clone());
    assert_eq!(out.node_type(), NodeType::Tensor);
    assert!(out.children()[1].is_leaf());
    assert_same_operator(&tree, &out);
}

#[test]
fn test_tensor_fusion_respects_width() {
    let tree = Node::tensor_list(vec![Gate::X.leaf(), Gate::Y.leaf(), Gate::Z.leaf()]);

    let pairs = tensor_fusion(tree.clone(), 2);
    assert_eq!(pairs.children().len(), 2);
    assert_eq!(pairs.children()[0].num_qubits(), 2);
    assert_same_operator(&tree, &pairs);

    let whole = TensorFusion::new(3).run(tree.clone());
    assert!(whole.is_leaf());
    assert_eq!(whole.num_qubits(), 3);
    assert_same_operator(&tree, &whole);
}

#[test]
fn test_tensor_fusion_disabled_below_two_qubits() {
    let pass = TensorFusion::new(0);
    assert_eq!(pass.max_qubits(), 1);
    assert!(!pass.should_run(&identity_tree(4)));
    assert_eq!(TensorFusion::default().max_qubits(), 2);
}
