//! Flattening pass over the scene graph.
//!
//! Every chain of consecutive transform nodes collapses into a single
//! `CompiledTransform` holding the composed matrix pair and the primitive at
//! the bottom of the chain. Boolean nodes keep their shape; their children are
//! rewritten in place. The pass also measures the tree so the buffer builder
//! can size its arrays up front.

use tracing::{debug, info_span};

use crate::geometry::Transform;
use crate::scene::{CompiledTransform, Node, NodeId, SceneGraph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeMetrics {
    /// Deepest level reached, root at zero; a collapsed transform chain
    /// counts as one level below its parent whatever its length
    pub tree_height: u32,
    /// Number of boolean nodes, counted once per path reaching them
    pub cmp_ops: u32,
    /// Number of primitive leaves, counted once per path reaching them
    pub leaf_count: u32,
}

/// Compiles the graph below `root` in place and returns its metrics.
/// Running it again on a compiled graph changes nothing and yields the same metrics.
pub fn compile(graph: &mut SceneGraph, root: NodeId) -> TreeMetrics {
    let _span = info_span!("compile").entered();

    let mut metrics = TreeMetrics::default();
    compile_node(graph, root, 0, &mut metrics);

    debug!(?metrics, "scene graph compiled");
    metrics
}

fn compile_node(graph: &mut SceneGraph, id: NodeId, depth: u32, metrics: &mut TreeMetrics) {
    match *graph.node(id) {
        Node::Csg(csg) => {
            metrics.cmp_ops += 1;
            metrics.tree_height = metrics.tree_height.max(depth);
            compile_node(graph, csg.left, depth + 1, metrics);
            compile_node(graph, csg.right, depth + 1, metrics);
        }
        Node::Transform(_) => {
            let compiled = collapse_chain(graph, id);
            graph.replace(id, Node::CompiledTransform(compiled));
            record_leaf(metrics, depth + 1);
        }
        Node::CompiledTransform(_) => record_leaf(metrics, depth + 1),
        Node::Primitive(_) => record_leaf(metrics, depth),
    }
}

fn record_leaf(metrics: &mut TreeMetrics, height: u32) {
    metrics.leaf_count += 1;
    metrics.tree_height = metrics.tree_height.max(height);
}

// walks from the outermost transform down to the primitive, so each local
// transform is applied before everything above it
pub(crate) fn collapse_chain(graph: &SceneGraph, head: NodeId) -> CompiledTransform {
    let mut accumulated = Transform::identity();
    let mut current = head;
    loop {
        match *graph.node(current) {
            Node::Transform(transform) => {
                let local = transform.op.local_transform(transform.params);
                accumulated = local.compose(accumulated);
                current = transform.child;
            }
            Node::CompiledTransform(compiled) => {
                return CompiledTransform {
                    transform: compiled.transform.compose(accumulated),
                    leaf: compiled.leaf,
                };
            }
            Node::Primitive(leaf) => {
                return CompiledTransform { transform: accumulated, leaf };
            }
            // rejected when the transform node was created
            Node::Csg(_) => unreachable!("transform chain ends in a boolean node"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;
    use crate::geometry::{Matrix4x4, Vec3};
    use crate::scene::{CsgOp, Primitive, TransformOp};

    fn sphere(graph: &mut SceneGraph) -> NodeId {
        graph.add_primitive(Primitive::sphere(Vec3::zero(), 1.0, 0))
    }

    #[test]
    fn chain_collapses_to_single_node() {
        let ops = [
            (TransformOp::Scale, Vec3(2.0, 1.0, 0.5)),
            (TransformOp::RotateX, Vec3(0.4, 0.0, 0.0)),
            (TransformOp::Translate, Vec3(1.0, -3.0, 2.0)),
            (TransformOp::RotateZ, Vec3(PI / 5.0, 0.0, 0.0)),
            (TransformOp::RotateY, Vec3(-1.1, 0.0, 0.0)),
        ];
        for k in 0..=ops.len() {
            let mut graph = SceneGraph::new();
            let leaf = sphere(&mut graph);
            let mut head = leaf;
            // innermost op is created first
            for &(op, params) in &ops[..k] {
                head = graph.add_transform(op, params, head).unwrap();
            }
            compile(&mut graph, head);

            if k == 0 {
                assert!(matches!(graph.node(head), Node::Primitive(_)));
                continue;
            }
            let Node::CompiledTransform(compiled) = *graph.node(head) else {
                panic!("chain of {k} transforms was not collapsed");
            };
            assert_eq!(compiled.leaf, Primitive::sphere(Vec3::zero(), 1.0, 0));

            // root-to-leaf product of the local matrices
            let expected = ops[..k].iter().rev().fold(Matrix4x4::identity(), |acc, &(op, params)| {
                Matrix4x4::matmul(acc, op.local_transform(params).forward)
            });
            assert!(compiled.transform.forward.approx_eq(&expected, 1e-5));
            let product = Matrix4x4::matmul(compiled.transform.forward, compiled.transform.inverse);
            assert!(product.approx_eq(&Matrix4x4::identity(), 1e-4));
        }
    }

    #[test]
    fn outer_transform_applies_last() {
        let mut graph = SceneGraph::new();
        let leaf = sphere(&mut graph);
        let scaled = graph.add_transform(TransformOp::Scale, Vec3(2.0, 2.0, 2.0), leaf).unwrap();
        let moved = graph.add_transform(TransformOp::Translate, Vec3(1.0, 0.0, 0.0), scaled).unwrap();
        compile(&mut graph, moved);

        let Node::CompiledTransform(compiled) = *graph.node(moved) else {
            panic!("not collapsed");
        };
        assert_eq!(compiled.transform.apply_point(Vec3(1.0, 0.0, 0.0)), Vec3(3.0, 0.0, 0.0));
    }

    #[test]
    fn metrics_count_operations_and_levels() {
        let mut graph = SceneGraph::new();
        let a = sphere(&mut graph);
        let b = sphere(&mut graph);
        let b = graph.add_transform(TransformOp::Translate, Vec3(0.5, 0.0, 0.0), b).unwrap();
        let b = graph.add_transform(TransformOp::Scale, Vec3(0.5, 0.5, 0.5), b).unwrap();
        let c = sphere(&mut graph);
        let ab = graph.add_csg(CsgOp::Subtraction, a, b);
        let root = graph.add_csg(CsgOp::Union, ab, c);

        let metrics = compile(&mut graph, root);
        assert_eq!(metrics, TreeMetrics { tree_height: 3, cmp_ops: 2, leaf_count: 3 });
    }

    #[test]
    fn chains_add_one_level() {
        let mut graph = SceneGraph::new();
        let a = sphere(&mut graph);
        let a = graph.add_transform(TransformOp::Translate, Vec3(1.0, 0.0, 0.0), a).unwrap();
        let b = sphere(&mut graph);
        let b = graph.add_transform(TransformOp::Translate, Vec3(-1.0, 0.0, 0.0), b).unwrap();
        let b = graph.add_transform(TransformOp::RotateY, Vec3(0.5, 0.0, 0.0), b).unwrap();
        let root = graph.add_csg(CsgOp::Union, a, b);

        let metrics = compile(&mut graph, root);
        assert_eq!(metrics.tree_height, 2);
    }

    #[test]
    fn recompiling_is_a_no_op() {
        let mut graph = SceneGraph::new();
        let a = sphere(&mut graph);
        let a = graph.add_transform(TransformOp::RotateX, Vec3(1.0, 0.0, 0.0), a).unwrap();
        let b = sphere(&mut graph);
        let root = graph.add_csg(CsgOp::Intersection, a, b);

        let first = compile(&mut graph, root);
        let snapshot = graph.clone();
        let second = compile(&mut graph, root);
        assert_eq!(first, second);
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn shared_nodes_count_per_path() {
        let mut graph = SceneGraph::new();
        let a = sphere(&mut graph);
        let a = graph.add_transform(TransformOp::Scale, Vec3(1.0, 2.0, 1.0), a).unwrap();
        let root = graph.add_csg(CsgOp::Union, a, a);
        let metrics = compile(&mut graph, root);
        assert_eq!(metrics.leaf_count, 2);
        assert_eq!(metrics.cmp_ops, 1);
    }
}
