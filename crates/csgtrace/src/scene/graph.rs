//! Scene graph as an arena of nodes.
//!
//! Nodes refer to each other by `NodeId`, so a named object can be reused by
//! any number of later combinations. Since a node can only reference nodes
//! created before it, the graph is always acyclic. The compiler treats a
//! shared node as a separate subtree along every path that reaches it.

use crate::error::{Error, Result};
use crate::geometry::{Transform, Vec3};

use super::{MaterialId, Primitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOp {
    Scale,
    RotateX,
    RotateY,
    RotateZ,
    Translate,
}

impl TransformOp {
    /// Local transform of a single op. Rotations read their angle (radians)
    /// from the first component of `params`.
    pub fn local_transform(self, params: Vec3) -> Transform {
        match self {
            TransformOp::Scale => Transform::scale(params),
            TransformOp::RotateX => Transform::rotate_x(params.0),
            TransformOp::RotateY => Transform::rotate_y(params.0),
            TransformOp::RotateZ => Transform::rotate_z(params.0),
            TransformOp::Translate => Transform::translate(params),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsgOp {
    Union,
    Intersection,
    Subtraction,
}

impl CsgOp {
    /// Operation code stored in the device linkage table
    pub fn code(self) -> i32 {
        match self {
            CsgOp::Union => 0,
            CsgOp::Intersection => 1,
            CsgOp::Subtraction => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<CsgOp> {
        match code {
            0 => Some(CsgOp::Union),
            1 => Some(CsgOp::Intersection),
            2 => Some(CsgOp::Subtraction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformNode {
    pub op: TransformOp,
    pub params: Vec3,
    pub child: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgNode {
    pub op: CsgOp,
    pub left: NodeId,
    pub right: NodeId,
}

/// A whole transform chain collapsed onto its leaf primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompiledTransform {
    pub transform: Transform,
    pub leaf: Primitive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    Primitive(Primitive),
    Transform(TransformNode),
    Csg(CsgNode),
    CompiledTransform(CompiledTransform),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        SceneGraph::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_primitive(&mut self, primitive: Primitive) -> NodeId {
        self.push(Node::Primitive(primitive))
    }

    /// Wraps `child` in a transform. Only primitives and other transforms can
    /// be transformed.
    pub fn add_transform(&mut self, op: TransformOp, params: Vec3, child: NodeId) -> Result<NodeId> {
        match self.node(child) {
            Node::Primitive(_) | Node::Transform(_) => {}
            Node::Csg(_) => {
                return Err(Error::Structural("a boolean combination cannot be transformed".to_owned()));
            }
            Node::CompiledTransform(_) => {
                return Err(Error::Structural("compiled transforms cannot be wrapped again".to_owned()));
            }
        }
        Ok(self.push(Node::Transform(TransformNode { op, params, child })))
    }

    pub fn add_csg(&mut self, op: CsgOp, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::Csg(CsgNode { op, left, right }))
    }

    /// Reassigns the material of a primitive, or of the leaf of a transform chain.
    pub fn set_material(&mut self, id: NodeId, material: MaterialId) -> Result<()> {
        let mut current = id;
        loop {
            match &mut self.nodes[current.0] {
                Node::Primitive(primitive) => {
                    primitive.material = material;
                    return Ok(());
                }
                Node::CompiledTransform(compiled) => {
                    compiled.leaf.material = material;
                    return Ok(());
                }
                Node::Transform(transform) => current = transform.child,
                Node::Csg(_) => {
                    return Err(Error::Structural(
                        "a material cannot be assigned to a boolean combination".to_owned(),
                    ));
                }
            }
        }
    }

    pub(crate) fn replace(&mut self, id: NodeId, node: Node) {
        self.nodes[id.0] = node;
    }
}
