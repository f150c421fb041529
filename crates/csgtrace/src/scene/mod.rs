mod builder;
mod camera;
mod graph;
mod light;
mod material;
mod primitive;

pub use builder::SceneBuilder;
pub use camera::{Camera, DEFAULT_FOV};
pub use graph::{
    CompiledTransform, CsgNode, CsgOp, Node, NodeId, SceneGraph, TransformNode, TransformOp,
};
pub use light::LightSource;
pub use material::{DEFAULT_MATERIAL, DEFAULT_MATERIAL_NAME, Material, MaterialId, MaterialRegistry};
pub use primitive::{Primitive, PrimitiveKind};

use crate::geometry::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Sky color at the zenith
    pub color: Vec3,
    /// Multiplied with each material's ambient coefficient
    pub intensity: Vec3,
}

/// A fully interpreted scene: the graph plus everything the renderer needs
/// around it. Immutable once built, apart from compilation rewriting the graph.
#[derive(Debug, Clone)]
pub struct Scene {
    pub graph: SceneGraph,
    pub root: NodeId,
    pub materials: MaterialRegistry,
    pub lights: Vec<LightSource>,
    pub camera: Camera,
    pub ambient: AmbientLight,
    pub ray_depth: u32,
}
