//! Flat, index-addressed form of a compiled scene.
//!
//! Primitives are numbered by a pre-order walk of the graph (left subtree
//! before right), and that index is the only identity a primitive has once
//! packed. Boolean nodes are numbered by the same walk, so the root
//! combination is always internal node 0. Every record is `Pod` so the
//! arrays can be handed to a device as raw bytes.

use bytemuck::{Pod, Zeroable};
use tracing::{debug, info_span};

use crate::compiler::{self, TreeMetrics};
use crate::error::{Error, Result};
use crate::geometry::{Matrix4x4, Transform, Vec3};
use crate::scene::{CsgOp, Node, NodeId, Primitive, Scene};

/// Reference to a child or parent in the linkage table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRef {
    Leaf(u32),
    Internal(u32),
}

impl LinkRef {
    /// Leaves are stored as `-(index + 1)`, internal nodes as their index
    pub fn encode(self) -> i32 {
        match self {
            LinkRef::Leaf(index) => -(index as i32) - 1,
            LinkRef::Internal(index) => index as i32,
        }
    }

    pub fn decode(value: i32) -> LinkRef {
        if value < 0 {
            LinkRef::Leaf((-(value + 1)) as u32)
        } else {
            LinkRef::Internal(value as u32)
        }
    }
}

pub const NO_PARENT: i32 = -1;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPrimitive {
    pub position: Vec3,
    pub radius: f32,
    pub material: u32,
    pub kind: u32,
    pub _pad: [u32; 2],
}

impl From<&Primitive> for GpuPrimitive {
    fn from(primitive: &Primitive) -> Self {
        GpuPrimitive {
            position: primitive.position,
            radius: primitive.radius,
            material: primitive.material,
            kind: primitive.kind.tag(),
            _pad: [0; 2],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub reflectivity: f32,
    pub refractivity: f32,
    pub refractive_index: f32,
    pub shininess: f32,
    pub color: Vec3,
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: Vec3,
    pub _pad0: f32,
    pub color: Vec3,
    pub _pad1: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLink {
    pub left: i32,
    pub right: i32,
    pub parent: i32,
    pub op: i32,
}

impl GpuLink {
    pub fn left(&self) -> LinkRef {
        LinkRef::decode(self.left)
    }

    pub fn right(&self) -> LinkRef {
        LinkRef::decode(self.right)
    }

    pub fn parent(&self) -> Option<u32> {
        (self.parent >= 0).then_some(self.parent as u32)
    }

    pub fn op(&self) -> Option<CsgOp> {
        CsgOp::from_code(self.op)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SceneConstants {
    pub ambient_color: Vec3,
    pub primitive_count: u32,
    pub ambient_intensity: Vec3,
    pub light_count: u32,
    pub root: i32,
    pub tree_height: u32,
    pub _pad: [u32; 2],
}

#[derive(Debug, Clone)]
pub struct SceneBuffers {
    pub primitives: Vec<GpuPrimitive>,
    // index-aligned with `primitives`
    pub forward_matrices: Vec<Matrix4x4>,
    pub inverse_matrices: Vec<Matrix4x4>,
    pub materials: Vec<GpuMaterial>,
    pub lights: Vec<GpuLight>,
    pub links: Vec<GpuLink>,
    pub constants: SceneConstants,
    pub metrics: TreeMetrics,
}

impl SceneBuffers {
    /// Packs a compiled scene. `metrics` must come from compiling `scene.graph`.
    pub fn build(scene: &Scene, metrics: TreeMetrics) -> SceneBuffers {
        let _span = info_span!("build_buffers").entered();

        let mut packer = Packer {
            scene,
            primitives: Vec::with_capacity(metrics.leaf_count as usize),
            forward_matrices: Vec::with_capacity(metrics.leaf_count as usize),
            inverse_matrices: Vec::with_capacity(metrics.leaf_count as usize),
            links: Vec::with_capacity(metrics.cmp_ops as usize),
        };
        let root = packer.visit(scene.root, NO_PARENT);

        debug_assert_eq!(packer.primitives.len(), metrics.leaf_count as usize);
        debug_assert_eq!(packer.links.len(), metrics.cmp_ops as usize);

        let materials: Vec<GpuMaterial> = scene
            .materials
            .iter()
            .map(|m| GpuMaterial {
                ambient: m.ambient,
                diffuse: m.diffuse,
                specular: m.specular,
                reflectivity: m.reflectivity,
                refractivity: m.refractivity,
                refractive_index: m.refractive_index,
                shininess: m.shininess,
                color: m.color,
                _pad: [0.0; 2],
            })
            .collect();

        let lights: Vec<GpuLight> = scene
            .lights
            .iter()
            .map(|l| GpuLight { position: l.position, _pad0: 0.0, color: l.color, _pad1: 0.0 })
            .collect();

        let constants = SceneConstants {
            ambient_color: scene.ambient.color,
            primitive_count: packer.primitives.len() as u32,
            ambient_intensity: scene.ambient.intensity,
            light_count: lights.len() as u32,
            root: root.encode(),
            tree_height: metrics.tree_height,
            _pad: [0; 2],
        };

        debug!(
            primitives = packer.primitives.len(),
            links = packer.links.len(),
            materials = materials.len(),
            lights = lights.len(),
            "scene buffers packed"
        );

        SceneBuffers {
            primitives: packer.primitives,
            forward_matrices: packer.forward_matrices,
            inverse_matrices: packer.inverse_matrices,
            materials,
            lights,
            links: packer.links,
            constants,
            metrics,
        }
    }

    pub fn root(&self) -> LinkRef {
        LinkRef::decode(self.constants.root)
    }

    pub fn primitive_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.primitives)
    }

    pub fn forward_matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.forward_matrices)
    }

    pub fn inverse_matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.inverse_matrices)
    }

    pub fn material_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.materials)
    }

    pub fn light_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lights)
    }

    pub fn link_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.links)
    }

    pub fn constant_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.constants)
    }

    /// Total size of every scene buffer
    pub fn byte_size(&self) -> u64 {
        [
            self.primitive_bytes(),
            self.forward_matrix_bytes(),
            self.inverse_matrix_bytes(),
            self.material_bytes(),
            self.light_bytes(),
            self.link_bytes(),
            self.constant_bytes(),
        ]
        .iter()
        .map(|b| b.len() as u64)
        .sum()
    }
}

struct Packer<'a> {
    scene: &'a Scene,
    primitives: Vec<GpuPrimitive>,
    forward_matrices: Vec<Matrix4x4>,
    inverse_matrices: Vec<Matrix4x4>,
    links: Vec<GpuLink>,
}

impl Packer<'_> {
    fn visit(&mut self, id: NodeId, parent: i32) -> LinkRef {
        match *self.scene.graph.node(id) {
            Node::Csg(csg) => {
                let index = self.links.len();
                self.links.push(GpuLink { left: 0, right: 0, parent, op: csg.op.code() });
                let left = self.visit(csg.left, index as i32);
                let right = self.visit(csg.right, index as i32);
                self.links[index].left = left.encode();
                self.links[index].right = right.encode();
                LinkRef::Internal(index as u32)
            }
            Node::CompiledTransform(compiled) => self.push_leaf(&compiled.leaf, compiled.transform),
            Node::Transform(_) => {
                let compiled = compiler::collapse_chain(&self.scene.graph, id);
                self.push_leaf(&compiled.leaf, compiled.transform)
            }
            Node::Primitive(primitive) => self.push_leaf(&primitive, Transform::identity()),
        }
    }

    fn push_leaf(&mut self, primitive: &Primitive, transform: Transform) -> LinkRef {
        let index = self.primitives.len() as u32;
        self.primitives.push(primitive.into());
        self.forward_matrices.push(transform.forward);
        self.inverse_matrices.push(transform.inverse);
        LinkRef::Leaf(index)
    }
}

/// Bytes needed for one render: every level's ray and color buffers plus the scene buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEstimate {
    pub level_bytes: u64,
    pub scene_bytes: u64,
}

// origin, direction and color, four floats each
pub const BYTES_PER_SLOT: u64 = 3 * 16;

impl MemoryEstimate {
    pub fn new(pixel_count: usize, ray_depth: u32, scene_bytes: u64) -> Result<MemoryEstimate> {
        let overflow = || Error::InvalidSetting(format!(
            "level buffers for {pixel_count} pixels at depth {ray_depth} overflow"
        ));

        let mut level_bytes: u64 = 0;
        for k in 0..ray_depth {
            let slots = (pixel_count as u64)
                .checked_mul(1u64.checked_shl(k).ok_or_else(overflow)?)
                .ok_or_else(overflow)?;
            let bytes = slots.checked_mul(BYTES_PER_SLOT).ok_or_else(overflow)?;
            level_bytes = level_bytes.checked_add(bytes).ok_or_else(overflow)?;
        }

        Ok(MemoryEstimate { level_bytes, scene_bytes })
    }

    pub fn total(&self) -> u64 {
        self.level_bytes.saturating_add(self.scene_bytes)
    }

    pub fn check(&self, limit: Option<u64>) -> Result<()> {
        match limit {
            Some(limit) if self.total() > limit => {
                Err(Error::MemoryBudget { required: self.total(), limit })
            }
            _ => Ok(()),
        }
    }
}
