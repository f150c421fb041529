use std::collections::HashMap;

use tracing::warn;

use crate::error::{Error, Result};
use crate::geometry::Vec3;
use crate::settings::NameResolution;

use super::{
    AmbientLight, Camera, CsgOp, LightSource, Material, MaterialId, MaterialRegistry, NodeId,
    Primitive, PrimitiveKind, Scene, SceneGraph, TransformOp, DEFAULT_MATERIAL,
};

/// Scene-build context. Owns the graph, the material registry and the
/// lights while commands are applied, and binds names to graph nodes.
#[derive(Debug)]
pub struct SceneBuilder {
    graph: SceneGraph,
    materials: MaterialRegistry,
    lights: Vec<LightSource>,
    light_names: HashMap<String, usize>,
    objects: HashMap<String, NodeId>,
    root: Option<NodeId>,
    name_resolution: NameResolution,
}

impl SceneBuilder {
    pub fn new(name_resolution: NameResolution) -> Self {
        SceneBuilder {
            graph: SceneGraph::new(),
            materials: MaterialRegistry::new(),
            lights: Vec::new(),
            light_names: HashMap::new(),
            objects: HashMap::new(),
            root: None,
            name_resolution,
        }
    }

    /// Once a root is submitted the object tree no longer changes
    pub fn is_locked(&self) -> bool {
        self.root.is_some()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn object(&self, name: &str) -> Option<NodeId> {
        self.objects.get(name).copied()
    }

    pub fn create_primitive(&mut self, name: &str, kind: PrimitiveKind) -> NodeId {
        let primitive = match kind {
            PrimitiveKind::Sphere => Primitive::sphere(Vec3::zero(), 1.0, DEFAULT_MATERIAL),
            PrimitiveKind::HalfPlane => Primitive::half_plane(Vec3::zero(), 1.0, DEFAULT_MATERIAL),
        };
        let id = self.graph.add_primitive(primitive);
        self.objects.insert(name.to_owned(), id);
        id
    }

    pub fn combine(&mut self, name: &str, op: CsgOp, left: &str, right: &str, line: usize) -> Result<()> {
        let Some(left) = self.resolve_object(left, line)? else {
            return Ok(());
        };
        let Some(right) = self.resolve_object(right, line)? else {
            return Ok(());
        };
        let id = self.graph.add_csg(op, left, right);
        self.objects.insert(name.to_owned(), id);
        Ok(())
    }

    /// Wraps the object bound to `name` and rebinds the name to the result.
    pub fn transform(&mut self, name: &str, op: TransformOp, params: Vec3, line: usize) -> Result<()> {
        let Some(child) = self.resolve_object(name, line)? else {
            return Ok(());
        };
        let id = self.graph.add_transform(op, params, child)?;
        self.objects.insert(name.to_owned(), id);
        Ok(())
    }

    pub fn set_material(&mut self, name: &str, material: &str, line: usize) -> Result<()> {
        let Some(object) = self.resolve_object(name, line)? else {
            return Ok(());
        };
        let Some(material) = self.resolve_material(material, line)? else {
            return Ok(());
        };
        self.graph.set_material(object, material)
    }

    pub fn submit(&mut self, name: &str, line: usize) -> Result<()> {
        if let Some(root) = self.resolve_object(name, line)? {
            self.root = Some(root);
        }
        Ok(())
    }

    /// Redeclaring a light replaces it in place
    pub fn declare_light(&mut self, name: &str, light: LightSource) {
        match self.light_names.get(name) {
            Some(&index) => self.lights[index] = light,
            None => {
                self.light_names.insert(name.to_owned(), self.lights.len());
                self.lights.push(light);
            }
        }
    }

    pub fn declare_material(&mut self, name: &str, material: Material) -> MaterialId {
        self.materials.declare(name, material)
    }

    pub fn build(self, camera: Camera, ambient: AmbientLight, ray_depth: u32) -> Result<Scene> {
        let root = self.root.ok_or(Error::MissingRoot)?;
        Ok(Scene {
            graph: self.graph,
            root,
            materials: self.materials,
            lights: self.lights,
            camera,
            ambient,
            ray_depth,
        })
    }

    fn resolve_object(&self, name: &str, line: usize) -> Result<Option<NodeId>> {
        match self.objects.get(name) {
            Some(&id) => Ok(Some(id)),
            None => self.undeclared(name, line),
        }
    }

    fn resolve_material(&self, name: &str, line: usize) -> Result<Option<MaterialId>> {
        match self.materials.lookup(name) {
            Some(id) => Ok(Some(id)),
            None => self.undeclared(name, line),
        }
    }

    fn undeclared<T>(&self, name: &str, line: usize) -> Result<Option<T>> {
        match self.name_resolution {
            NameResolution::Strict => Err(Error::UndeclaredName { line, name: name.to_owned() }),
            NameResolution::Lenient => {
                warn!(line, name, "undeclared name, skipping command");
                Ok(None)
            }
        }
    }
}
