use std::collections::HashMap;

use crate::geometry::Vec3;

/// Index into the owning registry; ids are dense and start at zero
pub type MaterialId = u32;

pub const DEFAULT_MATERIAL_NAME: &str = "null";
pub const DEFAULT_MATERIAL: MaterialId = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub reflectivity: f32,
    pub refractivity: f32,
    pub refractive_index: f32,
    pub shininess: f32,
    pub color: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            ambient: 0.1,
            diffuse: 0.2,
            specular: 0.2,
            reflectivity: 0.6,
            refractivity: 0.4,
            refractive_index: 1.5,
            shininess: 1.0,
            color: Vec3(1.0, 1.0, 1.0),
        }
    }
}

/// Owns every material of a scene. Redeclaring a name registers a new
/// material and rebinds the name; objects keep the id they were given.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
    names: HashMap<String, MaterialId>,
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        MaterialRegistry::new()
    }
}

impl MaterialRegistry {
    pub fn new() -> Self {
        let mut registry = MaterialRegistry { materials: Vec::new(), names: HashMap::new() };
        registry.declare(DEFAULT_MATERIAL_NAME, Material::default());
        registry
    }

    pub fn declare(&mut self, name: &str, material: Material) -> MaterialId {
        let id = self.materials.len() as MaterialId;
        self.materials.push(material);
        self.names.insert(name.to_owned(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<MaterialId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Materials in id order
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }
}
