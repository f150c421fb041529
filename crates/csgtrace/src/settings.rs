use crate::error::{Error, Result};
use crate::scene::Scene;

pub const DEFAULT_RAY_DEPTH: u32 = 3;
pub const DEFAULT_SHADOW_BIAS: f32 = 1e-3;
// level k holds W*H*2^k slots; keep the largest level addressable
pub const MAX_RAY_DEPTH: u32 = 24;

/// How the closest hit along a ray is found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntersectionMode {
    /// Walk the boolean-combination tree
    #[default]
    CsgTree,
    /// Test every primitive and keep the nearest hit, ignoring CSG operations
    FlatScan,
}

/// What happens when a scene refers to an object or material that was never declared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameResolution {
    #[default]
    Strict,
    /// Warn and skip the offending command
    Lenient,
}

#[derive(Debug, Clone, Copy)]
pub struct RaytracerSettings {
    pub max_ray_depth: u32,
    pub intersection_mode: IntersectionMode,
    pub shadow_bias: f32,
    pub max_memory_bytes: Option<u64>,
}

impl Default for RaytracerSettings {
    fn default() -> Self {
        RaytracerSettings {
            max_ray_depth: DEFAULT_RAY_DEPTH,
            intersection_mode: IntersectionMode::default(),
            shadow_bias: DEFAULT_SHADOW_BIAS,
            max_memory_bytes: None,
        }
    }
}

impl RaytracerSettings {
    pub fn for_scene(scene: &Scene) -> Self {
        RaytracerSettings {
            max_ray_depth: scene.ray_depth,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_ray_depth == 0 {
            return Err(Error::InvalidSetting("ray depth must be at least 1".to_owned()));
        }
        if self.max_ray_depth > MAX_RAY_DEPTH {
            return Err(Error::InvalidSetting(format!(
                "ray depth {} exceeds the maximum of {MAX_RAY_DEPTH}",
                self.max_ray_depth
            )));
        }
        if self.shadow_bias.is_nan() || self.shadow_bias < 0.0 {
            return Err(Error::InvalidSetting("shadow bias must be non-negative".to_owned()));
        }
        Ok(())
    }
}
