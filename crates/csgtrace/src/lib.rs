pub mod buffers;
pub mod compiler;
pub mod error;
pub mod geometry;
pub mod parser;
pub mod scene;
pub mod settings;

pub use error::{Error, Result};

use buffers::{MemoryEstimate, SceneBuffers};
use scene::Scene;
use settings::RaytracerSettings;
use tracing::info;

/// Everything a backend needs for one render
#[derive(Debug, Clone)]
pub struct PreparedScene {
    pub buffers: SceneBuffers,
    pub memory: MemoryEstimate,
}

/// Compiles the scene graph, packs the device buffers and checks the
/// estimated footprint against the configured budget.
pub fn prepare(scene: &mut Scene, settings: &RaytracerSettings) -> Result<PreparedScene> {
    settings.validate()?;

    let metrics = compiler::compile(&mut scene.graph, scene.root);
    let buffers = SceneBuffers::build(scene, metrics);
    let memory = MemoryEstimate::new(scene.camera.pixel_count(), settings.max_ray_depth, buffers.byte_size())?;

    info!(
        tree_height = metrics.tree_height,
        cmp_ops = metrics.cmp_ops,
        primitives = metrics.leaf_count,
        estimated_bytes = memory.total(),
        "scene prepared"
    );
    memory.check(settings.max_memory_bytes)?;

    Ok(PreparedScene { buffers, memory })
}
