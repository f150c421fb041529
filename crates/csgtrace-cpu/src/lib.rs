use anyhow::Context;
use csgtrace::{PreparedScene, scene::Camera, scene::Scene, settings::RaytracerSettings};
use rayon::prelude::*;
use tracing::info;

use crate::color::SlotColor;
use crate::ray::{Ray, RaySlot};
use crate::shading::ShadingContext;

pub mod accumulate;
pub mod color;
pub mod csg;
pub mod intersect;
pub mod pipeline;
pub mod ray;
pub mod shading;
pub mod utils;


#[derive(Debug, Clone, Copy)]
pub struct CpuBackendSettings {
    pub num_threads: u32,
}

impl Default for CpuBackendSettings {
    fn default() -> Self {
        let num_threads = std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(1);
        CpuBackendSettings { num_threads }
    }
}

/// Final level-0 colors, row-major
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<SlotColor>,
}

pub fn generate_ray(camera: &Camera, x: usize, y: usize) -> Ray {
    Ray {
        origin: camera.position,
        direction: camera.direction(x, y),
    }
}

pub fn render(
    scene: &Scene,
    prepared: &PreparedScene,
    raytracer_settings: &RaytracerSettings,
    backend_settings: CpuBackendSettings,
) -> anyhow::Result<RenderOutput> {
    raytracer_settings.validate()?;

    let camera = &scene.camera;
    let width = camera.raster_width;
    let height = camera.raster_height;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(backend_settings.num_threads as usize)
        .build()
        .context("failed to create render thread pool")?;

    info!(
        width,
        height,
        ray_depth = raytracer_settings.max_ray_depth,
        threads = backend_settings.num_threads,
        "rendering"
    );

    let ctx = ShadingContext::new(&prepared.buffers, raytracer_settings);
    let pixels = pool.install(|| {
        let mut levels = pipeline::allocate_levels(camera.pixel_count(), raytracer_settings.max_ray_depth);

        levels[0].rays.par_iter_mut().enumerate().for_each(|(i, slot)| {
            let ray = generate_ray(camera, i % width, i / width);
            *slot = RaySlot::primary(ray.origin, ray.direction);
        });

        pipeline::trace(&mut levels, &ctx);
        levels.swap_remove(0).colors
    });

    Ok(RenderOutput { width, height, pixels })
}
