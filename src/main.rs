use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use csgtrace::{parser::InterpreterOptions, settings::RaytracerSettings};
use csgtrace_cpu::{CpuBackendSettings, render, utils::save_png};

mod cli;

use cli::CommandLineArguments;

const MIB: u64 = 1024 * 1024;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli_args = CommandLineArguments::parse();

    let options = InterpreterOptions {
        name_resolution: cli_args.name_resolution(),
    };
    let mut scene = csgtrace::parser::load_scene(&cli_args.scene_path, options)
        .with_context(|| format!("failed to load scene {}", cli_args.scene_path.display()))?;

    // override scene settings
    let mut raytracer_settings = RaytracerSettings::for_scene(&scene);
    raytracer_settings.max_ray_depth = cli_args.ray_depth.unwrap_or(raytracer_settings.max_ray_depth);
    raytracer_settings.intersection_mode = cli_args.intersection_mode();
    raytracer_settings.max_memory_bytes = match cli_args.max_memory_mib {
        Some(mib) => Some(mib.checked_mul(MIB).context("memory limit too large")?),
        None => None,
    };

    let prepared = csgtrace::prepare(&mut scene, &raytracer_settings)?;

    if cli_args.estimate_only {
        let memory = prepared.memory;
        println!("level buffers: {} bytes", memory.level_bytes);
        println!("scene buffers: {} bytes", memory.scene_bytes);
        println!("total: {} bytes ({:.1} MiB)", memory.total(), memory.total() as f64 / MIB as f64);
        return Ok(());
    }

    let mut backend_settings = CpuBackendSettings::default();
    backend_settings.num_threads = cli_args.num_threads.unwrap_or(backend_settings.num_threads);

    let render_output = render(&scene, &prepared, &raytracer_settings, backend_settings)?;
    save_png(&render_output, &cli_args.output)?;
    info!(output = %cli_args.output.display(), "wrote image");

    Ok(())
}
