use std::path::PathBuf;

use csgtrace::settings::{IntersectionMode, NameResolution};

#[derive(Debug, clap::Parser)]
#[command(about = "Render a CSG scene description to a PNG image")]
pub struct CommandLineArguments {
    #[arg(default_value = "input.rti", help = "Scene description file")]
    pub scene_path: PathBuf,

    #[arg(short, long, default_value = "output.png", help = "Output PNG file")]
    pub output: PathBuf,

    #[arg(short = 't', long = "threads", help = "CPU worker threads")]
    pub num_threads: Option<u32>,
    #[arg(short = 'd', long, help = "Override the scene's ray depth (bounce levels)")]
    pub ray_depth: Option<u32>,

    #[arg(long, help = "Report the closest primitive hit, ignoring boolean operations")]
    pub flat_scan: bool,
    #[arg(long, help = "Skip commands naming undeclared objects instead of failing")]
    pub lenient_names: bool,

    #[arg(long, help = "Refuse to render if level and scene buffers exceed this many MiB")]
    pub max_memory_mib: Option<u64>,
    #[arg(long, help = "Print the memory estimate and exit without rendering")]
    pub estimate_only: bool,
}

impl CommandLineArguments {
    pub fn intersection_mode(&self) -> IntersectionMode {
        if self.flat_scan {
            IntersectionMode::FlatScan
        } else {
            IntersectionMode::CsgTree
        }
    }

    pub fn name_resolution(&self) -> NameResolution {
        if self.lenient_names {
            NameResolution::Lenient
        } else {
            NameResolution::Strict
        }
    }
}
