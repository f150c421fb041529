//! I/O utilities for generated output, shared between command-line driver and test code

use std::path::Path;

use anyhow::Context;

use crate::RenderOutput;

/// 8-bit RGB bytes, channels clamped to [0, 1]; the weight channel is dropped
pub fn to_rgb8(output: &RenderOutput) -> Vec<u8> {
    output
        .pixels
        .iter()
        .flat_map(|c| {
            let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            [channel(c.rgb.x()), channel(c.rgb.y()), channel(c.rgb.z())]
        })
        .collect()
}

pub fn save_png(output: &RenderOutput, output_path: &Path) -> anyhow::Result<()> {
    let bytes = to_rgb8(output);
    image::save_buffer_with_format(
        output_path,
        &bytes,
        output.width as u32,
        output.height as u32,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("failed to write {}", output_path.display()))
}
