use std::f32::consts::FRAC_PI_2;

use crate::error::{Error, Result};
use crate::geometry::Vec3;

pub const DEFAULT_FOV: f32 = FRAC_PI_2;

/// Pinhole camera with a fixed vertical field of view.
///
/// `right` and `down` span the view plane; pixel (0, 0) is the top-left
/// corner of the image and rows are stored one after another.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub down: Vec3,
    pub raster_width: usize,
    pub raster_height: usize,
    // half extents of the view plane at distance 1
    half_width: f32,
    half_height: f32,
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, raster_width: usize, raster_height: usize) -> Result<Camera> {
        if raster_width == 0 || raster_height == 0 {
            return Err(Error::InvalidSetting(format!(
                "image size must be non-zero, got {raster_width}x{raster_height}"
            )));
        }

        let look = target - eye;
        if look.near_zero() {
            return Err(Error::InvalidSetting("eye position and look-at point coincide".to_owned()));
        }
        let forward = Vec3::normalized(look);

        let right = Vec3::cross(Vec3(0.0, -1.0, 0.0), forward);
        if right.length() < 1e-6 {
            return Err(Error::InvalidSetting("view direction is parallel to the world up axis".to_owned()));
        }
        let right = Vec3::normalized(right);
        let down = Vec3::cross(forward, right);

        let half_width = f32::tan(DEFAULT_FOV / 2.0);
        let half_height = half_width * (raster_height as f32 / raster_width as f32);

        Ok(Camera {
            position: eye,
            forward,
            right,
            down,
            raster_width,
            raster_height,
            half_width,
            half_height,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.raster_width * self.raster_height
    }

    /// Normalized direction through the center of pixel (x, y)
    pub fn direction(&self, x: usize, y: usize) -> Vec3 {
        let step_x = 2.0 * self.half_width / self.raster_width as f32;
        let step_y = 2.0 * self.half_height / self.raster_height as f32;
        let corner = self.forward - self.right * self.half_width - self.down * self.half_height;

        let p = corner
            + self.right * (step_x * (x as f32 + 0.5))
            + self.down * (step_y * (y as f32 + 0.5));
        Vec3::normalized(p)
    }
}
