use bytemuck::{Pod, Zeroable};
use csgtrace::geometry::Vec3;

/// One entry of a level's color buffer: color plus the weight of the ray
/// that produced it.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SlotColor {
    pub rgb: Vec3,
    pub weight: f32,
}

impl SlotColor {
    /// Marks a slot whose ray was never spawned
    pub const NULL: SlotColor = SlotColor { rgb: Vec3(-1.0, 0.0, 0.0), weight: 0.0 };

    pub fn is_null(&self) -> bool {
        *self == SlotColor::NULL
    }

    pub fn weighted(&self) -> Vec3 {
        self.rgb * self.weight
    }
}

/// Saturating blend `1 - (1 - a)(1 - b)`, pinned to 1 once either input exceeds it
pub fn combine_channel(a: f32, b: f32) -> f32 {
    if a > 1.0 || b > 1.0 {
        1.0
    } else {
        1.0 - (1.0 - a) * (1.0 - b)
    }
}

pub fn combine(a: Vec3, b: Vec3) -> Vec3 {
    Vec3(
        combine_channel(a.0, b.0),
        combine_channel(a.1, b.1),
        combine_channel(a.2, b.2),
    )
}

/// Vertical gradient from white at the horizon to `ambient` straight up
pub fn sky(direction: Vec3, ambient: Vec3) -> Vec3 {
    let t = 0.5 * (Vec3::normalized(direction).y() + 1.0);
    (1.0 - t) * Vec3(1.0, 1.0, 1.0) + t * ambient
}
