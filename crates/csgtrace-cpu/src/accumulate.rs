use csgtrace::geometry::Vec3;

use crate::color::{SlotColor, combine};

/// Folds a parent's reflected and refracted children back into the parent's color.
pub fn accumulate(parent: SlotColor, reflected: SlotColor, refracted: SlotColor) -> SlotColor {
    let contribution = match (reflected.is_null(), refracted.is_null()) {
        (true, true) => return parent,
        (false, true) => reflected.weighted(),
        (true, false) => refracted.weighted(),
        (false, false) => combine(reflected.weighted(), refracted.weighted()),
    };

    // children only exist below active parents
    let base = if parent.is_null() { SlotColor { rgb: Vec3::zero(), weight: 0.0 } } else { parent };
    SlotColor {
        rgb: combine(base.rgb, contribution),
        weight: base.weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(r: f32, g: f32, b: f32, weight: f32) -> SlotColor {
        SlotColor { rgb: Vec3(r, g, b), weight }
    }

    #[test]
    fn null_children_leave_parent_alone() {
        let parent = color(0.2, 0.3, 0.4, 1.0);
        assert_eq!(accumulate(parent, SlotColor::NULL, SlotColor::NULL), parent);
    }

    #[test]
    fn single_child_is_weighted() {
        let parent = color(0.5, 0.0, 0.0, 1.0);
        let out = accumulate(parent, color(0.0, 1.0, 0.5, 0.5), SlotColor::NULL);
        assert_eq!(out, color(0.5, 0.5, 0.25, 1.0));

        let out = accumulate(parent, SlotColor::NULL, color(1.0, 0.0, 0.0, 0.5));
        assert_eq!(out.rgb, Vec3(0.75, 0.0, 0.0));
    }

    #[test]
    fn both_children_are_blended() {
        let parent = color(0.0, 0.0, 0.0, 0.6);
        let out = accumulate(parent, color(1.0, 1.0, 1.0, 0.5), color(1.0, 0.0, 1.0, 0.5));
        assert_eq!(out, color(0.75, 0.5, 0.75, 0.6));
    }
}
