//! Bounce-level buffers and the order in which kernels are dispatched over them.
//!
//! Level `k` holds `W*H*2^k` slots. The children of slot `n` live at `2n`
//! (reflection) and `2n + 1` (refraction) of level `k + 1`. Each dispatch is a
//! parallel pass over one whole level and returns only once every slot is
//! done, so level `k + 1` never starts before level `k` has written its rays.

use rayon::prelude::*;
use tracing::{debug, info_span};

use crate::accumulate::accumulate;
use crate::color::SlotColor;
use crate::csg::CsgWorkspace;
use crate::ray::RaySlot;
use crate::shading::{ShadingContext, shade};

#[derive(Debug, Clone)]
pub struct LevelBuffers {
    pub rays: Vec<RaySlot>,
    pub colors: Vec<SlotColor>,
}

impl LevelBuffers {
    fn new(len: usize) -> Self {
        LevelBuffers {
            rays: vec![RaySlot::default(); len],
            colors: vec![SlotColor::NULL; len],
        }
    }
}

pub fn level_len(pixel_count: usize, level: u32) -> usize {
    pixel_count << level
}

/// Allocates every level; all rays start idle and all colors null
pub fn allocate_levels(pixel_count: usize, ray_depth: u32) -> Vec<LevelBuffers> {
    (0..ray_depth).map(|k| LevelBuffers::new(level_len(pixel_count, k))).collect()
}

/// Runs the forward shading pass over every level, then folds colors back
/// from the deepest level to level 0. Level 0 rays must already be filled in.
pub fn trace(levels: &mut [LevelBuffers], ctx: &ShadingContext) {
    let depth = levels.len();
    let tree_height = ctx.buffers.metrics.tree_height;

    for k in 0..depth {
        let _span = info_span!("shade", level = k).entered();

        let (head, tail) = levels.split_at_mut(k + 1);
        let current = &mut head[k];
        let slots = current.rays.par_iter().zip(current.colors.par_iter_mut());

        match tail.first_mut() {
            Some(next) => {
                slots.zip(next.rays.par_chunks_mut(2)).for_each_init(
                    || CsgWorkspace::with_height(tree_height),
                    |workspace, ((ray, color), children)| {
                        shade(ray, color, Some(children), ctx, workspace);
                    },
                );
            }
            // last level spawns nothing
            None => {
                slots.for_each_init(
                    || CsgWorkspace::with_height(tree_height),
                    |workspace, (ray, color)| shade(ray, color, None, ctx, workspace),
                );
            }
        }
        debug!(level = k, slots = current.rays.len(), "level shaded");
    }

    for k in (1..depth).rev() {
        let _span = info_span!("accumulate", level = k).entered();

        let (head, tail) = levels.split_at_mut(k);
        let parents = &mut head[k - 1];
        let children = &tail[0];
        parents
            .colors
            .par_iter_mut()
            .zip(children.colors.par_chunks(2))
            .for_each(|(parent, pair)| *parent = accumulate(*parent, pair[0], pair[1]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_double_in_size() {
        let levels = allocate_levels(6 * 4, 4);
        assert_eq!(levels.len(), 4);
        for (k, level) in levels.iter().enumerate() {
            assert_eq!(level.rays.len(), 6 * 4 * (1 << k));
            assert_eq!(level.colors.len(), level.rays.len());
            assert!(level.rays.iter().all(RaySlot::is_idle));
            assert!(level.colors.iter().all(SlotColor::is_null));
        }
    }

    #[test]
    fn level_len_matches_branching() {
        assert_eq!(level_len(640 * 480, 0), 640 * 480);
        assert_eq!(level_len(640 * 480, 3), 640 * 480 * 8);
    }
}
