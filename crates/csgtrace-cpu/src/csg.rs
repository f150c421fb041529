//! Closest-hit queries against the packed scene.
//!
//! Boolean trees are evaluated without recursion: every ray walks the
//! linkage table with an explicit stack automaton, keeping pending states,
//! saved child hits and saved lower bounds on three side stacks. At each
//! internal node the classifications of the two child hits pick an action
//! from the per-operation tables below; "loop" actions advance one child
//! past its current hit and evaluate the node again.
//!
//! Half-planes are unbounded. A child which was entered and has no further
//! surface, or a half-plane containing the ray with no surface ahead, reports
//! an exiting hit at `t = inf` instead of a miss. Such hits never escape the
//! root.

use csgtrace::buffers::{LinkRef, SceneBuffers};
use csgtrace::scene::CsgOp;
use csgtrace::settings::IntersectionMode;

use csgtrace::geometry::Vec3;

use crate::intersect::{inside_half_plane, intersect_primitive};
use crate::ray::{Classification, Hit, Ray, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    DescendLeft,
    DescendRight,
    Compute,
    // left hit and the right child's previous hit are on the hit stack,
    // the right child just finished
    ReloadLeft,
    // right hit and the left child's previous hit are on the hit stack,
    // the left child just finished
    ReloadRight,
    // left child just finished on the first pass
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Miss,
    ReturnLeft,
    ReturnRight,
    ReturnCloser { flip_right: bool },
    ReturnLeftIfCloserElseLoopRight,
    ReturnRightIfCloserElseLoopLeft { flip_right: bool },
    // advance whichever child is closer
    LoopCloser,
}

fn action(op: CsgOp, left: Classification, right: Classification) -> Action {
    use Classification::{Entering as E, Exiting as X, Miss as M};

    match op {
        CsgOp::Union => match (left, right) {
            (M, M) => Action::Miss,
            (M, _) => Action::ReturnRight,
            (_, M) => Action::ReturnLeft,
            (E, E) => Action::ReturnCloser { flip_right: false },
            (X, X) => Action::LoopCloser,
            (E, X) => Action::ReturnRightIfCloserElseLoopLeft { flip_right: false },
            (X, E) => Action::ReturnLeftIfCloserElseLoopRight,
        },
        CsgOp::Intersection => match (left, right) {
            (M, _) | (_, M) => Action::Miss,
            (E, E) => Action::LoopCloser,
            (X, X) => Action::ReturnCloser { flip_right: false },
            (E, X) => Action::ReturnLeftIfCloserElseLoopRight,
            (X, E) => Action::ReturnRightIfCloserElseLoopLeft { flip_right: false },
        },
        CsgOp::Subtraction => match (left, right) {
            (M, _) => Action::Miss,
            (_, M) => Action::ReturnLeft,
            (E, E) => Action::ReturnLeftIfCloserElseLoopRight,
            (X, X) => Action::ReturnRightIfCloserElseLoopLeft { flip_right: true },
            (E, X) => Action::LoopCloser,
            (X, E) => Action::ReturnCloser { flip_right: true },
        },
    }
}

/// Per-worker stacks, reused across rays
#[derive(Debug, Default)]
pub struct CsgWorkspace {
    states: Vec<State>,
    // two entries per pending node
    hits: Vec<Option<Hit>>,
    times: Vec<f32>,
}

impl CsgWorkspace {
    pub fn with_height(tree_height: u32) -> Self {
        let capacity = tree_height as usize + 1;
        CsgWorkspace {
            states: Vec::with_capacity(capacity),
            hits: Vec::with_capacity(2 * capacity),
            times: Vec::with_capacity(capacity),
        }
    }

    fn clear(&mut self) {
        self.states.clear();
        self.hits.clear();
        self.times.clear();
    }
}

/// Closest hit along `ray` with `t > 0` according to `mode`.
pub fn closest_hit(
    ray: &Ray,
    buffers: &SceneBuffers,
    mode: IntersectionMode,
    workspace: &mut CsgWorkspace,
) -> Option<Hit> {
    if buffers.primitives.is_empty() {
        return None;
    }

    match mode {
        IntersectionMode::FlatScan => flat_scan(ray, buffers),
        IntersectionMode::CsgTree => {
            let hit = match buffers.root() {
                LinkRef::Leaf(index) => intersect_primitive(ray, 0.0, index, buffers),
                LinkRef::Internal(index) => evaluate_tree(ray, buffers, index, workspace),
            };
            hit.filter(|hit| hit.t.is_finite())
        }
    }
}

/// Nearest hit over every primitive, ignoring boolean operations
pub fn flat_scan(ray: &Ray, buffers: &SceneBuffers) -> Option<Hit> {
    (0..buffers.primitives.len() as u32)
        .filter_map(|index| intersect_primitive(ray, 0.0, index, buffers))
        .min_by(|a, b| a.t.total_cmp(&b.t))
}

fn evaluate_tree(ray: &Ray, buffers: &SceneBuffers, root: u32, workspace: &mut CsgWorkspace) -> Option<Hit> {
    workspace.clear();
    let CsgWorkspace { states, hits, times } = workspace;

    let mut node = root;
    let mut t_min = 0.0f32;
    let mut result: Option<Hit> = None;
    let mut left: Option<Hit> = None;
    let mut right: Option<Hit> = None;

    states.push(State::Propagate);
    let mut state = State::DescendLeft;

    loop {
        match state {
            State::DescendLeft | State::DescendRight => {
                let link = &buffers.links[node as usize];
                let child = if state == State::DescendLeft { link.left() } else { link.right() };
                match child {
                    LinkRef::Leaf(index) => {
                        result = query_leaf(ray, t_min, index, buffers);
                        state = states.pop()?;
                    }
                    LinkRef::Internal(index) => {
                        // the child starts from the same lower bound; restored on return
                        times.push(t_min);
                        node = index;
                        states.push(State::Propagate);
                        state = State::DescendLeft;
                    }
                }
            }
            State::Propagate => {
                hits.push(result);
                // the right child has no previous hit on its first pass
                hits.push(None);
                states.push(State::ReloadLeft);
                state = State::DescendRight;
            }
            State::ReloadLeft => {
                let previous = hits.pop()?;
                left = hits.pop()?;
                right = continue_past(result, previous, ray.direction);
                state = State::Compute;
            }
            State::ReloadRight => {
                let previous = hits.pop()?;
                right = hits.pop()?;
                left = continue_past(result, previous, ray.direction);
                state = State::Compute;
            }
            State::Compute => {
                let op = buffers.links[node as usize].op()?;
                let chosen = match action(op, classify(left, ray.direction), classify(right, ray.direction)) {
                    Action::Miss => Step::Return(None),
                    Action::ReturnLeft => Step::Return(left),
                    Action::ReturnRight => Step::Return(right),
                    Action::ReturnCloser { flip_right } => {
                        let (l, r) = (left?, right?);
                        if l.t <= r.t {
                            Step::Return(Some(l))
                        } else {
                            Step::Return(Some(if flip_right { r.flipped() } else { r }))
                        }
                    }
                    Action::ReturnLeftIfCloserElseLoopRight => {
                        let (l, r) = (left?, right?);
                        if l.t <= r.t { Step::Return(Some(l)) } else { Step::LoopRight(r.t) }
                    }
                    Action::ReturnRightIfCloserElseLoopLeft { flip_right } => {
                        let (l, r) = (left?, right?);
                        if r.t < l.t {
                            Step::Return(Some(if flip_right { r.flipped() } else { r }))
                        } else {
                            Step::LoopLeft(l.t)
                        }
                    }
                    Action::LoopCloser => {
                        let (l, r) = (left?, right?);
                        if l.t <= r.t { Step::LoopLeft(l.t) } else { Step::LoopRight(r.t) }
                    }
                };

                match chosen {
                    Step::Return(hit) => {
                        result = hit;
                        match buffers.links[node as usize].parent() {
                            None => return result,
                            Some(parent) => {
                                node = parent;
                                t_min = times.pop()?;
                                state = states.pop()?;
                            }
                        }
                    }
                    Step::LoopLeft(t) => {
                        hits.push(right);
                        hits.push(left);
                        states.push(State::ReloadRight);
                        t_min = t;
                        state = State::DescendLeft;
                    }
                    Step::LoopRight(t) => {
                        hits.push(left);
                        hits.push(right);
                        states.push(State::ReloadLeft);
                        t_min = t;
                        state = State::DescendRight;
                    }
                }
            }
        }
    }
}

// a half-plane holding the ray with no surface ahead is exited at infinity
fn query_leaf(ray: &Ray, t_min: f32, index: u32, buffers: &SceneBuffers) -> Option<Hit> {
    if !t_min.is_finite() {
        return None;
    }
    intersect_primitive(ray, t_min, index, buffers).or_else(|| {
        inside_half_plane(ray, t_min, index, buffers).then(|| Hit {
            t: f32::INFINITY,
            normal: Vec3::normalized(ray.direction),
            primitive: index,
        })
    })
}

// a child looped past the surface where it was entered, with nothing
// further along the ray, is still inside
fn continue_past(next: Option<Hit>, previous: Option<Hit>, direction: Vec3) -> Option<Hit> {
    match (next, previous) {
        (None, Some(previous)) if classify(Some(previous), direction) == Classification::Entering => {
            Some(Hit { t: f32::INFINITY, ..previous.flipped() })
        }
        _ => next,
    }
}

enum Step {
    Return(Option<Hit>),
    LoopLeft(f32),
    LoopRight(f32),
}

#[cfg(test)]
mod tests {
    use csgtrace::compiler::compile;
    use csgtrace::geometry::Vec3;
    use csgtrace::scene::{
        AmbientLight, Camera, MaterialRegistry, NodeId, Primitive, Scene, SceneGraph, TransformOp,
    };

    use super::*;

    struct Fixture {
        graph: SceneGraph,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture { graph: SceneGraph::new() }
        }

        // unit sphere moved along z
        fn sphere_at(&mut self, z: f32, radius: f32) -> NodeId {
            let s = self.graph.add_primitive(Primitive::sphere(Vec3::zero(), radius, 0));
            self.graph.add_transform(TransformOp::Translate, Vec3(0.0, 0.0, z), s).unwrap()
        }

        // solid below y = 0
        fn floor(&mut self) -> NodeId {
            self.graph.add_primitive(Primitive::half_plane(Vec3::zero(), 1.0, 0))
        }

        fn build(self, root: NodeId) -> SceneBuffers {
            let mut scene = Scene {
                graph: self.graph,
                root,
                materials: MaterialRegistry::new(),
                lights: Vec::new(),
                camera: Camera::look_at(Vec3(0.0, 0.0, -5.0), Vec3::zero(), 1, 1).unwrap(),
                ambient: AmbientLight { color: Vec3::zero(), intensity: Vec3::zero() },
                ray_depth: 1,
            };
            let metrics = compile(&mut scene.graph, scene.root);
            SceneBuffers::build(&scene, metrics)
        }
    }

    fn trace(buffers: &SceneBuffers, ray: Ray) -> Option<Hit> {
        let mut workspace = CsgWorkspace::with_height(buffers.metrics.tree_height);
        closest_hit(&ray, buffers, IntersectionMode::CsgTree, &mut workspace)
    }

    fn along_z(origin_z: f32) -> Ray {
        Ray { origin: Vec3(0.0, 0.0, origin_z), direction: Vec3(0.0, 0.0, 1.0) }
    }

    fn assert_hit(hit: Option<Hit>, t: f32, normal_z: f32) {
        let hit = hit.expect("expected a hit");
        assert!((hit.t - t).abs() < 1e-4, "t = {}", hit.t);
        assert!((hit.normal.z() - normal_z).abs() < 1e-4, "normal = {:?}", hit.normal);
    }

    #[test]
    fn union_returns_nearest_entry() {
        let mut f = Fixture::new();
        let a = f.sphere_at(0.0, 1.0);
        let b = f.sphere_at(1.5, 1.0);
        let root = f.graph.add_csg(CsgOp::Union, a, b);
        let buffers = f.build(root);

        assert_hit(trace(&buffers, along_z(-5.0)), 4.0, -1.0);
        // from inside the overlap, the exit of the union is the far side of b
        assert_hit(trace(&buffers, along_z(0.75)), 1.75, 1.0);
    }

    #[test]
    fn intersection_returns_lens_surface() {
        let mut f = Fixture::new();
        let a = f.sphere_at(0.0, 1.0);
        let b = f.sphere_at(1.5, 1.0);
        let root = f.graph.add_csg(CsgOp::Intersection, a, b);
        let buffers = f.build(root);

        // lens spans z in [0.5, 1]; entering it means entering b
        assert_hit(trace(&buffers, along_z(-5.0)), 5.5, -1.0);
        assert_eq!(trace(&buffers, Ray { origin: Vec3(0.0, 5.0, -5.0), ..along_z(0.0) }), None);
    }

    #[test]
    fn disjoint_intersection_misses() {
        let mut f = Fixture::new();
        let a = f.sphere_at(0.0, 1.0);
        let b = f.sphere_at(5.0, 1.0);
        let root = f.graph.add_csg(CsgOp::Intersection, a, b);
        let buffers = f.build(root);
        assert_eq!(trace(&buffers, along_z(-5.0)), None);
    }

    #[test]
    fn subtraction_exposes_flipped_inner_surface() {
        let mut f = Fixture::new();
        let a = f.sphere_at(0.0, 1.0);
        let b = f.sphere_at(-1.0, 1.0);
        let root = f.graph.add_csg(CsgOp::Subtraction, a, b);
        let buffers = f.build(root);

        // the front of a is carved out; the first surface is b's back face, flipped
        assert_hit(trace(&buffers, along_z(-5.0)), 5.0, -1.0);
        let hit = trace(&buffers, along_z(-5.0)).unwrap();
        assert_eq!(hit.primitive, 1);
    }

    #[test]
    fn subtraction_without_overlap_keeps_left() {
        let mut f = Fixture::new();
        let a = f.sphere_at(0.0, 1.0);
        let b = f.sphere_at(0.0, 0.5);
        let b = f.graph.add_transform(TransformOp::Translate, Vec3(3.0, 0.0, 0.0), b).unwrap();
        let root = f.graph.add_csg(CsgOp::Subtraction, a, b);
        let buffers = f.build(root);
        assert_hit(trace(&buffers, along_z(-5.0)), 4.0, -1.0);
    }

    #[test]
    fn nested_tree() {
        // (a - b) | c, where c sits behind the carved sphere
        let mut f = Fixture::new();
        let a = f.sphere_at(0.0, 1.0);
        let b = f.sphere_at(0.0, 0.5);
        let c = f.sphere_at(4.0, 1.0);
        let shell = f.graph.add_csg(CsgOp::Subtraction, a, b);
        let root = f.graph.add_csg(CsgOp::Union, shell, c);
        let buffers = f.build(root);

        assert_hit(trace(&buffers, along_z(-5.0)), 4.0, -1.0);
        // starting in the hollow: the shell's inner wall, seen from inside the hollow
        assert_hit(trace(&buffers, along_z(0.0)), 0.5, -1.0);
        // starting between the shell and c
        assert_hit(trace(&buffers, along_z(1.5)), 1.5, -1.0);
    }

    #[test]
    fn flat_scan_ignores_operations() {
        let mut f = Fixture::new();
        let a = f.sphere_at(0.0, 1.0);
        let b = f.sphere_at(-1.0, 1.0);
        let root = f.graph.add_csg(CsgOp::Subtraction, a, b);
        let buffers = f.build(root);

        let mut workspace = CsgWorkspace::default();
        let hit = closest_hit(&along_z(-5.0), &buffers, IntersectionMode::FlatScan, &mut workspace);
        assert_hit(hit, 3.0, -1.0);
    }

    fn slanted() -> Ray {
        Ray { origin: Vec3(-3.0, 0.5, 0.0), direction: Vec3::normalized(Vec3(1.0, -0.3, 0.0)) }
    }

    fn level(y: f32) -> Ray {
        Ray { origin: Vec3(0.0, y, -5.0), direction: Vec3(0.0, 0.0, 1.0) }
    }

    #[test]
    fn lower_hemisphere_from_intersection() {
        let mut f = Fixture::new();
        let ball = f.sphere_at(0.0, 1.0);
        let floor = f.floor();
        let root = f.graph.add_csg(CsgOp::Intersection, ball, floor);
        let buffers = f.build(root);

        // crosses the plane first, then enters the ball below it
        let ray = slanted();
        let hit = trace(&buffers, ray).expect("expected a hit on the lower half");
        let p = ray.at(hit.t);
        assert_eq!(hit.primitive, 0);
        assert!(p.y() < 0.0);
        assert!((p.length() - 1.0).abs() < 1e-4);
        assert!((hit.t - 2.0934).abs() < 1e-3, "t = {}", hit.t);

        // parallel to the plane, entirely below it
        let hit = trace(&buffers, level(-0.5)).expect("expected a hit below the plane");
        assert!((hit.t - (5.0 - 0.75f32.sqrt())).abs() < 1e-4);
        assert_eq!(trace(&buffers, level(0.5)), None);
    }

    #[test]
    fn upper_hemisphere_from_subtraction() {
        let mut f = Fixture::new();
        let ball = f.sphere_at(0.0, 1.0);
        let floor = f.floor();
        let root = f.graph.add_csg(CsgOp::Subtraction, ball, floor);
        let buffers = f.build(root);

        // only passes through the removed lower half
        assert_eq!(trace(&buffers, slanted()), None);
        assert_eq!(trace(&buffers, level(-0.5)), None);

        let hit = trace(&buffers, level(0.5)).expect("expected a hit above the plane");
        assert!((hit.t - (5.0 - 0.75f32.sqrt())).abs() < 1e-4);

        let down = Ray { origin: Vec3(0.0, 5.0, 0.0), direction: Vec3(0.0, -1.0, 0.0) };
        let hit = trace(&buffers, down).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert!((hit.normal - Vec3(0.0, 1.0, 0.0)).length() < 1e-4);

        // from below, the flat cut face is seen with its normal pointing down
        let up = Ray { origin: Vec3(0.0, -5.0, 0.0), direction: Vec3(0.0, 1.0, 0.0) };
        let hit = trace(&buffers, up).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-4);
        assert_eq!(hit.primitive, 1);
        assert!((hit.normal - Vec3(0.0, -1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn unbounded_hits_never_reach_the_caller() {
        // two half-planes whose union contains the whole level ray
        let mut f = Fixture::new();
        let a = f.floor();
        let b = f.floor();
        let root = f.graph.add_csg(CsgOp::Union, a, b);
        let buffers = f.build(root);
        assert_eq!(trace(&buffers, level(-0.5)), None);
    }
}
