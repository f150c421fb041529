//! Ray/primitive intersection in the primitive's local space.

use csgtrace::buffers::SceneBuffers;
use csgtrace::geometry::Vec3;
use csgtrace::scene::{Primitive, PrimitiveKind};

use crate::ray::{Hit, Ray};

pub const EPSILON: f32 = 1e-5;

const SPHERE: u32 = PrimitiveKind::Sphere.tag();
const HALF_PLANE: u32 = PrimitiveKind::HalfPlane.tag();

/// Closest hit on primitive `index` with `t > t_min + EPSILON`.
///
/// The returned normal is in world space; `t` is measured along the world
/// ray, since the local ray is not renormalized.
pub fn intersect_primitive(ray: &Ray, t_min: f32, index: u32, buffers: &SceneBuffers) -> Option<Hit> {
    let primitive = &buffers.primitives[index as usize];
    let inverse = &buffers.inverse_matrices[index as usize];

    let origin = inverse.apply_point(ray.origin);
    let direction = inverse.apply_vector(ray.direction);

    let (t, local_normal) = match primitive.kind {
        SPHERE => intersect_sphere(origin, direction, primitive.position, primitive.radius, t_min)?,
        HALF_PLANE => intersect_half_plane(origin, direction, primitive.position, primitive.radius, t_min)?,
        _ => return None,
    };

    let normal = Vec3::normalized(inverse.apply_vector_transposed(local_normal));
    Some(Hit { t, normal, primitive: index })
}

/// Whether the point at `t` along `ray` lies strictly inside half-plane
/// `index`. Spheres and other bounded solids always report `false`.
pub fn inside_half_plane(ray: &Ray, t: f32, index: u32, buffers: &SceneBuffers) -> bool {
    let primitive = &buffers.primitives[index as usize];
    if primitive.kind != HALF_PLANE {
        return false;
    }
    let local = buffers.inverse_matrices[index as usize].apply_point(ray.at(t));
    Vec3::dot(Primitive::half_plane_normal(primitive.radius), local - primitive.position) < -EPSILON
}

fn intersect_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32, t_min: f32) -> Option<(f32, Vec3)> {
    let oc = origin - center;
    let a = direction.square_magnitude();
    let half_b = Vec3::dot(oc, direction);
    let c = oc.square_magnitude() - radius * radius;

    // quarter of the usual discriminant; grazing rays below the cutoff miss
    let discriminant = half_b * half_b - a * c;
    if discriminant < EPSILON {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let near = (-half_b - sqrt_d) / a;
    let far = (-half_b + sqrt_d) / a;

    let t = if near > t_min + EPSILON {
        near
    } else if far > t_min + EPSILON {
        far
    } else {
        return None;
    };

    let p = origin + direction * t;
    Some((t, (p - center) / radius))
}

// plane through `point` with normal +y, or -y for a negative orientation;
// the solid lies on the opposite side of the normal
fn intersect_half_plane(origin: Vec3, direction: Vec3, point: Vec3, orientation: f32, t_min: f32) -> Option<(f32, Vec3)> {
    let normal = Primitive::half_plane_normal(orientation);
    let nd = Vec3::dot(normal, direction);
    if nd.abs() < EPSILON {
        return None;
    }

    let t = Vec3::dot(normal, point - origin) / nd;
    if t <= t_min + EPSILON {
        return None;
    }
    Some((t, normal))
}

#[cfg(test)]
mod tests {
    use csgtrace::compiler::compile;
    use csgtrace::scene::{
        AmbientLight, Camera, MaterialRegistry, NodeId, Scene, SceneGraph, TransformOp,
    };

    use super::*;

    fn buffers_for(graph: SceneGraph, root: NodeId) -> SceneBuffers {
        let mut scene = Scene {
            graph,
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

    fn single(primitive: Primitive) -> SceneBuffers {
        let mut graph = SceneGraph::new();
        let root = graph.add_primitive(primitive);
        buffers_for(graph, root)
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn sphere_hit_from_outside() {
        let buffers = single(Primitive::sphere(Vec3::zero(), 1.0, 0));
        let ray = Ray { origin: Vec3(0.0, 0.0, -5.0), direction: Vec3(0.0, 0.0, 1.0) };
        let hit = intersect_primitive(&ray, 0.0, 0, &buffers).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!(close(hit.normal, Vec3(0.0, 0.0, -1.0)));
    }

    #[test]
    fn sphere_miss() {
        let buffers = single(Primitive::sphere(Vec3::zero(), 1.0, 0));
        let ray = Ray { origin: Vec3(5.0, 5.0, -5.0), direction: Vec3(0.0, 0.0, 1.0) };
        assert_eq!(intersect_primitive(&ray, 0.0, 0, &buffers), None);
    }

    #[test]
    fn sphere_hit_from_inside_uses_far_root() {
        let buffers = single(Primitive::sphere(Vec3::zero(), 1.0, 0));
        let ray = Ray { origin: Vec3::zero(), direction: Vec3(0.0, 0.0, 1.0) };
        let hit = intersect_primitive(&ray, 0.0, 0, &buffers).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!(close(hit.normal, Vec3(0.0, 0.0, 1.0)));
    }

    #[test]
    fn t_min_skips_earlier_hits() {
        let buffers = single(Primitive::sphere(Vec3::zero(), 1.0, 0));
        let ray = Ray { origin: Vec3(0.0, 0.0, -5.0), direction: Vec3(0.0, 0.0, 1.0) };
        let hit = intersect_primitive(&ray, 4.0, 0, &buffers).unwrap();
        assert!((hit.t - 6.0).abs() < 1e-4);
        assert_eq!(intersect_primitive(&ray, 6.0, 0, &buffers), None);
    }

    #[test]
    fn grazing_rays_miss() {
        let buffers = single(Primitive::sphere(Vec3::zero(), 1.0, 0));
        let graze = |offset: f32| Ray {
            origin: Vec3(0.0, (1.0 - offset).sqrt(), -1.5),
            direction: Vec3(0.0, 0.0, 1.0),
        };
        // the reduced discriminant here is 1 - y^2, i.e. `offset`
        assert_eq!(intersect_primitive(&graze(5e-6), 0.0, 0, &buffers), None);
        assert!(intersect_primitive(&graze(2e-5), 0.0, 0, &buffers).is_some());
    }

    #[test]
    fn half_plane_hit() {
        let buffers = single(Primitive::half_plane(Vec3::zero(), 1.0, 0));
        let ray = Ray { origin: Vec3(0.0, 1.0, 0.0), direction: Vec3(0.0, -1.0, 0.0) };
        let hit = intersect_primitive(&ray, 0.0, 0, &buffers).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-6);
        assert!(close(hit.normal, Vec3(0.0, 1.0, 0.0)));
    }

    #[test]
    fn half_plane_parallel_and_behind() {
        let buffers = single(Primitive::half_plane(Vec3::zero(), 1.0, 0));
        let parallel = Ray { origin: Vec3(0.0, 1.0, 0.0), direction: Vec3(1.0, 0.0, 0.0) };
        assert_eq!(intersect_primitive(&parallel, 0.0, 0, &buffers), None);
        let away = Ray { origin: Vec3(0.0, 1.0, 0.0), direction: Vec3(0.0, 1.0, 0.0) };
        assert_eq!(intersect_primitive(&away, 0.0, 0, &buffers), None);
    }

    #[test]
    fn half_plane_containment() {
        let buffers = single(Primitive::half_plane(Vec3::zero(), 1.0, 0));
        let level = Ray { origin: Vec3(0.0, -0.5, 0.0), direction: Vec3(1.0, 0.0, 0.0) };
        assert!(inside_half_plane(&level, 0.0, 0, &buffers));
        assert!(inside_half_plane(&level, 100.0, 0, &buffers));
        let above = Ray { origin: Vec3(0.0, 0.5, 0.0), ..level };
        assert!(!inside_half_plane(&above, 0.0, 0, &buffers));

        let flipped = single(Primitive::half_plane(Vec3::zero(), -1.0, 0));
        assert!(inside_half_plane(&above, 0.0, 0, &flipped));

        let sphere = single(Primitive::sphere(Vec3::zero(), 1.0, 0));
        assert!(!inside_half_plane(&Ray { origin: Vec3::zero(), ..level }, 0.0, 0, &sphere));
    }

    #[test]
    fn transformed_sphere() {
        let mut graph = SceneGraph::new();
        let s = graph.add_primitive(Primitive::sphere(Vec3::zero(), 1.0, 0));
        let s = graph.add_transform(TransformOp::Scale, Vec3(2.0, 1.0, 1.0), s).unwrap();
        let s = graph.add_transform(TransformOp::Translate, Vec3(0.0, 0.0, 3.0), s).unwrap();
        let buffers = buffers_for(graph, s);

        // ellipsoid spans x in [-2, 2] around z = 3
        let ray = Ray { origin: Vec3(-5.0, 0.0, 3.0), direction: Vec3(1.0, 0.0, 0.0) };
        let hit = intersect_primitive(&ray, 0.0, 0, &buffers).unwrap();
        assert!((hit.t - 3.0).abs() < 1e-4);
        assert!(close(hit.normal, Vec3(-1.0, 0.0, 0.0)));

        // non-uniform scale bends the normal towards the short axis
        let ray = Ray { origin: Vec3(1.0, 5.0, 3.0), direction: Vec3(0.0, -1.0, 0.0) };
        let hit = intersect_primitive(&ray, 0.0, 0, &buffers).unwrap();
        let expected = Vec3::normalized(Vec3(0.5 * 0.5, 0.75f32.sqrt(), 0.0));
        assert!(close(hit.normal, expected), "{:?}", hit.normal);
    }
}
