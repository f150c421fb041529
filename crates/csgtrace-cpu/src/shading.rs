use csgtrace::buffers::SceneBuffers;
use csgtrace::geometry::Vec3;
use csgtrace::settings::{IntersectionMode, RaytracerSettings};

use crate::color::{SlotColor, combine, sky};
use crate::csg::{CsgWorkspace, closest_hit};
use crate::ray::{Hit, Ray, RaySlot};

// below this Lambert term no specular highlight is added
const SPECULAR_CUTOFF: f32 = 1e-4;

/// Read-only inputs shared by every shading invocation of a render
#[derive(Clone, Copy)]
pub struct ShadingContext<'a> {
    pub buffers: &'a SceneBuffers,
    pub mode: IntersectionMode,
    pub shadow_bias: f32,
}

impl<'a> ShadingContext<'a> {
    pub fn new(buffers: &'a SceneBuffers, settings: &RaytracerSettings) -> Self {
        ShadingContext {
            buffers,
            mode: settings.intersection_mode,
            shadow_bias: settings.shadow_bias,
        }
    }
}

/// Shades one slot. Writes this slot's direct color and, when `children` is
/// given, the reflected ray into `children[0]` and the refracted ray into
/// `children[1]`. Idle slots leave everything untouched.
pub fn shade(
    slot: &RaySlot,
    color: &mut SlotColor,
    children: Option<&mut [RaySlot]>,
    ctx: &ShadingContext,
    workspace: &mut CsgWorkspace,
) {
    if slot.is_idle() {
        return;
    }

    let ray = slot.ray();
    let direction = Vec3::normalized(ray.direction);

    let Some(hit) = closest_hit(&ray, ctx.buffers, ctx.mode, workspace) else {
        *color = SlotColor {
            rgb: sky(direction, ctx.buffers.constants.ambient_color),
            weight: slot.weight,
        };
        return;
    };

    let point = ray.at(hit.t);
    let primitive = &ctx.buffers.primitives[hit.primitive as usize];
    let material = &ctx.buffers.materials[primitive.material as usize];

    *color = SlotColor {
        rgb: direct_light(point, direction, &hit, ctx, workspace),
        weight: slot.weight,
    };

    let Some(children) = children else {
        return;
    };
    let normal = hit.normal;

    if material.reflectivity > 0.0 {
        let reflected = Vec3::reflect(direction, normal);
        children[0] = RaySlot {
            origin: offset(point, normal, reflected, ctx.shadow_bias),
            weight: material.reflectivity,
            direction: reflected,
            ior: slot.ior,
        };
    }

    if material.refractivity > 0.0 {
        if let Some((refracted, medium)) = refract(direction, normal, slot.ior, material.refractive_index) {
            children[1] = RaySlot {
                origin: offset(point, normal, refracted, ctx.shadow_bias),
                weight: material.refractivity,
                direction: refracted,
                ior: medium,
            };
        }
    }
}

// ambient plus every visible light's diffuse and specular terms
fn direct_light(point: Vec3, direction: Vec3, hit: &Hit, ctx: &ShadingContext, workspace: &mut CsgWorkspace) -> Vec3 {
    let buffers = ctx.buffers;
    let primitive = &buffers.primitives[hit.primitive as usize];
    let material = &buffers.materials[primitive.material as usize];
    let normal = hit.normal;
    let view = -direction;

    let ambient = material.ambient * buffers.constants.ambient_intensity;
    let mut diffuse = Vec3::zero();
    let mut specular = Vec3::zero();

    for light in &buffers.lights {
        let shadow_origin = point + normal * ctx.shadow_bias;
        // unnormalized, so the light sits at t = 1
        let shadow = Ray { origin: shadow_origin, direction: light.position - shadow_origin };
        let occluded = closest_hit(&shadow, buffers, ctx.mode, workspace).is_some_and(|h| h.t < 1.0);
        if occluded {
            continue;
        }

        let to_light = Vec3::normalized(light.position - point);
        let lambert = Vec3::dot(to_light, normal).max(0.0);
        let highlight = if lambert > SPECULAR_CUTOFF {
            let r = Vec3::reflect(-to_light, normal);
            Vec3::dot(r, view).max(0.0).powf(material.shininess)
        } else {
            0.0
        };

        diffuse = combine(diffuse, material.diffuse * lambert * material.color);
        specular = combine(specular, material.specular * highlight * light.color);
    }

    combine(ambient, combine(diffuse, specular))
}

/// Refracted direction and the refractive index of the medium it enters,
/// or `None` past the critical angle. `direction` must be unit length.
pub fn refract(direction: Vec3, normal: Vec3, current_ior: f32, material_ior: f32) -> Option<(Vec3, f32)> {
    let entering = Vec3::dot(direction, normal) < 0.0;
    let (n, eta, medium) = if entering {
        (normal, current_ior / material_ior, material_ior)
    } else {
        (-normal, current_ior, 1.0)
    };

    let cos_i = -Vec3::dot(direction, n);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    let refracted = eta * direction + (eta * cos_i - k.sqrt()) * n;
    Some((Vec3::normalized(refracted), medium))
}

// nudge a spawned ray's origin off the surface, on the side it travels into
fn offset(point: Vec3, normal: Vec3, direction: Vec3, bias: f32) -> Vec3 {
    if Vec3::dot(direction, normal) >= 0.0 {
        point + normal * bias
    } else {
        point - normal * bias
    }
}
