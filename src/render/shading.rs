use crate::foundation::core::{Mat4, Pt3, Rgb8, Vec3};
use crate::foundation::math::{BoundingSphere, normal_matrix};
use crate::render::shadow::ShadowMap;
use crate::scene::graph::SceneGraph;
use crate::scene::light::LightKind;

/// Light intensity that maps to unit radiance.
pub(crate) const INTENSITY_UNIT: f32 = 1000.0;
/// Scale of ambient lights relative to spot lights.
pub(crate) const AMBIENT_WEIGHT: f32 = 0.3;
/// Scale of the environment term per unit of environment intensity.
pub(crate) const ENVIRONMENT_WEIGHT: f32 = 0.12;
/// Global exposure applied before display encoding.
pub(crate) const EXPOSURE: f32 = 0.45;
/// Shadow bias as a fraction of the scene's effective radius.
pub(crate) const SHADOW_BIAS: f32 = 0.02;

/// World-space triangle with its shading attributes.
#[derive(Clone, Debug)]
pub(crate) struct SurfaceTriangle {
    pub positions: [Pt3; 3],
    pub normals: [Vec3; 3],
    pub color: [f32; 3],
}

impl SurfaceTriangle {
    pub(crate) fn corners(&self) -> [&Pt3; 3] {
        [&self.positions[0], &self.positions[1], &self.positions[2]]
    }

    fn point(&self, bary: &Vec3) -> Pt3 {
        Pt3::from(
            self.positions[0].coords * bary.x
                + self.positions[1].coords * bary.y
                + self.positions[2].coords * bary.z,
        )
    }

    fn normal(&self, bary: &Vec3) -> Vec3 {
        let n = self.normals[0] * bary.x + self.normals[1] * bary.y + self.normals[2] * bary.z;
        n.try_normalize(1e-12).unwrap_or(self.normals[0])
    }
}

/// Flatten every mesh instance reachable from the root into world-space triangles.
pub(crate) fn collect_surfaces(scene: &SceneGraph) -> Vec<SurfaceTriangle> {
    let mut out = Vec::new();
    for (_, mesh_id, world) in scene.mesh_instances() {
        let mesh = scene.mesh(mesh_id);
        let nm = normal_matrix(&world);
        for [a, b, c] in mesh.triangles() {
            let positions = [
                world.transform_point(&mesh.positions[a]),
                world.transform_point(&mesh.positions[b]),
                world.transform_point(&mesh.positions[c]),
            ];
            let face = (positions[1] - positions[0])
                .cross(&(positions[2] - positions[0]))
                .try_normalize(1e-12)
                .unwrap_or_else(Vec3::z);
            let normals = match &mesh.normals {
                Some(ns) => [a, b, c].map(|i| (nm * ns[i]).try_normalize(1e-12).unwrap_or(face)),
                None => [face; 3],
            };
            out.push(SurfaceTriangle {
                positions,
                normals,
                color: mesh.base_color,
            });
        }
    }
    out
}

pub(crate) struct SpotLight {
    position: Pt3,
    forward: Vec3,
    cos_inner: f32,
    cos_outer: f32,
    radiance: Vec3,
    shadow: Option<ShadowMap>,
}

/// Lights and environment resolved to world space.
pub(crate) struct LightSet {
    spots: Vec<SpotLight>,
    ambient: Vec3,
}

impl LightSet {
    /// Gather lights from `scene`, rendering depth maps for shadow casters.
    ///
    /// `radius` is the effective content radius, used to size shadow depth ranges and bias.
    pub(crate) fn gather(scene: &SceneGraph, surfaces: &[SurfaceTriangle], radius: f32) -> Self {
        let mut spots = Vec::new();
        let mut ambient = Vec3::zeros();
        let content = BoundingSphere::from_points(surfaces.iter().flat_map(|t| t.positions.iter()));

        for (_, light, world) in scene.lights() {
            let radiance = rgb(light.color) * (light.intensity / INTENSITY_UNIT);
            match light.kind {
                LightKind::Ambient => ambient += radiance * AMBIENT_WEIGHT,
                LightKind::Spot(cone) => {
                    let position = world.transform_point(&Pt3::origin());
                    let forward = world
                        .transform_vector(&-Vec3::z())
                        .try_normalize(1e-12)
                        .unwrap_or_else(|| -Vec3::z());
                    let half = |deg: f32| (deg * 0.5).clamp(0.0, 90.0).to_radians().cos();
                    let shadow = if light.casts_shadow {
                        let reach = (position - content.center).norm() + content.radius * 2.0;
                        shadow_for(&world, surfaces, cone.outer_angle_deg, reach, radius)
                    } else {
                        None
                    };
                    spots.push(SpotLight {
                        position,
                        forward,
                        cos_inner: half(cone.inner_angle_deg),
                        cos_outer: half(cone.outer_angle_deg),
                        radiance,
                        shadow,
                    });
                }
            }
        }

        if let Some(env) = scene.environment() {
            ambient += rgb(env.color) * (env.intensity * ENVIRONMENT_WEIGHT);
        }

        Self { spots, ambient }
    }

    /// Display-space color of a surface point seen from `eye`.
    pub(crate) fn shade(&self, tri: &SurfaceTriangle, bary: &Vec3, eye: &Pt3) -> [f32; 3] {
        let p = tri.point(bary);
        let mut n = tri.normal(bary);
        if n.dot(&(*eye - p)) < 0.0 {
            n = -n;
        }

        let mut light = self.ambient;
        for spot in &self.spots {
            let to_light = spot.position - p;
            let Some(l) = to_light.try_normalize(1e-12) else {
                continue;
            };
            let ndotl = n.dot(&l);
            if ndotl <= 0.0 {
                continue;
            }
            let cone = smoothstep(spot.cos_outer, spot.cos_inner, spot.forward.dot(&-l));
            if cone <= 0.0 {
                continue;
            }
            let vis = spot.shadow.as_ref().map_or(1.0, |s| s.visibility(&p));
            light += spot.radiance * (ndotl * cone * vis);
        }

        let base = Vec3::from(tri.color);
        let linear = base.component_mul(&light) * EXPOSURE;
        [linear.x, linear.y, linear.z].map(encode_display)
    }
}

fn shadow_for(
    world: &Mat4,
    surfaces: &[SurfaceTriangle],
    fov_deg: f32,
    reach: f32,
    radius: f32,
) -> Option<ShadowMap> {
    let map = ShadowMap::build(
        surfaces.iter().map(SurfaceTriangle::corners),
        world,
        fov_deg,
        reach,
        radius * SHADOW_BIAS,
    );
    if map.is_none() {
        tracing::warn!("shadow-casting light has a singular transform, rendering without shadows");
    }
    map
}

pub(crate) fn rgb(c: Rgb8) -> Vec3 {
    Vec3::from(c.to_f32())
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 - edge0 <= 1e-6 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Clamp and gamma-encode a linear channel.
fn encode_display(c: f32) -> f32 {
    if c.is_finite() {
        c.clamp(0.0, 1.0).powf(1.0 / 2.2)
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/shading.rs"]
mod tests;
