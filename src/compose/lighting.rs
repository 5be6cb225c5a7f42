use crate::foundation::core::{Pt3, Rgb8, Transform, Vec3};
use crate::foundation::math::look_rotation;
use crate::scene::graph::{NodeId, NodeKind, SceneGraph};
use crate::scene::light::{Environment, Light, SpotCone};

/// Intensity multiplier of the uniform white environment fill.
pub const ENVIRONMENT_INTENSITY: f32 = 1.5;

/// One row of the studio rig, with positions expressed in multiples of the scene radius.
#[derive(Clone, Copy, Debug)]
struct RigLight {
    name: &'static str,
    intensity: f32,
    /// `None` for the ambient light.
    position: Option<[f32; 3]>,
    cone: SpotCone,
    casts_shadow: bool,
}

/// Cone of the fill and top spots. Both angles are zero, so these lights only reach points on
/// their exact axis and the key, ambient and environment terms carry the shading.
const PLAIN_CONE: SpotCone = SpotCone {
    inner_angle_deg: 0.0,
    outer_angle_deg: 0.0,
};

const STUDIO_RIG: [RigLight; 5] = [
    RigLight {
        name: "key",
        intensity: 1500.0,
        position: Some([0.0, 1.0, 2.0]),
        cone: SpotCone {
            inner_angle_deg: 40.0,
            outer_angle_deg: 90.0,
        },
        casts_shadow: true,
    },
    RigLight {
        name: "fill_left",
        intensity: 1000.0,
        position: Some([-1.5, 1.0, 1.0]),
        cone: PLAIN_CONE,
        casts_shadow: false,
    },
    RigLight {
        name: "fill_right",
        intensity: 1000.0,
        position: Some([1.5, 1.0, 1.0]),
        cone: PLAIN_CONE,
        casts_shadow: false,
    },
    RigLight {
        name: "top",
        intensity: 800.0,
        position: Some([0.0, 2.0, 0.0]),
        cone: PLAIN_CONE,
        casts_shadow: false,
    },
    RigLight {
        name: "ambient",
        intensity: 600.0,
        position: None,
        cone: PLAIN_CONE,
        casts_shadow: false,
    },
];

/// Node ids of the attached rig.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StudioRig {
    pub key: NodeId,
    pub fill_left: NodeId,
    pub fill_right: NodeId,
    pub top: NodeId,
    pub ambient: NodeId,
}

/// Attach the fixed five-light rig scaled to radius `r`, plus the environment fill.
///
/// Spot lights are white and aimed at the origin. The rig is deterministic.
pub fn attach_studio_rig(scene: &mut SceneGraph, r: f32) -> StudioRig {
    let root = scene.root();
    let mut ids = [root; 5];
    for (slot, entry) in ids.iter_mut().zip(STUDIO_RIG.iter()) {
        let (transform, light) = match entry.position {
            Some([x, y, z]) => {
                let pos = Pt3::new(x * r, y * r, z * r);
                let transform = Transform {
                    translation: pos.coords,
                    rotation: look_rotation(&pos, &Pt3::origin(), &Vec3::y()),
                    ..Transform::default()
                };
                (
                    transform,
                    Light::spot(entry.intensity, entry.cone).with_shadows(entry.casts_shadow),
                )
            }
            None => (Transform::default(), Light::ambient(entry.intensity)),
        };
        *slot = scene.add_node(root, entry.name, transform, NodeKind::Light(light));
    }

    scene.set_environment(Some(Environment {
        color: Rgb8::WHITE,
        intensity: ENVIRONMENT_INTENSITY,
    }));

    StudioRig {
        key: ids[0],
        fill_left: ids[1],
        fill_right: ids[2],
        top: ids[3],
        ambient: ids[4],
    }
}
