use crate::foundation::core::{Pt3, Transform, Vec3};
use crate::foundation::math::look_rotation;
use crate::scene::camera::{Camera, LookAt};
use crate::scene::graph::{NodeId, NodeKind, SceneGraph};

/// Lower bound of the far clip plane.
pub const MIN_ZFAR: f32 = 1000.0;
/// Far clip plane as a multiple of the radius, when that exceeds [`MIN_ZFAR`].
pub const ZFAR_RADIUS_FACTOR: f32 = 20.0;

pub fn far_clip(r: f32) -> f32 {
    MIN_ZFAR.max(r * ZFAR_RADIUS_FACTOR)
}

/// Add the single render camera on +Z at `r * multiplier`, locked onto the origin.
///
/// Field of view and near plane keep the renderer defaults; framing is driven by distance only.
pub fn place_camera(scene: &mut SceneGraph, r: f32, multiplier: f32) -> NodeId {
    let root = scene.root();
    let eye = Pt3::new(0.0, 0.0, r * multiplier);
    let camera = Camera {
        zfar: far_clip(r),
        look_at: Some(LookAt {
            target: root,
            gimbal_lock: true,
        }),
        ..Camera::default()
    };
    let transform = Transform {
        translation: eye.coords,
        rotation: look_rotation(&eye, &Pt3::origin(), &Vec3::y()),
        ..Transform::default()
    };
    scene.add_node(root, "camera", transform, NodeKind::Camera(camera))
}
