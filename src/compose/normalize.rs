use crate::compose::rotation::EulerRadians;
use crate::foundation::core::{Pt3, Transform};
use crate::foundation::error::ScenepixResult;
use crate::foundation::math::effective_radius;
use crate::scene::graph::{NodeId, NodeKind, SceneGraph};

/// Name of the group that receives all re-centered content.
pub const CONTENT_NODE_NAME: &str = "content";

/// Outcome of re-centering and orienting a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    /// Group node holding every re-parented content node.
    pub content: NodeId,
    /// Bounding-sphere center before re-centering.
    pub original_center: Pt3,
    /// Bounding-sphere radius as measured.
    pub radius: f32,
    /// Radius used for camera and light placement, never below 1.0.
    pub effective_radius: f32,
    /// Angles applied to the content group.
    pub rotation: EulerRadians,
}

/// Move all non-camera, non-light top-level nodes under a new content group, shifted so the
/// geometry's bounding-sphere center sits at the origin, then rotate the group.
pub fn normalize(scene: &mut SceneGraph, rotation: EulerRadians) -> ScenepixResult<Normalization> {
    let sphere = scene.bounding_sphere();
    let offset = sphere.center.coords;

    let root = scene.root();
    let top_level: Vec<NodeId> = scene
        .top_level()
        .iter()
        .copied()
        .filter(|&id| {
            let n = scene.node(id);
            !n.is_camera() && !n.is_light()
        })
        .collect();

    let content = scene.add_node(
        root,
        CONTENT_NODE_NAME,
        Transform::default(),
        NodeKind::Group,
    );
    for id in top_level {
        scene.reparent(id, content)?;
        scene.node_mut(id).transform.translation -= offset;
    }
    scene.node_mut(content).transform.rotation = rotation.to_quat();

    Ok(Normalization {
        content,
        original_center: sphere.center,
        radius: sphere.radius,
        effective_radius: effective_radius(sphere.radius),
        rotation,
    })
}
