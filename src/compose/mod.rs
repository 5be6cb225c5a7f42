//! Turning an imported scene into a framed, lit and oriented render-ready scene.
//!
//! Composition runs in a fixed order: the content is re-centered and rotated first, then the
//! camera and the studio rig are placed relative to the effective radius of the original bound.

pub mod camera;
pub mod lighting;
pub mod normalize;
pub mod rotation;

use crate::config::RenderConfig;
use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::scene::graph::{NodeId, SceneGraph};
use rand::RngCore;

pub use camera::place_camera;
pub use lighting::{StudioRig, attach_studio_rig};
pub use normalize::{Normalization, normalize};
pub use rotation::{EulerRadians, effective_rotation};

/// Scene ready for the offscreen renderer.
#[derive(Clone, Debug)]
pub struct ComposedScene {
    pub scene: SceneGraph,
    /// The single camera the renderer should look through.
    pub camera: NodeId,
    pub normalization: Normalization,
    pub rig: StudioRig,
}

impl ComposedScene {
    /// Effective Euler angles that were applied to the content, in radians.
    pub fn rotation(&self) -> EulerRadians {
        self.normalization.rotation
    }

    pub fn effective_radius(&self) -> f32 {
        self.normalization.effective_radius
    }
}

/// Normalizes, lights and frames scenes with one captured configuration.
#[derive(Clone, Debug)]
pub struct SceneComposer {
    config: RenderConfig,
}

impl SceneComposer {
    /// Takes the configuration by value so later edits by the caller never reach this composer.
    pub fn new(config: RenderConfig) -> ScenepixResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Compose `scene`. Random rotation axes draw from `rng`.
    #[tracing::instrument(skip_all, fields(nodes = scene.node_count()))]
    pub fn compose(
        &self,
        mut scene: SceneGraph,
        rng: &mut dyn RngCore,
    ) -> ScenepixResult<ComposedScene> {
        let rotation = effective_rotation(&self.config, rng);
        let normalization = normalize(&mut scene, rotation)?;
        let r = normalization.effective_radius;
        if !r.is_finite() || r <= 0.0 {
            return Err(ScenepixError::compose(format!(
                "effective radius must be positive, got {r}"
            )));
        }

        let camera = place_camera(&mut scene, r, self.config.camera_distance_multiplier);
        let rig = attach_studio_rig(&mut scene, r);

        tracing::debug!(
            center = ?normalization.original_center,
            radius = normalization.radius,
            effective_radius = r,
            rotation_deg = ?rotation.to_degrees(),
            "scene composed"
        );

        Ok(ComposedScene {
            scene,
            camera,
            normalization,
            rig,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/mod.rs"]
mod tests;
