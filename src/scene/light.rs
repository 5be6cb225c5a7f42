use crate::foundation::core::Rgb8;

/// Cone parameters of a spot light, as full-cone angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotCone {
    /// Angle of the fully lit inner cone.
    pub inner_angle_deg: f32,
    /// Angle at which the light falls off to zero.
    pub outer_angle_deg: f32,
}

impl Default for SpotCone {
    fn default() -> Self {
        Self {
            inner_angle_deg: 0.0,
            outer_angle_deg: 45.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    /// Positional cone light shining along the node's local −Z axis.
    Spot(SpotCone),
    /// Uniform, directionless light.
    Ambient,
}

/// Light attached to a scene node. Intensities are in lumen-like units where 1000 is nominal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Rgb8,
    pub intensity: f32,
    pub casts_shadow: bool,
}

impl Light {
    pub fn spot(intensity: f32, cone: SpotCone) -> Self {
        Self {
            kind: LightKind::Spot(cone),
            color: Rgb8::WHITE,
            intensity,
            casts_shadow: false,
        }
    }

    pub fn ambient(intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color: Rgb8::WHITE,
            intensity,
            casts_shadow: false,
        }
    }

    pub fn with_shadows(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }

    pub fn is_spot(&self) -> bool {
        matches!(self.kind, LightKind::Spot(_))
    }
}

/// Scene-wide image-based fill, modeled as a uniform colored environment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Environment {
    pub color: Rgb8,
    pub intensity: f32,
}
