use crate::config::RenderConfig;
use crate::foundation::core::Quat;
use crate::foundation::math::{deg_to_rad, euler_xyz, rad_to_deg};
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Euler angles in radians, applied intrinsically X then Y then Z.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EulerRadians {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerRadians {
    pub fn to_quat(self) -> Quat {
        euler_xyz(self.x, self.y, self.z)
    }

    pub fn to_degrees(self) -> [f32; 3] {
        [rad_to_deg(self.x), rad_to_deg(self.y), rad_to_deg(self.z)]
    }
}

/// Resolve the angles for one render.
///
/// Axes with their random flag set draw a fresh uniform angle in `[-π, π]` from `rng`; all other
/// axes use the configured degrees. Only random axes consume entropy.
pub fn effective_rotation(cfg: &RenderConfig, rng: &mut dyn RngCore) -> EulerRadians {
    let mut axis = |enabled: bool, fixed_deg: f32| {
        if enabled {
            rng.gen_range(-PI..=PI)
        } else {
            deg_to_rad(fixed_deg)
        }
    };
    EulerRadians {
        x: axis(cfg.enable_random_x, cfg.rotation_x),
        y: axis(cfg.enable_random_y, cfg.rotation_y),
        z: axis(cfg.enable_random_z, cfg.rotation_z),
    }
}
