use crate::foundation::core::{Mat4, Pt3, Quat, Vec3};

/// Smallest radius handed to radius-relative placement (camera distance, light rig).
pub const MIN_EFFECTIVE_RADIUS: f32 = 1.0;

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad * 180.0 / std::f32::consts::PI
}

/// Rotation from Euler angles in radians, applied intrinsically X then Y then Z.
///
/// Equivalent to `Rx(x) * Ry(y) * Rz(z)` acting on column vectors.
pub fn euler_xyz(x: f32, y: f32, z: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::x_axis(), x)
        * Quat::from_axis_angle(&Vec3::y_axis(), y)
        * Quat::from_axis_angle(&Vec3::z_axis(), z)
}

/// Rotation that points a node's local −Z axis from `eye` towards `target`.
///
/// `up` is the preferred up reference; when it is parallel to the viewing direction the
/// world −Z axis is used instead. Returns identity when `eye == target`.
pub fn look_rotation(eye: &Pt3, target: &Pt3, up: &Vec3) -> Quat {
    let dir = target - eye;
    if dir.norm_squared() <= f32::EPSILON {
        return Quat::identity();
    }
    let dir = dir.normalize();
    let up = if dir.cross(up).norm_squared() <= 1e-8 {
        -Vec3::z()
    } else {
        *up
    };
    // face_towards aligns +Z with its argument.
    Quat::face_towards(&-dir, &up)
}

/// Bounding sphere in some reference frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center.
    pub center: Pt3,
    /// Sphere radius, `>= 0`.
    pub radius: f32,
}

impl BoundingSphere {
    /// Degenerate sphere for scenes without geometry.
    pub fn empty() -> Self {
        Self {
            center: Pt3::origin(),
            radius: 0.0,
        }
    }

    /// Sphere centered on the axis-aligned box of `points`, reaching the farthest point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Pt3> + Clone) -> Self {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        let mut any = false;
        for p in points.clone() {
            min = min.inf(&p.coords);
            max = max.sup(&p.coords);
            any = true;
        }
        if !any {
            return Self::empty();
        }
        let center = Pt3::from((min + max) * 0.5);
        let radius = points
            .into_iter()
            .map(|p| (p - center).norm())
            .fold(0.0_f32, f32::max);
        Self { center, radius }
    }

    /// Radius used downstream for placement, floored at [`MIN_EFFECTIVE_RADIUS`].
    pub fn effective_radius(&self) -> f32 {
        effective_radius(self.radius)
    }
}

pub fn effective_radius(radius: f32) -> f32 {
    if radius.is_finite() {
        radius.max(MIN_EFFECTIVE_RADIUS)
    } else {
        MIN_EFFECTIVE_RADIUS
    }
}

/// Inverse-transpose of the upper 3x3 block, used to carry normals through `m`.
pub fn normal_matrix(m: &Mat4) -> nalgebra::Matrix3<f32> {
    let upper = m.fixed_view::<3, 3>(0, 0).into_owned();
    upper
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(upper)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
