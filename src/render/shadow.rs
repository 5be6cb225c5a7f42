use crate::foundation::core::{Mat4, Pt3};
use crate::render::raster::{self, ScreenTriangle};
use nalgebra::Perspective3;

/// Edge length of a spot light's depth map.
pub(crate) const SHADOW_MAP_SIZE: u32 = 1024;

/// Depth map rendered from a shadow-casting spot light.
pub(crate) struct ShadowMap {
    view: Mat4,
    view_proj: Mat4,
    znear: f32,
    zfar: f32,
    size: u32,
    /// Linear view-space distance of the closest occluder per texel.
    depth: Vec<f32>,
    bias: f32,
}

impl ShadowMap {
    /// Render occluders seen from a light with the given world matrix.
    ///
    /// `reach` bounds how far past the light geometry may lie; `bias` is a world-space offset
    /// that keeps lit surfaces from shadowing themselves.
    pub(crate) fn build<'a>(
        triangles: impl Iterator<Item = [&'a Pt3; 3]>,
        light_world: &Mat4,
        fov_deg: f32,
        reach: f32,
        bias: f32,
    ) -> Option<Self> {
        let view = light_world.try_inverse()?;
        let zfar = reach.max(1e-3);
        let znear = (zfar * 1e-3).max(1e-4);
        let fov = fov_deg.clamp(10.0, 150.0).to_radians();
        let proj = Perspective3::new(1.0, fov, znear, zfar).to_homogeneous();
        let view_proj = proj * view;

        let size = SHADOW_MAP_SIZE;
        let tris: Vec<ScreenTriangle> = raster::project(triangles, &view_proj, size, size);
        let depth = raster::rasterize(&tris, size, size, &[[0.5, 0.5]])
            .into_iter()
            .map(|s| {
                if s.depth.is_finite() {
                    linearize(s.depth, znear, zfar)
                } else {
                    f32::INFINITY
                }
            })
            .collect();

        Some(Self {
            view,
            view_proj,
            znear,
            zfar,
            size,
            depth,
            bias,
        })
    }

    /// Fraction of a 3x3 texel neighborhood in which `p` is lit, in `[0, 1]`.
    pub(crate) fn visibility(&self, p: &Pt3) -> f32 {
        let dist = -self.view.transform_point(p).z;
        if dist <= self.znear || dist >= self.zfar {
            return 1.0;
        }
        let clip = self.view_proj * p.to_homogeneous();
        if clip.w <= f32::EPSILON {
            return 1.0;
        }
        let s = self.size as f32;
        let tx = ((clip.x / clip.w) * 0.5 + 0.5) * s;
        let ty = (0.5 - (clip.y / clip.w) * 0.5) * s;
        if !(0.0..s).contains(&tx) || !(0.0..s).contains(&ty) {
            return 1.0;
        }

        let (cx, cy) = (tx as i64, ty as i64);
        let max = self.size as i64 - 1;
        let mut lit = 0u32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let x = (cx + dx).clamp(0, max) as usize;
                let y = (cy + dy).clamp(0, max) as usize;
                if dist - self.bias <= self.depth[y * self.size as usize + x] {
                    lit += 1;
                }
            }
        }
        lit as f32 / 9.0
    }
}

fn linearize(ndc_z: f32, znear: f32, zfar: f32) -> f32 {
    2.0 * znear * zfar / (zfar + znear - ndc_z * (zfar - znear))
}

#[cfg(test)]
#[path = "../../tests/unit/render/shadow.rs"]
mod tests;
