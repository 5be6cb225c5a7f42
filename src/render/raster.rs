//! Scanline-free edge-function rasterizer producing a per-sample visibility buffer.

use crate::config::Antialiasing;
use crate::foundation::core::{Mat4, Pt3, Vec3};
use nalgebra::Vector4;
use rayon::prelude::*;

/// Rows handled by one parallel work item.
pub(crate) const BAND_ROWS: usize = 16;

const NO_TRIANGLE: u32 = u32::MAX;

/// Sample positions inside a pixel, in pixel units from its top-left corner.
pub(crate) fn sample_offsets(aa: Antialiasing) -> &'static [[f32; 2]] {
    match aa {
        Antialiasing::None => &[[0.5, 0.5]],
        Antialiasing::X2 => &[[0.25, 0.25], [0.75, 0.75]],
        Antialiasing::X4 => &[[0.375, 0.125], [0.875, 0.375], [0.125, 0.625], [0.625, 0.875]],
    }
}

/// Closest surface seen by one sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Sample {
    /// NDC depth in `[-1, 1]`, smaller is closer.
    pub depth: f32,
    /// Source triangle, or `u32::MAX` when nothing covers the sample.
    pub triangle: u32,
    /// Perspective-correct barycentrics on the source triangle (weights of corners 0 and 1).
    pub bary: [f32; 2],
}

impl Sample {
    pub const EMPTY: Self = Self {
        depth: f32::INFINITY,
        triangle: NO_TRIANGLE,
        bary: [0.0; 2],
    };

    pub fn covered(&self) -> Option<(u32, Vec3)> {
        (self.triangle != NO_TRIANGLE).then(|| {
            let [a, b] = self.bary;
            (self.triangle, Vec3::new(a, b, 1.0 - a - b))
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct ClipVertex {
    clip: Vector4<f32>,
    bary: Vec3,
}

#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
    bary_over_w: Vec3,
}

/// Projected triangle ready for coverage tests.
#[derive(Clone, Debug)]
pub(crate) struct ScreenTriangle {
    source: u32,
    v: [ScreenVertex; 3],
    inv_area: f32,
    min: [i64; 2],
    max: [i64; 2],
}

/// Project world-space triangles through `view_proj` onto a `width` x `height` target.
///
/// Triangles are clipped against the near plane; the piece index keeps pointing at the source
/// triangle so attributes can be fetched later.
pub(crate) fn project<'a>(
    triangles: impl Iterator<Item = [&'a Pt3; 3]>,
    view_proj: &Mat4,
    width: u32,
    height: u32,
) -> Vec<ScreenTriangle> {
    let mut out = Vec::new();
    for (i, tri) in triangles.enumerate() {
        let corners = [Vec3::x(), Vec3::y(), Vec3::z()];
        let verts: [ClipVertex; 3] = std::array::from_fn(|k| ClipVertex {
            clip: view_proj * tri[k].to_homogeneous(),
            bary: corners[k],
        });
        for piece in clip_near(verts) {
            if let Some(t) = to_screen(i as u32, &piece, width, height) {
                out.push(t);
            }
        }
    }
    out
}

/// Sutherland-Hodgman against `z >= -w`, fan-triangulated.
fn clip_near(tri: [ClipVertex; 3]) -> Vec<[ClipVertex; 3]> {
    let dist = |v: &ClipVertex| v.clip.z + v.clip.w;
    if tri.iter().all(|v| dist(v) >= 0.0) {
        return vec![tri];
    }
    let mut poly: Vec<ClipVertex> = Vec::with_capacity(4);
    for k in 0..3 {
        let a = tri[k];
        let b = tri[(k + 1) % 3];
        let (da, db) = (dist(&a), dist(&b));
        if da >= 0.0 {
            poly.push(a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            let t = da / (da - db);
            poly.push(ClipVertex {
                clip: a.clip.lerp(&b.clip, t),
                bary: a.bary.lerp(&b.bary, t),
            });
        }
    }
    (1..poly.len().saturating_sub(1))
        .map(|k| [poly[0], poly[k], poly[k + 1]])
        .collect()
}

fn to_screen(source: u32, tri: &[ClipVertex; 3], width: u32, height: u32) -> Option<ScreenTriangle> {
    let (w, h) = (width as f32, height as f32);
    let mut v = [ScreenVertex {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        inv_w: 0.0,
        bary_over_w: Vec3::zeros(),
    }; 3];
    for (dst, src) in v.iter_mut().zip(tri) {
        if src.clip.w <= f32::EPSILON {
            return None;
        }
        let inv_w = 1.0 / src.clip.w;
        *dst = ScreenVertex {
            x: (src.clip.x * inv_w * 0.5 + 0.5) * w,
            y: (0.5 - src.clip.y * inv_w * 0.5) * h,
            z: src.clip.z * inv_w,
            inv_w,
            bary_over_w: src.bary * inv_w,
        };
    }
    let area = edge(&v[0], &v[1], v[2].x, v[2].y);
    if !area.is_finite() || area.abs() <= 1e-12 {
        return None;
    }

    let min_x = v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor() as i64;
    let max_x = v.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil() as i64;
    let min_y = v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor() as i64;
    let max_y = v.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil() as i64;
    let min = [min_x.max(0), min_y.max(0)];
    let max = [max_x.min(width as i64 - 1), max_y.min(height as i64 - 1)];
    if min[0] > max[0] || min[1] > max[1] {
        return None;
    }
    Some(ScreenTriangle {
        source,
        v,
        inv_area: 1.0 / area,
        min,
        max,
    })
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Rasterize `tris` into `band`, which holds `band.len() / (width * offsets.len())` rows
/// starting at row `y0`. Sample `s` of pixel `(x, y)` lives at `((y - y0) * width + x) * n + s`.
pub(crate) fn rasterize_band(
    tris: &[ScreenTriangle],
    y0: usize,
    width: usize,
    offsets: &[[f32; 2]],
    band: &mut [Sample],
) {
    let n = offsets.len();
    let rows = band.len() / (width * n);
    let y1 = y0 + rows;
    for t in tris {
        let ty0 = (t.min[1] as usize).max(y0);
        let ty1 = (t.max[1] as usize + 1).min(y1);
        if ty0 >= ty1 {
            continue;
        }
        let [v0, v1, v2] = &t.v;
        for y in ty0..ty1 {
            for x in t.min[0] as usize..=t.max[0] as usize {
                for (s, [ox, oy]) in offsets.iter().enumerate() {
                    let (px, py) = (x as f32 + ox, y as f32 + oy);
                    let b0 = edge(v1, v2, px, py) * t.inv_area;
                    let b1 = edge(v2, v0, px, py) * t.inv_area;
                    let b2 = edge(v0, v1, px, py) * t.inv_area;
                    if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                        continue;
                    }
                    let z = b0 * v0.z + b1 * v1.z + b2 * v2.z;
                    if !(-1.0..=1.0).contains(&z) {
                        continue;
                    }
                    let slot = &mut band[((y - y0) * width + x) * n + s];
                    if z >= slot.depth {
                        continue;
                    }
                    let denom = b0 * v0.inv_w + b1 * v1.inv_w + b2 * v2.inv_w;
                    let bary =
                        (v0.bary_over_w * b0 + v1.bary_over_w * b1 + v2.bary_over_w * b2) / denom;
                    *slot = Sample {
                        depth: z,
                        triangle: t.source,
                        bary: [bary.x, bary.y],
                    };
                }
            }
        }
    }
}

/// Rasterize a whole target in parallel bands.
pub(crate) fn rasterize(
    tris: &[ScreenTriangle],
    width: u32,
    height: u32,
    offsets: &[[f32; 2]],
) -> Vec<Sample> {
    let (w, n) = (width as usize, offsets.len());
    let mut samples = vec![Sample::EMPTY; w * height as usize * n];
    samples
        .par_chunks_mut(BAND_ROWS * w * n)
        .enumerate()
        .for_each(|(band, chunk)| rasterize_band(tris, band * BAND_ROWS, w, offsets, chunk));
    samples
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
