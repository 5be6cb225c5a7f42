use crate::compose::ComposedScene;
use crate::foundation::core::{Mat4, Pt3, Vec3};
use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::foundation::math::look_rotation;
use crate::render::raster::{self, BAND_ROWS, Sample};
use crate::render::shading::{LightSet, SurfaceTriangle, collect_surfaces};
use crate::render::{RenderBackend, RenderedImage, SnapshotOpts};
use crate::scene::graph::{NodeId, SceneGraph};
use nalgebra::{Isometry3, Perspective3, Translation3};
use rayon::prelude::*;

/// Software rasterizer: visibility buffer per sample, deferred Lambert shading, box resolve.
///
/// Output is a pure function of the composed scene and the snapshot options.
pub struct CpuBackend {
    pool: Option<rayon::ThreadPool>,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    /// Backend running on the global rayon pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Backend running on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> ScenepixResult<Self> {
        if threads == 0 {
            return Err(ScenepixError::validation(
                "render threads must be >= 1 when set",
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("scenepix-raster-{i}"))
            .build()
            .map_err(|e| ScenepixError::render(format!("failed to build rayon thread pool: {e}")))?;
        Ok(Self { pool: Some(pool) })
    }
}

impl RenderBackend for CpuBackend {
    #[tracing::instrument(skip_all, fields(width = opts.width, height = opts.height, aa = ?opts.antialiasing))]
    fn snapshot(
        &mut self,
        composed: &ComposedScene,
        opts: &SnapshotOpts,
    ) -> ScenepixResult<RenderedImage> {
        opts.validate()?;
        let scene = &composed.scene;
        let (eye, view_proj) = camera_transform(scene, composed.camera, opts)?;

        let surfaces = collect_surfaces(scene);
        let job = || {
            let lights = LightSet::gather(scene, &surfaces, composed.effective_radius());
            let tris = raster::project(
                surfaces.iter().map(SurfaceTriangle::corners),
                &view_proj,
                opts.width,
                opts.height,
            );
            tracing::debug!(
                triangles = surfaces.len(),
                projected = tris.len(),
                "rasterizing"
            );

            let offsets = raster::sample_offsets(opts.antialiasing);
            let n = offsets.len();
            let w = opts.width as usize;
            let background = opts.background.to_f32();
            let mut data = vec![0u8; w * opts.height as usize * 4];

            data.par_chunks_mut(BAND_ROWS * w * 4)
                .enumerate()
                .for_each(|(band, out)| {
                    let rows = out.len() / (w * 4);
                    let mut samples = vec![Sample::EMPTY; rows * w * n];
                    raster::rasterize_band(&tris, band * BAND_ROWS, w, offsets, &mut samples);

                    for (px, dst) in out.chunks_exact_mut(4).enumerate() {
                        let mut acc = [0.0f32; 3];
                        for s in &samples[px * n..(px + 1) * n] {
                            let c = match s.covered() {
                                Some((tri, bary)) => {
                                    lights.shade(&surfaces[tri as usize], &bary, &eye)
                                }
                                None => background,
                            };
                            for k in 0..3 {
                                acc[k] += c[k];
                            }
                        }
                        for k in 0..3 {
                            dst[k] = to_u8(acc[k] / n as f32);
                        }
                        dst[3] = 255;
                    }
                });
            data
        };
        let data = match &self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        };

        Ok(RenderedImage {
            width: opts.width,
            height: opts.height,
            data,
        })
    }
}

/// Eye position and combined view-projection matrix of the camera node.
fn camera_transform(
    scene: &SceneGraph,
    id: NodeId,
    opts: &SnapshotOpts,
) -> ScenepixResult<(Pt3, Mat4)> {
    let node = scene.node(id);
    let cam = node.camera().copied().ok_or_else(|| {
        ScenepixError::render(format!("node '{}' is not a camera", node.name))
    })?;
    if !(cam.znear > 0.0 && cam.zfar > cam.znear) {
        return Err(ScenepixError::render(format!(
            "invalid clip range [{}, {}]",
            cam.znear, cam.zfar
        )));
    }
    if !(cam.yfov_deg > 0.0 && cam.yfov_deg < 180.0) {
        return Err(ScenepixError::render(format!(
            "invalid vertical field of view {}",
            cam.yfov_deg
        )));
    }

    let world = scene.world_matrix(id);
    let eye = world.transform_point(&Pt3::origin());
    let view = match cam.look_at {
        Some(constraint) => {
            let target = scene.world_position(constraint.target);
            let rotation = look_rotation(&eye, &target, &Vec3::y());
            Isometry3::from_parts(Translation3::from(eye.coords), rotation)
                .inverse()
                .to_homogeneous()
        }
        None => world
            .try_inverse()
            .ok_or_else(|| ScenepixError::render("camera transform is not invertible"))?,
    };

    let aspect = opts.width as f32 / opts.height as f32;
    let proj = Perspective3::new(aspect, cam.yfov_deg.to_radians(), cam.znear, cam.zfar);
    Ok((eye, proj.to_homogeneous() * view))
}

fn to_u8(c: f32) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
