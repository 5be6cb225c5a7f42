use crate::compose::ComposedScene;
use crate::config::{Antialiasing, RenderConfig};
use crate::foundation::core::Rgb8;
use crate::foundation::error::{ScenepixError, ScenepixResult};

pub mod cpu;
mod raster;
mod shading;
mod shadow;

/// Straight-alpha RGBA8 raster, row-major, fully opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RenderedImage {
    /// Image of the given size filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgb8) -> Self {
        let px = [color.r, color.g, color.b, 255];
        let data = px
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Number of pixels whose RGB differs from `color`.
    pub fn count_not(&self, color: Rgb8) -> usize {
        self.data
            .chunks_exact(4)
            .filter(|p| p[0] != color.r || p[1] != color.g || p[2] != color.b)
            .count()
    }
}

/// Output parameters of one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotOpts {
    pub width: u32,
    pub height: u32,
    pub antialiasing: Antialiasing,
    pub background: Rgb8,
}

impl SnapshotOpts {
    pub fn from_config(cfg: &RenderConfig) -> Self {
        Self {
            width: cfg.image_width,
            height: cfg.image_height,
            antialiasing: cfg.antialiasing,
            background: cfg.background_color,
        }
    }

    pub fn validate(&self) -> ScenepixResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScenepixError::render(format!(
                "snapshot size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Produces a single still frame from a composed scene.
///
/// Implementations only read the scene; the caller's graph is never modified.
pub trait RenderBackend: Send {
    fn snapshot(
        &mut self,
        scene: &ComposedScene,
        opts: &SnapshotOpts,
    ) -> ScenepixResult<RenderedImage>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Multithreaded software rasterizer.
    #[default]
    Cpu,
}

pub fn create_backend(kind: BackendKind) -> ScenepixResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(cpu::CpuBackend::new())),
    }
}

#[cfg(test)]
#[path = "../tests/unit/render/mod.rs"]
mod tests;
