use crate::config::{ExportConfig, ExportFormat};
use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::render::RenderedImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for finished images.
///
/// Exporters are shared with background workers, so they must be thread-safe. Calling `export`
/// twice with the same inputs overwrites the first result with identical bytes.
pub trait ImageExporter: Send + Sync {
    fn export(&self, image: &RenderedImage, path: &Path, cfg: &ExportConfig) -> ScenepixResult<()>;
}

/// Encode `image` into the container selected by `cfg`.
pub fn encode_image(image: &RenderedImage, cfg: &ExportConfig) -> ScenepixResult<Vec<u8>> {
    cfg.validate()?;
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.data.clone())
        .ok_or_else(|| {
            ScenepixError::export(format!(
                "pixel buffer of {} bytes does not match {}x{}",
                image.data.len(),
                image.width,
                image.height
            ))
        })?;
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut out = Cursor::new(Vec::new());
    let res = match cfg.format {
        ExportFormat::Jpeg => {
            let quality = (cfg.quality * 100.0).round().clamp(1.0, 100.0) as u8;
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)
        }
        other => rgb.write_to(&mut out, other.image_format()),
    };
    res.map_err(|e| {
        ScenepixError::export(format!("encode {}: {e}", cfg.format.display_name()))
    })?;
    Ok(out.into_inner())
}

pub fn ensure_parent_dir(path: &Path) -> ScenepixResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ScenepixError::export(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Encodes with the `image` crate and writes to disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileExporter;

impl ImageExporter for FileExporter {
    #[tracing::instrument(skip(self, image, cfg), fields(path = %path.display()))]
    fn export(&self, image: &RenderedImage, path: &Path, cfg: &ExportConfig) -> ScenepixResult<()> {
        let bytes = encode_image(image, cfg)?;
        ensure_parent_dir(path)?;
        std::fs::write(path, &bytes).map_err(|e| {
            ScenepixError::export(format!("failed to write '{}': {e}", path.display()))
        })?;
        tracing::debug!(bytes = bytes.len(), "image written");
        Ok(())
    }
}

/// Keeps exported images in memory, for tests and previews.
#[derive(Debug, Default)]
pub struct InMemoryExporter {
    exported: Mutex<Vec<(PathBuf, RenderedImage)>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exported paths and images, in export order.
    pub fn exported(&self) -> Vec<(PathBuf, RenderedImage)> {
        self.exported
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.exported().into_iter().map(|(p, _)| p).collect()
    }
}

impl ImageExporter for InMemoryExporter {
    fn export(&self, image: &RenderedImage, path: &Path, cfg: &ExportConfig) -> ScenepixResult<()> {
        cfg.validate()?;
        let mut guard = self
            .exported
            .lock()
            .map_err(|_| ScenepixError::export("in-memory exporter lock poisoned"))?;
        guard.push((path.to_path_buf(), image.clone()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/export.rs"]
mod tests;
