//! Render and export configuration.
//!
//! Both configurations are plain values: every render captures its own copy, so editing the
//! orchestrator's configuration never reaches a render that is already in flight.

use crate::foundation::core::Rgb8;
use crate::foundation::error::{ScenepixError, ScenepixResult};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Largest accepted output edge, in pixels.
pub const MAX_IMAGE_EDGE: u32 = 16_384;

/// Multisampling density of the offscreen renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Antialiasing {
    /// One sample per pixel.
    #[serde(rename = "none")]
    None,
    /// Two samples per pixel.
    #[serde(rename = "2x")]
    X2,
    /// Four samples per pixel.
    #[default]
    #[serde(rename = "4x")]
    X4,
}

impl Antialiasing {
    /// Samples taken per output pixel.
    pub fn samples(self) -> usize {
        match self {
            Self::None => 1,
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }

    /// Parse `none`, `2x` or `4x`.
    pub fn parse(s: &str) -> ScenepixResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "1x" | "off" => Ok(Self::None),
            "2x" => Ok(Self::X2),
            "4x" => Ok(Self::X4),
            other => Err(ScenepixError::validation(format!(
                "unknown antialiasing level '{other}' (expected none, 2x or 4x)"
            ))),
        }
    }
}

/// Camera, output and orientation parameters for one render.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Camera distance as a multiple of the effective scene radius.
    pub camera_distance_multiplier: f32,
    /// Output width in pixels.
    pub image_width: u32,
    /// Output height in pixels.
    pub image_height: u32,
    /// Color of every pixel not covered by geometry.
    pub background_color: Rgb8,
    /// Sampling density.
    pub antialiasing: Antialiasing,
    /// Fixed X rotation in degrees, `[-180, 180]`.
    pub rotation_x: f32,
    /// Fixed Y rotation in degrees, `[-180, 180]`.
    pub rotation_y: f32,
    /// Fixed Z rotation in degrees, `[-180, 180]`.
    pub rotation_z: f32,
    /// Replace `rotation_x` with a fresh uniform angle on every render.
    pub enable_random_x: bool,
    /// Replace `rotation_y` with a fresh uniform angle on every render.
    pub enable_random_y: bool,
    /// Replace `rotation_z` with a fresh uniform angle on every render.
    pub enable_random_z: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            camera_distance_multiplier: 2.5,
            image_width: 1200,
            image_height: 1200,
            background_color: Rgb8::WHITE,
            antialiasing: Antialiasing::X4,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            enable_random_x: false,
            enable_random_y: false,
            enable_random_z: false,
        }
    }
}

impl RenderConfig {
    /// Check ranges; returns the first violation.
    pub fn validate(&self) -> ScenepixResult<()> {
        let m = self.camera_distance_multiplier;
        if !m.is_finite() || m <= 0.0 {
            return Err(ScenepixError::validation(format!(
                "camera_distance_multiplier must be finite and > 0, got {m}"
            )));
        }
        for (name, v) in [
            ("image_width", self.image_width),
            ("image_height", self.image_height),
        ] {
            if v == 0 || v > MAX_IMAGE_EDGE {
                return Err(ScenepixError::validation(format!(
                    "{name} must be in 1..={MAX_IMAGE_EDGE}, got {v}"
                )));
            }
        }
        for (name, v) in [
            ("rotation_x", self.rotation_x),
            ("rotation_y", self.rotation_y),
            ("rotation_z", self.rotation_z),
        ] {
            if !v.is_finite() || !(-180.0..=180.0).contains(&v) {
                return Err(ScenepixError::validation(format!(
                    "{name} must be within [-180, 180] degrees, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// `true` when any axis draws a random angle.
    pub fn has_random_rotation(&self) -> bool {
        self.enable_random_x || self.enable_random_y || self.enable_random_z
    }
}

/// Encoded image container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG, honoring [`ExportConfig::quality`].
    Jpeg,
    /// Uncompressed TIFF.
    Tiff,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Tiff => "tiff",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Tiff => "TIFF",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

/// How rendered images are encoded and where batch output goes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Batch output directory. Chosen by the front-end, never prompted for here.
    pub output_directory: Option<PathBuf>,
    /// Container format.
    pub format: ExportFormat,
    /// Compression quality in `[0, 1]`; only JPEG uses it.
    pub quality: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: None,
            format: ExportFormat::Png,
            quality: 1.0,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> ScenepixResult<()> {
        if !self.quality.is_finite() || !(0.0..=1.0).contains(&self.quality) {
            return Err(ScenepixError::validation(format!(
                "export quality must be within [0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// Output path for an asset base name inside `dir`.
    pub fn output_path(&self, dir: &Path, base_name: &str) -> PathBuf {
        dir.join(format!("{base_name}.{}", self.format.extension()))
    }
}

/// On-disk JSON settings consumed by the command line front-end.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Render parameters.
    pub render: RenderConfig,
    /// Export parameters.
    pub export: ExportConfig,
}

impl ConfigFile {
    pub fn from_reader<R: std::io::Read>(r: R) -> ScenepixResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| ScenepixError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ScenepixResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ScenepixError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ScenepixResult<()> {
        self.render.validate()?;
        self.export.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
