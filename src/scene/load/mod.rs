//! Asset loading: one "load or fail" operation per file.

mod gltf_import;
mod obj_import;

use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::scene::graph::SceneGraph;
use std::path::{Path, PathBuf};

/// Extensions understood by [`FileSceneLoader`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["obj", "gltf", "glb"];

/// Immutable reference to a 3D scene source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetRef {
    path: PathBuf,
}

impl AssetRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directory and extension, used to name exported images.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }

    /// Lowercase extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// `true` when the path has an extension [`FileSceneLoader`] can read.
pub fn is_supported_asset(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

/// Turns an asset reference into a scene graph, or fails.
pub trait SceneLoader: Send + Sync {
    fn load(&self, asset: &AssetRef) -> ScenepixResult<SceneGraph>;
}

/// Loads OBJ and glTF files from disk, dispatching on the extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSceneLoader;

impl SceneLoader for FileSceneLoader {
    #[tracing::instrument(level = "debug", skip(self), fields(asset = %asset))]
    fn load(&self, asset: &AssetRef) -> ScenepixResult<SceneGraph> {
        if !asset.path().is_file() {
            return Err(ScenepixError::load(format!(
                "'{}' does not exist or is not a file",
                asset.path().display()
            )));
        }
        let scene = match asset.extension().as_deref() {
            Some("obj") => obj_import::load_obj(asset.path())?,
            Some("gltf") | Some("glb") => gltf_import::load_gltf(asset.path())?,
            other => {
                return Err(ScenepixError::load(format!(
                    "unsupported asset format '{}' for '{}'",
                    other.unwrap_or(""),
                    asset.path().display()
                )));
            }
        };
        tracing::debug!(
            nodes = scene.node_count(),
            meshes = scene.meshes().len(),
            "asset loaded"
        );
        Ok(scene)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/scene/load.rs"]
mod tests;
