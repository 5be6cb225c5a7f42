use crate::compose::SceneComposer;
use crate::config::RenderConfig;
use crate::foundation::error::ScenepixResult;
use crate::render::{BackendKind, RenderedImage, SnapshotOpts, create_backend};
use crate::scene::load::{AssetRef, FileSceneLoader, SceneLoader};
use crate::session::worker::{TaskHandle, spawn_task};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

/// One unit of work: load, compose, snapshot.
///
/// Everything the job needs is owned, so configuration edits made after construction can never
/// reach a render in flight.
#[derive(Clone)]
pub struct RenderJob {
    asset: AssetRef,
    config: RenderConfig,
    seed: u64,
    loader: Arc<dyn SceneLoader>,
    backend: BackendKind,
}

impl std::fmt::Debug for RenderJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderJob")
            .field("asset", &self.asset)
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl RenderJob {
    /// `seed` drives any random rotation axes.
    pub fn new(asset: AssetRef, config: RenderConfig, seed: u64) -> Self {
        Self {
            asset,
            config,
            seed,
            loader: Arc::new(FileSceneLoader),
            backend: BackendKind::default(),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn SceneLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// Run the whole sequence on the calling thread.
    #[tracing::instrument(skip(self), fields(asset = %self.asset, seed = self.seed))]
    pub fn run(self) -> ScenepixResult<RenderedImage> {
        let composer = SceneComposer::new(self.config)?;
        let scene = self.loader.load(&self.asset)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let composed = composer.compose(scene, &mut rng)?;
        let mut backend = create_backend(self.backend)?;
        let image = backend.snapshot(&composed, &SnapshotOpts::from_config(composer.config()))?;
        tracing::debug!(width = image.width, height = image.height, "render finished");
        Ok(image)
    }

    /// Run the sequence on a background worker.
    pub fn spawn(self) -> ScenepixResult<TaskHandle<RenderedImage>> {
        let name = format!("scenepix-render-{}", self.asset.base_name());
        spawn_task(name, move || self.run())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_job.rs"]
mod tests;
