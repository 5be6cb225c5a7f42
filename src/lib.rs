//! scenepix turns 3D asset files into consistently framed, lit and oriented still images.
//!
//! The pipeline is one-directional:
//!
//! - Load an asset into a [`SceneGraph`] through a [`SceneLoader`]
//! - Normalize, light and frame it with a [`SceneComposer`]
//! - Snapshot it with a [`RenderBackend`] into a [`RenderedImage`]
//! - Encode and persist it with an [`ImageExporter`]
//!
//! [`BatchOrchestrator`] drives that pipeline over a queue of files, one [`RenderJob`] at a
//! time, with per-file state, progress events and cooperative cancellation.
#![forbid(unsafe_code)]

mod foundation;

pub mod compose;
pub mod config;
pub mod encode;
pub mod render;
pub mod scene;
pub mod session;

pub use crate::foundation::core::{Mat4, Pt3, Quat, Rgb8, Transform, Vec3};
pub use crate::foundation::error::{ScenepixError, ScenepixResult};
pub use crate::foundation::math::{BoundingSphere, euler_xyz, look_rotation};

pub use crate::compose::{ComposedScene, EulerRadians, SceneComposer};
pub use crate::config::{Antialiasing, ConfigFile, ExportConfig, ExportFormat, RenderConfig};
pub use crate::encode::{FileExporter, ImageExporter, InMemoryExporter, encode_image};
pub use crate::render::cpu::CpuBackend;
pub use crate::render::{BackendKind, RenderBackend, RenderedImage, SnapshotOpts, create_backend};
pub use crate::scene::graph::{NodeId, NodeKind, SceneGraph};
pub use crate::scene::load::{AssetRef, FileSceneLoader, SceneLoader, is_supported_asset};
pub use crate::session::{
    BatchEvent, BatchObserver, BatchOpts, BatchOrchestrator, BatchProgress, BatchSummary,
    CancelToken, ChannelObserver, FileJob, JobId, JobState, JobStatus, NoopObserver,
    RecordingObserver, RenderJob,
};
