/// Convenience result alias used across the crate.
pub type ScenepixResult<T> = Result<T, ScenepixError>;

/// Error taxonomy for loading, composing, rendering and exporting scenes.
#[derive(thiserror::Error, Debug)]
pub enum ScenepixError {
    /// Invalid configuration or an operation that is illegal in the current state.
    #[error("validation error: {0}")]
    Validation(String),

    /// The asset could not be read or parsed.
    #[error("load error: {0}")]
    Load(String),

    /// Scene normalization, lighting or camera placement failed.
    #[error("composition error: {0}")]
    Compose(String),

    /// The offscreen renderer failed to produce an image.
    #[error("render error: {0}")]
    Render(String),

    /// Encoding or writing an image failed.
    #[error("export error: {0}")]
    Export(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScenepixError {
    /// Build a [`ScenepixError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScenepixError::Load`].
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`ScenepixError::Compose`].
    pub fn compose(msg: impl Into<String>) -> Self {
        Self::Compose(msg.into())
    }

    /// Build a [`ScenepixError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ScenepixError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
