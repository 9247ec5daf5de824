/// Convenience result type used across slidecast.
pub type SlideResult<T> = Result<T, SlideError>;

/// Error taxonomy for library operations. Run-level outcomes live in
/// [`crate::pipeline::RunError`].
#[derive(thiserror::Error, Debug)]
pub enum SlideError {
    /// Invalid configuration, script or caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Decoding, probing or encoding media through ffmpeg failed.
    #[error("media error: {0}")]
    Media(String),

    /// Rasterizing subtitles onto a still failed.
    #[error("composite error: {0}")]
    Composite(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlideError {
    /// Build a [`SlideError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SlideError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`SlideError::Composite`] value.
    pub fn composite(msg: impl Into<String>) -> Self {
        Self::Composite(msg.into())
    }

    /// Build a [`SlideError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
