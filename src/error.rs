//! Error types for icon generation.

use thiserror::Error;

use crate::catalog::IconFamily;

/// Result alias used throughout the crate.
pub type Result<T, E = FaviconError> = std::result::Result<T, E>;

/// Errors raised by the icon generation pipeline.
///
/// Every variant surfaces to the caller of [`IconPipeline`](crate::IconPipeline);
/// nothing is retried internally.
#[derive(Debug, Error)]
pub enum FaviconError {
    /// The input set or configuration is invalid (empty sources, bad color).
    ///
    /// Raised before any output is produced.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A source extension or decoded format is not supported.
    #[error("\"{format}\" is not supported (source `{name}`)")]
    UnsupportedFormat { name: String, format: String },

    /// Source bytes could not be decoded or rasterized.
    #[error("failed to decode `{name}`: {reason}")]
    Decode { name: String, reason: String },

    /// A single target failed to render.
    #[error("failed to render {family} icon `{filename}`: {source}")]
    Render {
        family: IconFamily,
        filename: String,
        #[source]
        source: Box<FaviconError>,
    },

    /// The container packer was called with nothing to pack.
    #[error("invalid container input: {0}")]
    InvalidInput(String),

    /// PNG or ICO encoding failed.
    #[error("failed to encode `{filename}`: {source}")]
    Encode {
        filename: String,
        #[source]
        source: image::ImageError,
    },

    /// A render worker thread could not be started.
    #[error("failed to start render worker: {0}")]
    Worker(#[source] std::io::Error),

    /// A JSON configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl FaviconError {
    pub(crate) fn decode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
