//! Error types for the hookframe engine
//!
//! Only the export boundary can fail. Formatting, scaling and layout are
//! total functions and never produce one of these.

use thiserror::Error;

/// Result type alias for export and configuration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting a post image
#[derive(Error, Debug)]
pub enum Error {
    /// Export was requested before a preview was mounted
    #[error("Preview not ready: render the preview before exporting")]
    PreviewNotReady,

    /// Export was requested with no content to render
    #[error("Nothing to export: add some content first")]
    EmptyContent,

    /// Another export is still running
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Rasterization or PNG encoding failed
    #[error("Rendering failed: {0}")]
    RasterizationError(String),

    /// No usable font file could be found for a family
    #[error("Font unavailable: {0}")]
    FontUnavailable(String),

    /// The creator avatar could not be loaded or decoded
    #[error("Avatar could not be loaded: {0}")]
    AvatarError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Writing the exported file failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same export without changing settings may succeed.
    ///
    /// Precondition failures need user action first and are not retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::PreviewNotReady | Error::EmptyContent | Error::ConfigError(_) => false,
            Error::ExportInProgress
            | Error::RasterizationError(_)
            | Error::FontUnavailable(_)
            | Error::AvatarError(_)
            | Error::IoError(_)
            | Error::Other(_) => true,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::RasterizationError(err.to_string())
    }
}
