//! Error types for DOM-to-PPTX export.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting a DOM subtree to a slide.
///
/// Only [`Error::RootNotFound`] aborts an export on its own; the per-node
/// failures (bad colors, broken images) are degraded silently by the walker.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The export root could not be resolved.
    #[error("Root element not found: {0}")]
    RootNotFound(String),

    /// The DOM snapshot document is malformed.
    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    /// An image could not be loaded, decoded, or re-encoded.
    #[error("Image error: {0}")]
    ImageError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML writing error (for PPTX).
    #[error("XML writing error: {0}")]
    XmlError(String),

    /// SVG rasterisation error.
    #[error("SVG error: {0}")]
    SvgError(String),
}
