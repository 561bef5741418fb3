//! Error types for the PDF assembler.
//!
//! This module defines all error types that can occur while building and writing a document.

/// Result type alias for PDF assembler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while assembling a PDF.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid document configuration (detected before any object is created)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Font bytes are not a recognized font container
    #[error("Unsupported font format in '{resource}': {reason}")]
    UnsupportedFontFormat {
        /// Name of the offending font resource
        resource: String,
        /// Why the container was rejected
        reason: String,
    },

    /// Image bytes carry neither a JPEG nor a PNG signature
    #[error("Unsupported image format in '{0}': expected JPEG or PNG signature")]
    UnsupportedImageFormat(String),

    /// Number outside the range representable in the output syntax
    #[error("Number out of range: {0} (magnitude must be below 1e21)")]
    NumberOutOfRange(f64),

    /// Attachment source could not be normalized
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    /// Encryption was requested but no provider is available
    #[error("Encryption requested but no encryption provider is installed")]
    EncryptionUnavailable,

    /// Internal write-pipeline invariant was breached
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    /// Operation referenced a page or object that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Font error
    #[error("Font error: {0}")]
    Font(String),

    /// Image error
    #[error("Image error: {0}")]
    Image(String),
}
