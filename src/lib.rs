// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::new_without_default)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # PDF Quill
//!
//! Incremental PDF document assembler.
//!
//! ## Core Features
//!
//! - **Deterministic numbering**: object numbers follow allocation order, so
//!   identical operation sequences give identical object layouts
//! - **Early flush**: completed objects are written as soon as possible and
//!   only the offsets are kept for the cross-reference table
//! - **Page retention**: keep one page, a window of pages or every page
//!   editable before it is committed
//! - **Font embedding**: CID-keyed Type0 fonts with `/CIDSet`, widths and a
//!   ToUnicode CMap built from the glyphs actually drawn
//! - **Attachments**: embedded files from bytes or `data:` URIs with
//!   per-name content deduplication
//! - **Conformance**: PDF/A output intents and XMP identification, PDF/UA
//!   catalog requirements
//! - **Protection hook**: permanent file identifier plus a pluggable
//!   [`EncryptionProvider`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_quill::{AttachmentOptions, DocumentOptions, PdfDocument};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let font = std::fs::read("fonts/Roboto-Regular.ttf")?;
//! let options = DocumentOptions::new("Roboto", font).with_pdf_version("1.7".parse()?);
//!
//! let mut doc = PdfDocument::new(options)?;
//! doc.text("Roboto", 24.0, 72.0, 720.0, "Hello, world")?;
//! doc.file("data:text/plain;base64,aGVsbG8=", AttachmentOptions::new().with_name("hello.txt"))?;
//!
//! std::fs::write("hello.pdf", doc.finish()?)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Object model
pub mod object;

// Configuration
pub mod config;

// Conformance subsets
pub mod compliance;

// Protection hook
pub mod encryption;

// Font embedding
pub mod fonts;

// Write pipeline
pub mod writer;

// Document assembly
pub mod document;

// Re-exports
pub use compliance::{PdfALevel, Subset};
pub use config::{DocumentInfo, DocumentOptions, PageRetention, PdfVersion};
pub use document::{DocumentBuilder, ImageHandle, PageObserver, PdfDocument};
pub use encryption::{EncryptionProvider, SecurityOptions};
pub use error::{Error, Result};
pub use fonts::{FontLoader, FontProgram};
pub use object::{Dictionary, NameTree, Object, ObjectRef};
pub use writer::{AFRelationship, AttachmentOptions, AttachmentSource, ImagePlacement, PageEvent};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
