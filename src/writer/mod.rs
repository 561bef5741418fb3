//! PDF writing.
//!
//! ## Architecture
//!
//! ```text
//! PdfDocument (pages, fonts, attachments, images)
//!     ↓
//! [ObjectTable] (numbered indirect objects, open → ended → written)
//!     ↓
//! [PdfWriter] (header, early flush of completed objects, xref, trailer)
//!     ↓
//! [ObjectSerializer] (value → bytes, encryption hook for strings)
//!     ↓
//! sink
//! ```
//!
//! Object numbers are assigned at allocation, so the same sequence of
//! document operations always yields the same numbering.

pub mod embedded_files;
pub mod image_handler;
pub mod object_serializer;
pub mod object_table;
pub mod page;
pub mod pdf_writer;
pub mod xmp_metadata;

pub use embedded_files::{
    AFRelationship, AttachmentOptions, AttachmentRegistry, AttachmentSink, AttachmentSource,
    EmbeddedFile,
};
pub use image_handler::{ColorSpace, ImageData, ImageFormat, ImagePlacement};
pub use object_serializer::{format_number, ObjectSerializer};
pub use object_table::{IndirectObject, ObjectState, ObjectTable};
pub use page::{Page, PageEvent};
pub use pdf_writer::{PdfWriter, Trailer, WriteContext};
pub use xmp_metadata::XmpWriter;
