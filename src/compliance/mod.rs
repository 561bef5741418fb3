//! Conformance subsets (archival and accessibility profiles).
//!
//! ## PDF/A Conformance Levels (Archival)
//!
//! - **PDF/A-1b**: Basic conformance, visual appearance preservation
//! - **PDF/A-1a**: Full conformance, includes logical structure (Tagged PDF)
//! - **PDF/A-2b**: Based on PDF 1.7
//! - **PDF/A-2a**: PDF/A-2b plus logical structure
//! - **PDF/A-2u**: PDF/A-2b plus Unicode mapping
//! - **PDF/A-3b**: PDF/A-2b plus embedded files of any type
//! - **PDF/A-3a**: PDF/A-3b plus logical structure
//! - **PDF/A-3u**: PDF/A-3b plus Unicode mapping
//!
//! Archival documents carry an ICC color profile with an output intent, and
//! every subset gets an XMP metadata stream identifying it.
//!
//! ## PDF/UA Requirements (Accessibility)
//!
//! - Document must be a Tagged PDF
//! - Viewers must display the document title

pub mod icc;
pub mod pdf_a;
pub mod pdf_ua;
mod types;

pub use types::{PdfALevel, Subset};
