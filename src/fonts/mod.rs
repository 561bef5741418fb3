//! Font embedding.
//!
//! Fonts are embedded as CID-keyed composite fonts with Identity-H encoding,
//! a used-glyph `/CIDSet` and a ToUnicode CMap for text extraction.

pub mod cmap;
mod embedded;
pub mod font_subsetter;
mod program;
mod truetype_parser;

pub use cmap::{BfRange, ToUnicodeCMap};
pub use embedded::EmbeddedFont;
pub use font_subsetter::{subset_tag, CidAssignment, GlyphTable, UsedGlyph};
pub use program::{
    DescriptorFlags, FontLoader, FontMetrics, FontProgram, GlyphRun, OutlineFormat, ShapedGlyph,
};
pub use truetype_parser::{TrueTypeLoader, TrueTypeProgram};
