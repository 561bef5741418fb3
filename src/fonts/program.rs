//! The font-parsing capability consumed by the embedder.
//!
//! Parsing and shaping live behind [`FontProgram`] so the embedder only deals
//! with glyph ids, advances and metrics. [`crate::fonts::TrueTypeLoader`] is the
//! built-in implementation.

use crate::error::Result;
use bitflags::bitflags;

/// Outline technology of a font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineFormat {
    /// `glyf` outlines, embedded as `/FontFile2`
    TrueType,
    /// CFF outlines in an OpenType wrapper, embedded as `/FontFile3`
    Cff,
}

bitflags! {
    /// FontDescriptor `/Flags` bits (PDF 32000-1 Table 123).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DescriptorFlags: u32 {
        /// All glyphs have the same width
        const FIXED_PITCH = 1;
        /// Glyphs have serifs
        const SERIF = 1 << 1;
        /// Glyphs outside the standard Latin set
        const SYMBOLIC = 1 << 2;
        /// Glyphs are slanted
        const ITALIC = 1 << 6;
    }
}

/// Global metrics in font design units.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Design units per em
    pub units_per_em: u16,
    /// Typographic ascender
    pub ascender: i16,
    /// Typographic descender (negative)
    pub descender: i16,
    /// Height of capital letters
    pub cap_height: i16,
    /// Height of lowercase x
    pub x_height: i16,
    /// Italic angle in degrees
    pub italic_angle: f32,
    /// Font bounding box (llx, lly, urx, ury)
    pub bbox: [i16; 4],
    /// Monospaced font
    pub is_fixed_pitch: bool,
    /// Serif font
    pub is_serif: bool,
    /// Italic or oblique font
    pub is_italic: bool,
    /// Number of glyphs in the program
    pub glyph_count: u16,
}

impl FontMetrics {
    /// Convert design units to text space units (1/1000 em).
    pub fn scale(&self, value: i32) -> f64 {
        if self.units_per_em == 0 {
            return value as f64;
        }
        value as f64 * 1000.0 / self.units_per_em as f64
    }

    /// Descriptor flags derived from the metrics.
    ///
    /// Fonts embedded as CID-keyed fonts are always flagged symbolic.
    pub fn descriptor_flags(&self) -> DescriptorFlags {
        let mut flags = DescriptorFlags::SYMBOLIC;
        if self.is_fixed_pitch {
            flags |= DescriptorFlags::FIXED_PITCH;
        }
        if self.is_serif {
            flags |= DescriptorFlags::SERIF;
        }
        if self.is_italic {
            flags |= DescriptorFlags::ITALIC;
        }
        flags
    }
}

/// One positioned glyph produced by shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph {
    /// Glyph id in the font program
    pub glyph_id: u16,
    /// Horizontal advance in design units
    pub x_advance: i32,
    /// Byte offset of the source cluster in the shaped text
    pub cluster: usize,
}

/// A shaped piece of text together with the source text of every glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    glyphs: Vec<ShapedGlyph>,
    sources: Vec<String>,
}

impl GlyphRun {
    /// Attach cluster text to shaped glyphs.
    ///
    /// A cluster spans from its offset up to the next larger cluster offset in
    /// the run (or the end of the text). Every glyph of a cluster maps to the
    /// whole cluster text.
    pub fn new(text: &str, glyphs: Vec<ShapedGlyph>) -> Self {
        let mut starts: Vec<usize> = glyphs.iter().map(|g| g.cluster).collect();
        starts.sort_unstable();
        starts.dedup();

        let sources = glyphs
            .iter()
            .map(|glyph| {
                let start = glyph.cluster.min(text.len());
                let end = starts
                    .iter()
                    .copied()
                    .find(|&s| s > glyph.cluster)
                    .unwrap_or(text.len())
                    .min(text.len());
                text.get(start..end).unwrap_or_default().to_string()
            })
            .collect();

        Self { glyphs, sources }
    }

    /// The shaped glyphs in visual order.
    pub fn glyphs(&self) -> &[ShapedGlyph] {
        &self.glyphs
    }

    /// Source text of the glyph at `index`.
    pub fn source(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    /// Glyphs paired with their source text.
    pub fn iter(&self) -> impl Iterator<Item = (&ShapedGlyph, &str)> {
        self.glyphs.iter().zip(self.sources.iter().map(String::as_str))
    }

    /// Total advance in design units.
    pub fn advance(&self) -> i64 {
        self.glyphs.iter().map(|g| g.x_advance as i64).sum()
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the run has no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// A parsed font program.
pub trait FontProgram {
    /// PostScript name from the `name` table.
    fn postscript_name(&self) -> &str;

    /// Global metrics.
    fn metrics(&self) -> &FontMetrics;

    /// Outline technology.
    fn outline_format(&self) -> OutlineFormat;

    /// Horizontal advance of a glyph in design units.
    fn glyph_advance(&self, glyph_id: u16) -> u16;

    /// Shape `text` into positioned glyphs.
    fn shape(&self, text: &str) -> Vec<ShapedGlyph>;

    /// The complete program bytes.
    fn data(&self) -> &[u8];

    /// Build a program containing only `glyph_ids`, renumbered in the given
    /// order. Returns `None` when the program cannot be subset.
    fn subset(&self, _glyph_ids: &[u16]) -> Option<Vec<u8>> {
        None
    }
}

/// Opens font programs from raw bytes.
pub trait FontLoader {
    /// Parse `data`, selecting `family` inside a collection when given.
    ///
    /// Unrecognized containers fail with
    /// [`crate::Error::UnsupportedFontFormat`].
    fn open(&self, data: &[u8], family: Option<&str>) -> Result<Box<dyn FontProgram>>;
}
