//! TrueType/OpenType font programs.
//!
//! This module wraps the `ttf-parser` crate to extract the metrics needed for
//! a FontDescriptor and `rustybuzz` to shape text. Both parse the same bytes
//! independently; no parsed face outlives a call.
//!
//! # Accepted containers
//!
//! - `0x00010000` / `true`: TrueType outlines
//! - `OTTO`: OpenType with CFF outlines
//! - `ttcf`: font collections (the face is chosen by family name)

use super::program::{FontLoader, FontMetrics, FontProgram, OutlineFormat, ShapedGlyph};
use crate::error::{Error, Result};
use ttf_parser::{name_id, Face, GlyphId};

const MAGIC_TRUETYPE: [u8; 4] = [0x00, 0x01, 0x00, 0x00];
const MAGIC_APPLE: &[u8; 4] = b"true";
const MAGIC_OPENTYPE: &[u8; 4] = b"OTTO";
const MAGIC_COLLECTION: &[u8; 4] = b"ttcf";

/// Opens TrueType and OpenType programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueTypeLoader;

impl TrueTypeLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }
}

impl FontLoader for TrueTypeLoader {
    fn open(&self, data: &[u8], family: Option<&str>) -> Result<Box<dyn FontProgram>> {
        Ok(Box::new(TrueTypeProgram::parse(data, family)?))
    }
}

/// A parsed TrueType/OpenType font program.
#[derive(Debug)]
pub struct TrueTypeProgram {
    data: Vec<u8>,
    face_index: u32,
    postscript_name: String,
    metrics: FontMetrics,
    format: OutlineFormat,
    /// Horizontal advances indexed by glyph id
    advances: Vec<u16>,
}

fn unsupported(family: Option<&str>, reason: impl Into<String>) -> Error {
    Error::UnsupportedFontFormat {
        resource: family.unwrap_or("<font data>").to_string(),
        reason: reason.into(),
    }
}

fn face_name(face: &Face<'_>, id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == id)
        .and_then(|name| name.to_string())
}

/// Pick the collection member whose family or PostScript name matches.
fn select_face(data: &[u8], family: Option<&str>) -> u32 {
    let (Some(wanted), Some(count)) = (family, ttf_parser::fonts_in_collection(data)) else {
        return 0;
    };
    for index in 0..count {
        if let Ok(face) = Face::parse(data, index) {
            let matches = [name_id::FAMILY, name_id::FULL_NAME, name_id::POST_SCRIPT_NAME]
                .iter()
                .any(|&id| face_name(&face, id).as_deref() == Some(wanted));
            if matches {
                return index;
            }
        }
    }
    log::warn!("Family '{}' not found in collection; using face 0", wanted);
    0
}

impl TrueTypeProgram {
    /// Parse a font program from raw bytes.
    pub fn parse(data: &[u8], family: Option<&str>) -> Result<Self> {
        let magic = data
            .get(..4)
            .ok_or_else(|| unsupported(family, "font data is shorter than a header"))?;
        if magic != MAGIC_TRUETYPE
            && magic != MAGIC_APPLE
            && magic != MAGIC_OPENTYPE
            && magic != MAGIC_COLLECTION
        {
            return Err(unsupported(
                family,
                format!("unknown container signature {:02X?}", magic),
            ));
        }

        let face_index = select_face(data, family);
        let face = Face::parse(data, face_index).map_err(|e| unsupported(family, e.to_string()))?;

        let postscript_name = face_name(&face, name_id::POST_SCRIPT_NAME)
            .or_else(|| family.map(str::to_string))
            .unwrap_or_else(|| "Unknown".to_string());

        let bbox = face.global_bounding_box();
        let ascender = face.ascender();
        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascender,
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or(ascender),
            x_height: face.x_height().unwrap_or((ascender as f32 * 0.5) as i16),
            italic_angle: face.italic_angle().unwrap_or(0.0),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            is_fixed_pitch: face.is_monospaced(),
            is_serif: false,
            is_italic: face.is_italic(),
            glyph_count: face.number_of_glyphs(),
        };

        let format = if face.tables().cff.is_some() {
            OutlineFormat::Cff
        } else {
            OutlineFormat::TrueType
        };

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0))
            .collect();

        log::debug!(
            "Parsed font '{}' ({:?}, {} glyphs, face {})",
            postscript_name,
            format,
            metrics.glyph_count,
            face_index
        );

        Ok(Self {
            data: data.to_vec(),
            face_index,
            postscript_name,
            metrics,
            format,
            advances,
        })
    }

    /// Shape using the `cmap` table only, one glyph per character.
    fn shape_with_cmap(&self, text: &str) -> Vec<ShapedGlyph> {
        let face = Face::parse(&self.data, self.face_index).ok();
        text.char_indices()
            .map(|(cluster, ch)| {
                let glyph_id = face
                    .as_ref()
                    .and_then(|f| f.glyph_index(ch))
                    .map(|g| g.0)
                    .unwrap_or(0);
                ShapedGlyph {
                    glyph_id,
                    x_advance: self.glyph_advance(glyph_id) as i32,
                    cluster,
                }
            })
            .collect()
    }
}

impl FontProgram for TrueTypeProgram {
    fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn outline_format(&self) -> OutlineFormat {
        self.format
    }

    fn glyph_advance(&self, glyph_id: u16) -> u16 {
        self.advances.get(glyph_id as usize).copied().unwrap_or(0)
    }

    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        let Some(face) = rustybuzz::Face::from_slice(&self.data, self.face_index) else {
            log::warn!(
                "Shaper rejected '{}'; falling back to cmap lookup",
                self.postscript_name
            );
            return self.shape_with_cmap(text);
        };

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let shaped = rustybuzz::shape(&face, &[], buffer);

        shaped
            .glyph_infos()
            .iter()
            .zip(shaped.glyph_positions())
            .map(|(info, pos)| ShapedGlyph {
                glyph_id: u16::try_from(info.glyph_id).unwrap_or(0),
                x_advance: pos.x_advance,
                cluster: info.cluster as usize,
            })
            .collect()
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}
