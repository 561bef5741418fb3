//! Used-glyph tracking and subset metadata.
//!
//! Tracks which glyphs a document uses and derives everything the subset
//! font dictionaries need from that set: CID assignment, the `/CIDSet`
//! bitmask, `/DW` and `/W` widths, and the deterministic subset tag
//! (e.g. `"BAJJZZ+FontName"`, PDF 32000-1 Section 9.9).

use crate::object::Object;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};

/// How glyph codes are derived from glyph ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidAssignment {
    /// Codes are allocated densely in first-seen order
    Dense,
    /// Codes equal glyph ids
    Identity,
}

/// One registered glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsedGlyph {
    /// Glyph id in the font program
    pub glyph_id: u16,
    /// Code written to content streams
    pub cid: u16,
    /// Source text the glyph was shaped from
    pub text: String,
}

/// Append-only table of glyphs used by a document, in first-seen order.
///
/// `.notdef` (glyph 0) is always registered as code 0.
#[derive(Debug, Clone)]
pub struct GlyphTable {
    assignment: CidAssignment,
    glyphs: IndexMap<u16, UsedGlyph>,
}

impl GlyphTable {
    /// Create a table holding only `.notdef`.
    pub fn new(assignment: CidAssignment) -> Self {
        let mut glyphs = IndexMap::new();
        glyphs.insert(
            0,
            UsedGlyph {
                glyph_id: 0,
                cid: 0,
                text: "\0".to_string(),
            },
        );
        Self { assignment, glyphs }
    }

    /// Record a glyph as used and return its code.
    ///
    /// A glyph seen before keeps its code and source text.
    pub fn register(&mut self, glyph_id: u16, text: &str) -> u16 {
        if let Some(used) = self.glyphs.get(&glyph_id) {
            return used.cid;
        }
        let cid = match self.assignment {
            CidAssignment::Dense => self.glyphs.len() as u16,
            CidAssignment::Identity => glyph_id,
        };
        if text.is_empty() {
            log::warn!("Glyph {} registered without source text", glyph_id);
        }
        self.glyphs.insert(
            glyph_id,
            UsedGlyph {
                glyph_id,
                cid,
                text: text.to_string(),
            },
        );
        cid
    }

    /// Code of a registered glyph.
    pub fn cid_of(&self, glyph_id: u16) -> Option<u16> {
        self.glyphs.get(&glyph_id).map(|g| g.cid)
    }

    /// Code assignment mode.
    pub fn assignment(&self) -> CidAssignment {
        self.assignment
    }

    /// Number of distinct glyphs, `.notdef` included.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether only `.notdef` is registered.
    pub fn is_empty(&self) -> bool {
        self.glyphs.len() <= 1
    }

    /// Glyphs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &UsedGlyph> {
        self.glyphs.values()
    }

    /// Glyph ids in first-seen order, i.e. dense code order.
    pub fn glyph_ids(&self) -> Vec<u16> {
        self.glyphs.keys().copied().collect()
    }

    /// Highest code in use.
    pub fn max_cid(&self) -> u16 {
        self.glyphs.values().map(|g| g.cid).max().unwrap_or(0)
    }

    /// `/CIDSet` bitmask: bit `cid` is set (most significant bit first) iff
    /// the code is used.
    pub fn cid_set(&self) -> Vec<u8> {
        let mut bits = vec![0u8; self.max_cid() as usize / 8 + 1];
        for glyph in self.glyphs.values() {
            bits[(glyph.cid >> 3) as usize] |= 0x80 >> (glyph.cid & 7);
        }
        bits
    }

    /// `/CIDToGIDMap` stream data: two big-endian bytes per code.
    pub fn cid_to_gid_map(&self) -> std::io::Result<Vec<u8>> {
        use byteorder::{BigEndian, WriteBytesExt};

        let mut gids = vec![0u16; self.max_cid() as usize + 1];
        for glyph in self.glyphs.values() {
            gids[glyph.cid as usize] = glyph.glyph_id;
        }
        let mut out = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            out.write_u16::<BigEndian>(gid)?;
        }
        Ok(out)
    }
}

/// Default width and width exceptions for a CID font.
#[derive(Debug, Clone, PartialEq)]
pub struct CidWidths {
    /// `/DW`
    pub default_width: i64,
    /// `/W` runs: first code and consecutive widths
    pub runs: Vec<(u16, Vec<i64>)>,
}

impl CidWidths {
    /// Compute widths from `(cid, width)` pairs.
    ///
    /// The default width is the most frequent one (ties go to the smaller
    /// width); only codes with a different width are listed.
    pub fn compute(widths: &BTreeMap<u16, i64>) -> Self {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for &w in widths.values() {
            *counts.entry(w).or_insert(0) += 1;
        }
        let default_width = counts
            .iter()
            .max_by(|(wa, ca), (wb, cb)| ca.cmp(cb).then(wb.cmp(wa)))
            .map(|(&w, _)| w)
            .unwrap_or(1000);

        let mut runs: Vec<(u16, Vec<i64>)> = Vec::new();
        for (&cid, &w) in widths {
            if w == default_width {
                continue;
            }
            match runs.last_mut() {
                Some((start, ws)) if *start as usize + ws.len() == cid as usize => ws.push(w),
                _ => runs.push((cid, vec![w])),
            }
        }
        Self {
            default_width,
            runs,
        }
    }

    /// The `/W` array.
    pub fn to_array(&self) -> Object {
        let mut array = Vec::with_capacity(self.runs.len() * 2);
        for (start, widths) in &self.runs {
            array.push(Object::Integer(*start as i64));
            array.push(Object::Array(widths.iter().map(|&w| Object::Integer(w)).collect()));
        }
        Object::Array(array)
    }
}

/// Six-letter subset tag derived from an embedding id.
///
/// Characters 2 through 7 of the id (padded with `'I'`) are each shifted
/// up by 17, so `"F1"` becomes `"BZZZZZ"` and `"F1099"` becomes `"BAJJZZ"`.
pub fn subset_tag(id: &str) -> String {
    let bytes = id.as_bytes();
    (1..=6)
        .map(|i| bytes.get(i).copied().unwrap_or(73).wrapping_add(17) as char)
        .collect()
}

/// The subset font name, `TAG+PostScriptName` with spaces replaced.
pub fn subset_font_name(id: &str, postscript_name: &str) -> String {
    format!("{}+{}", subset_tag(id), postscript_name.replace(' ', "_"))
}
