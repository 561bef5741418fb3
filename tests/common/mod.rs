//! Shared helpers for integration tests.
//!
//! Fonts are simulated with a deterministic program that maps every
//! character to the glyph with the same number, so tests do not need font
//! files on disk.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use pdf_quill::fonts::{FontMetrics, FontProgram, OutlineFormat, ShapedGlyph};
use pdf_quill::{DocumentInfo, DocumentOptions, FontLoader, PdfDocument, Result};
use regex::bytes::Regex;
use std::cell::Cell;
use std::rc::Rc;

/// Enable log output for a test run (`RUST_LOG=debug cargo test`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Font program with one glyph per character code.
pub struct MockFont {
    pub format: OutlineFormat,
    pub shapes: Rc<Cell<usize>>,
    metrics: FontMetrics,
}

impl FontProgram for MockFont {
    fn postscript_name(&self) -> &str {
        "Mock Sans"
    }

    fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn outline_format(&self) -> OutlineFormat {
        self.format
    }

    fn glyph_advance(&self, glyph_id: u16) -> u16 {
        match glyph_id {
            0 => 0,
            0x20 => 250,
            _ => 600,
        }
    }

    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        self.shapes.set(self.shapes.get() + 1);
        text.char_indices()
            .map(|(cluster, ch)| ShapedGlyph {
                glyph_id: ch as u16,
                x_advance: self.glyph_advance(ch as u16) as i32,
                cluster,
            })
            .collect()
    }

    fn data(&self) -> &[u8] {
        b"\x00\x01\x00\x00mock font program"
    }
}

/// Loader handing out [`MockFont`]s and counting shaping calls.
#[derive(Clone)]
pub struct MockLoader {
    pub format: OutlineFormat,
    pub shapes: Rc<Cell<usize>>,
}

impl MockLoader {
    pub fn new(format: OutlineFormat) -> Self {
        Self {
            format,
            shapes: Rc::new(Cell::new(0)),
        }
    }
}

impl FontLoader for MockLoader {
    fn open(&self, _data: &[u8], _family: Option<&str>) -> Result<Box<dyn FontProgram>> {
        Ok(Box::new(MockFont {
            format: self.format,
            shapes: Rc::clone(&self.shapes),
            metrics: FontMetrics {
                units_per_em: 1000,
                ascender: 900,
                descender: -250,
                cap_height: 700,
                x_height: 480,
                italic_angle: 0.0,
                bbox: [-50, -250, 1000, 900],
                is_fixed_pitch: false,
                is_serif: false,
                is_italic: false,
                glyph_count: 512,
            },
        }))
    }
}

/// Options with the mock default font, no compression and a fixed date.
pub fn options() -> DocumentOptions {
    let info = DocumentInfo::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        .with_title("Integration");
    DocumentOptions::new("Mock", vec![0, 1, 0, 0])
        .with_compress(false)
        .with_info(info)
}

/// Build a document using the mock loader.
pub fn document(options: DocumentOptions) -> PdfDocument {
    init_logging();
    PdfDocument::builder(options)
        .font_loader(MockLoader::new(OutlineFormat::TrueType))
        .build()
        .unwrap()
}

/// Parsed view of a finished file.
pub struct ParsedPdf {
    pub bytes: Vec<u8>,
    pub xref: Vec<u64>,
}

impl ParsedPdf {
    pub fn parse(bytes: Vec<u8>) -> Self {
        let startxref = Regex::new(r"startxref\n(\d+)\n%%EOF\n$").unwrap();
        let caps = startxref.captures(&bytes).expect("startxref");
        let offset: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();

        let header = Regex::new(r"^xref\n0 (\d+)\n").unwrap();
        let caps = header.captures(&bytes[offset..]).expect("xref header");
        let count: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
        let mut pos = offset + caps[0].len();

        let mut xref = Vec::with_capacity(count);
        for _ in 0..count {
            let entry = std::str::from_utf8(&bytes[pos..pos + 20]).unwrap();
            xref.push(entry[..10].parse().unwrap());
            pos += 20;
        }
        Self { bytes, xref }
    }

    /// Number of indirect objects (excluding the free entry).
    pub fn object_count(&self) -> usize {
        self.xref.len() - 1
    }

    /// Bytes of object `id` from `obj` up to and including `endobj`.
    pub fn object(&self, id: usize) -> &[u8] {
        let start = self.xref[id] as usize;
        let end = find(&self.bytes[start..], b"endobj").expect("endobj") + start + 6;
        &self.bytes[start..end]
    }

    /// Object `id` as text (lossy).
    pub fn object_text(&self, id: usize) -> String {
        String::from_utf8_lossy(self.object(id)).into_owned()
    }

    /// Stream data of object `id`.
    pub fn stream(&self, id: usize) -> &[u8] {
        let obj = self.object(id);
        let start = find(obj, b"\nstream\n").expect("stream keyword") + 8;
        let end = rfind(obj, b"\nendstream").expect("endstream");
        &obj[start..end]
    }

    /// Integer value of `/key` in object `id`.
    pub fn integer(&self, id: usize, key: &str) -> Option<i64> {
        let re = Regex::new(&format!(r"/{} (-?\d+)\n", regex::escape(key))).unwrap();
        re.captures(self.object(id))
            .map(|c| std::str::from_utf8(&c[1]).unwrap().parse().unwrap())
    }

    /// Object number referenced by `/key` in object `id`.
    pub fn reference(&self, id: usize, key: &str) -> Option<usize> {
        let re = Regex::new(&format!(r"/{} (\d+) 0 R", regex::escape(key))).unwrap();
        re.captures(self.object(id))
            .map(|c| std::str::from_utf8(&c[1]).unwrap().parse().unwrap())
    }

    /// Ids of objects whose body contains `needle`.
    pub fn objects_containing(&self, needle: &str) -> Vec<usize> {
        (1..=self.object_count())
            .filter(|&id| find(self.object(id), needle.as_bytes()).is_some())
            .collect()
    }

    /// The trailer dictionary text.
    pub fn trailer(&self) -> String {
        let start = rfind(&self.bytes, b"trailer\n").expect("trailer");
        String::from_utf8_lossy(&self.bytes[start..]).into_owned()
    }
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
