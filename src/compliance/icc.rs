//! Built-in sRGB ICC profile for archival output intents.
//!
//! The profile is an ICC v2 display-class matrix/TRC profile with the
//! D50-adapted sRGB colorants and a single gamma 2.2 curve. It is generated
//! byte-for-byte deterministically so identical documents stay identical.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

/// Description and output condition identifier of the built-in profile.
pub const SRGB_IDENTIFIER: &str = "sRGB IEC61966-2.1";

const HEADER_LEN: usize = 128;
const D50: [f64; 3] = [0.9642, 1.0, 0.8249];
const RED: [f64; 3] = [0.4361, 0.2225, 0.0139];
const GREEN: [f64; 3] = [0.3851, 0.7169, 0.0971];
const BLUE: [f64; 3] = [0.1431, 0.0606, 0.7141];

fn s15_fixed16(value: f64) -> i32 {
    (value * 65536.0).round() as i32
}

fn xyz_tag(xyz: [f64; 3]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(20);
    buf.write_all(b"XYZ ")?;
    buf.write_u32::<BigEndian>(0)?;
    for v in xyz {
        buf.write_i32::<BigEndian>(s15_fixed16(v))?;
    }
    Ok(buf)
}

fn curve_tag(gamma: f64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(14);
    buf.write_all(b"curv")?;
    buf.write_u32::<BigEndian>(0)?;
    buf.write_u32::<BigEndian>(1)?;
    buf.write_u16::<BigEndian>((gamma * 256.0).round() as u16)?;
    Ok(buf)
}

fn description_tag(text: &str) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.write_all(b"desc")?;
    buf.write_u32::<BigEndian>(0)?;
    buf.write_u32::<BigEndian>(text.len() as u32 + 1)?;
    buf.write_all(text.as_bytes())?;
    buf.write_u8(0)?;
    // Empty Unicode and ScriptCode descriptions.
    buf.write_u32::<BigEndian>(0)?;
    buf.write_u32::<BigEndian>(0)?;
    buf.write_u16::<BigEndian>(0)?;
    buf.write_u8(0)?;
    buf.write_all(&[0u8; 67])?;
    Ok(buf)
}

fn text_tag(text: &str) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.write_all(b"text")?;
    buf.write_u32::<BigEndian>(0)?;
    buf.write_all(text.as_bytes())?;
    buf.write_u8(0)?;
    Ok(buf)
}

fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

/// Build the sRGB profile bytes.
pub fn srgb_profile() -> io::Result<Vec<u8>> {
    let curve = curve_tag(2.2)?;
    // (signature, data index); the three TRC tags share one curve.
    let blobs = [
        description_tag(SRGB_IDENTIFIER)?,
        xyz_tag(D50)?,
        xyz_tag(RED)?,
        xyz_tag(GREEN)?,
        xyz_tag(BLUE)?,
        curve,
        text_tag("No copyright, use freely")?,
    ];
    let tags: [(&[u8; 4], usize); 9] = [
        (b"desc", 0),
        (b"wtpt", 1),
        (b"rXYZ", 2),
        (b"gXYZ", 3),
        (b"bXYZ", 4),
        (b"rTRC", 5),
        (b"gTRC", 5),
        (b"bTRC", 5),
        (b"cprt", 6),
    ];

    let table_len = 4 + 12 * tags.len();
    let mut offsets = Vec::with_capacity(blobs.len());
    let mut cursor = HEADER_LEN + table_len;
    for blob in &blobs {
        offsets.push(cursor);
        cursor += pad4(blob.len());
    }
    let total = cursor;

    let mut out = Vec::with_capacity(total);
    out.write_u32::<BigEndian>(total as u32)?;
    out.write_u32::<BigEndian>(0)?; // preferred CMM
    out.write_u32::<BigEndian>(0x0210_0000)?;
    out.write_all(b"mntr")?;
    out.write_all(b"RGB ")?;
    out.write_all(b"XYZ ")?;
    for field in [2024u16, 1, 1, 0, 0, 0] {
        out.write_u16::<BigEndian>(field)?;
    }
    out.write_all(b"acsp")?;
    out.write_all(&[0u8; 24])?; // platform, flags, manufacturer, model, attributes
    out.write_u32::<BigEndian>(0)?; // perceptual intent
    for v in D50 {
        out.write_i32::<BigEndian>(s15_fixed16(v))?;
    }
    out.write_all(&[0u8; HEADER_LEN - 80])?;

    out.write_u32::<BigEndian>(tags.len() as u32)?;
    for (signature, index) in tags {
        out.write_all(signature)?;
        out.write_u32::<BigEndian>(offsets[index] as u32)?;
        out.write_u32::<BigEndian>(blobs[index].len() as u32)?;
    }
    for blob in &blobs {
        out.write_all(blob)?;
        out.resize(pad4(out.len()), 0);
    }
    debug_assert_eq!(out.len(), total);
    Ok(out)
}
