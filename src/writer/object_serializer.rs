//! PDF value serialization.
//!
//! Converts [`Object`] values to their byte representation following the
//! PDF syntax rules. Text and date strings optionally pass through an
//! encryption callback before they are escaped.

use crate::error::{Error, Result};
use crate::object::{Dictionary, NameTree, Object};
use chrono::{DateTime, Utc};
use std::io::Write;

/// Callback applied to string payloads before escaping.
pub type EncryptFn<'a> = &'a dyn Fn(&[u8]) -> Vec<u8>;

/// Largest magnitude accepted for numbers (exclusive).
const MAX_MAGNITUDE: f64 = 1e21;

/// Serializer for PDF values.
///
/// Stateless apart from the optional encryption callback.
#[derive(Clone, Copy, Default)]
pub struct ObjectSerializer<'a> {
    encrypt: Option<EncryptFn<'a>>,
}

impl std::fmt::Debug for ObjectSerializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectSerializer")
            .field("encrypted", &self.encrypt.is_some())
            .finish()
    }
}

/// Convert a value to bytes, optionally encrypting string payloads.
pub fn convert(value: &Object, encrypt: Option<EncryptFn<'_>>) -> Result<Vec<u8>> {
    ObjectSerializer { encrypt }.serialize(value)
}

impl<'a> ObjectSerializer<'a> {
    /// Create a serializer without encryption.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer that encrypts text and date strings.
    pub fn with_encryption(encrypt: EncryptFn<'a>) -> Self {
        Self {
            encrypt: Some(encrypt),
        }
    }

    /// Serialize a value to bytes.
    pub fn serialize(&self, obj: &Object) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj)?;
        Ok(buf)
    }

    /// Serialize a value to a string (for debugging and tests).
    pub fn serialize_to_string(&self, obj: &Object) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.serialize(obj)?).into_owned())
    }

    /// Write a value to a buffer.
    pub fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> Result<()> {
        match obj {
            Object::Null => write!(w, "null")?,
            Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" })?,
            Object::Integer(i) => write!(w, "{}", i)?,
            Object::Real(r) => write!(w, "{}", format_number(*r)?)?,
            Object::Name(n) => write_name(w, n)?,
            Object::Text(s) => self.write_text(w, s)?,
            Object::ByteString(bytes) => self.write_hex_string(w, bytes)?,
            Object::Date(date) => self.write_literal(w, format_date(date).as_bytes())?,
            Object::Array(arr) => self.write_array(w, arr)?,
            Object::Dictionary(dict) => self.write_dictionary(w, dict)?,
            Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen)?,
            Object::Tree(tree) => self.write_name_tree(w, tree)?,
        }
        Ok(())
    }

    /// Write a text string, wide-encoding it when any character is above 0x7F.
    fn write_text<W: Write>(&self, w: &mut W, text: &str) -> Result<()> {
        self.write_literal(w, &encode_text(text))
    }

    /// Encrypt (if configured) and write bytes as a hex string.
    fn write_hex_string<W: Write>(&self, w: &mut W, data: &[u8]) -> Result<()> {
        match self.encrypt {
            Some(encrypt) => write_hex(w, &encrypt(data))?,
            None => write_hex(w, data)?,
        }
        Ok(())
    }

    /// Encrypt (if configured), escape, and wrap bytes in parentheses.
    fn write_literal<W: Write>(&self, w: &mut W, data: &[u8]) -> Result<()> {
        let encrypted;
        let data = match self.encrypt {
            Some(encrypt) => {
                encrypted = encrypt(data);
                &encrypted[..]
            },
            None => data,
        };

        w.write_all(b"(")?;
        for &byte in data {
            match byte {
                b'(' => w.write_all(b"\\(")?,
                b')' => w.write_all(b"\\)")?,
                b'\\' => w.write_all(b"\\\\")?,
                b'\n' => w.write_all(b"\\n")?,
                b'\r' => w.write_all(b"\\r")?,
                b'\t' => w.write_all(b"\\t")?,
                0x08 => w.write_all(b"\\b")?,
                0x0C => w.write_all(b"\\f")?,
                _ => w.write_all(&[byte])?,
            }
        }
        w.write_all(b")")?;
        Ok(())
    }

    /// Write a PDF array.
    fn write_array<W: Write>(&self, w: &mut W, arr: &[Object]) -> Result<()> {
        w.write_all(b"[")?;
        for (i, obj) in arr.iter().enumerate() {
            if i > 0 {
                w.write_all(b" ")?;
            }
            self.write_object(w, obj)?;
        }
        w.write_all(b"]")?;
        Ok(())
    }

    /// Write a PDF dictionary, one entry per line, in insertion order.
    fn write_dictionary<W: Write>(&self, w: &mut W, dict: &Dictionary) -> Result<()> {
        w.write_all(b"<<\n")?;
        for (key, value) in dict {
            write_name(w, key)?;
            w.write_all(b" ")?;
            self.write_object(w, value)?;
            w.write_all(b"\n")?;
        }
        w.write_all(b">>")?;
        Ok(())
    }

    /// Write a name tree as a flat `/Names` array.
    fn write_name_tree<W: Write>(&self, w: &mut W, tree: &NameTree) -> Result<()> {
        w.write_all(b"<<\n/Names [\n")?;
        for (key, value) in tree {
            self.write_text(w, key)?;
            w.write_all(b" ")?;
            self.write_object(w, value)?;
            w.write_all(b"\n")?;
        }
        w.write_all(b"]\n>>")?;
        Ok(())
    }
}

/// Format a number with at most six fractional digits.
///
/// Values with a magnitude of 1e21 or more (and non-finite values) are rejected.
pub fn format_number(n: f64) -> Result<String> {
    if !n.is_finite() || n <= -MAX_MAGNITUDE || n >= MAX_MAGNITUDE {
        return Err(Error::NumberOutOfRange(n));
    }
    // Half-up rounding, negative halves included.
    let rounded = (n * 1e6 + 0.5).floor() / 1e6;
    if rounded == 0.0 {
        return Ok("0".to_string());
    }
    Ok(format!("{}", rounded))
}

/// Render a date as `D:YYYYMMDDHHmmssZ`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Encode text as 7-bit bytes, or UTF-16BE with a byte-order mark when needed.
pub fn encode_text(text: &str) -> Vec<u8> {
    if text.chars().any(|c| c as u32 > 0x7F) {
        let mut out = Vec::with_capacity(2 + text.len() * 2);
        out.extend_from_slice(&[0xFE, 0xFF]);
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        out
    } else {
        text.as_bytes().to_vec()
    }
}

/// Write a PDF name.
///
/// Names start with `/` and escape special characters with `#xx`.
fn write_name<W: Write>(w: &mut W, name: &str) -> std::io::Result<()> {
    w.write_all(b"/")?;
    for byte in name.bytes() {
        match byte {
            b'#' | b'%' | b'(' | b')' | b'/' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' => {
                write!(w, "#{:02X}", byte)?;
            },
            0x21..=0x7E => w.write_all(&[byte])?,
            _ => write!(w, "#{:02X}", byte)?,
        }
    }
    Ok(())
}

/// Write bytes as an uppercase hex string.
fn write_hex<W: Write>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    w.write_all(b"<")?;
    for byte in data {
        write!(w, "{:02X}", byte)?;
    }
    w.write_all(b">")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;
    use chrono::TimeZone;

    fn render(obj: &Object) -> String {
        ObjectSerializer::new().serialize_to_string(obj).unwrap()
    }

    #[test]
    fn test_serialize_null() {
        assert_eq!(render(&Object::Null), "null");
    }

    #[test]
    fn test_serialize_boolean() {
        assert_eq!(render(&Object::Boolean(true)), "true");
        assert_eq!(render(&Object::Boolean(false)), "false");
    }

    #[test]
    fn test_serialize_integer() {
        assert_eq!(render(&Object::Integer(42)), "42");
        assert_eq!(render(&Object::Integer(-123)), "-123");
    }

    #[test]
    fn test_serialize_real_rounds_to_six_places() {
        assert_eq!(render(&Object::Real(0.1234567)), "0.123457");
        assert_eq!(render(&Object::Real(1.0)), "1");
        assert_eq!(render(&Object::Real(0.5)), "0.5");
        assert_eq!(render(&Object::Real(-2.25)), "-2.25");
        assert_eq!(render(&Object::Real(612.0)), "612");
    }

    #[test]
    fn test_serialize_negative_zero() {
        assert_eq!(render(&Object::Real(-0.0)), "0");
        assert_eq!(render(&Object::Real(-0.0000001)), "0");
    }

    #[test]
    fn test_serialize_real_out_of_range() {
        let s = ObjectSerializer::new();
        assert!(matches!(s.serialize(&Object::Real(2e21)), Err(Error::NumberOutOfRange(_))));
        assert!(matches!(s.serialize(&Object::Real(-2e21)), Err(Error::NumberOutOfRange(_))));
        assert!(s.serialize(&Object::Real(f64::NAN)).is_err());
        assert!(s.serialize(&Object::Real(9.99e20)).is_ok());
    }

    #[test]
    fn test_out_of_range_inside_array_aborts() {
        let arr = Object::Array(vec![Object::Integer(1), Object::Real(1e22)]);
        assert!(ObjectSerializer::new().serialize(&arr).is_err());
    }

    #[test]
    fn test_serialize_text() {
        assert_eq!(render(&Object::text("Hello")), "(Hello)");
        assert_eq!(render(&Object::text("Test (parens)")), "(Test \\(parens\\))");
        assert_eq!(render(&Object::text("a\\b\nc")), "(a\\\\b\\nc)");
    }

    #[test]
    fn test_serialize_wide_text() {
        let bytes = ObjectSerializer::new().serialize(&Object::text("é")).unwrap();
        assert_eq!(bytes, vec![b'(', 0xFE, 0xFF, 0x00, 0xE9, b')']);
    }

    #[test]
    fn test_serialize_byte_string() {
        assert_eq!(render(&Object::ByteString(vec![0x00, 0xFF, 0x80])), "<00FF80>");
    }

    #[test]
    fn test_byte_string_passes_through_encryption() {
        let invert = |data: &[u8]| data.iter().map(|b| !b).collect::<Vec<u8>>();
        let serializer = ObjectSerializer::with_encryption(&invert);
        let bytes = serializer.serialize(&Object::ByteString(vec![0x00, 0x0F])).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "<FFF0>");
    }

    #[test]
    fn test_serialize_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(render(&Object::Date(date)), "(D:20240309070501Z)");
    }

    #[test]
    fn test_serialize_name_with_special_chars() {
        assert_eq!(render(&Object::name("Type")), "/Type");
        assert_eq!(render(&Object::name("Name With Space")), "/Name#20With#20Space");
        assert_eq!(render(&Object::name("text/csv")), "/text#2Fcsv");
    }

    #[test]
    fn test_serialize_array() {
        let arr = Object::Array(vec![Object::Integer(1), Object::Integer(2), Object::Integer(3)]);
        assert_eq!(render(&arr), "[1 2 3]");
    }

    #[test]
    fn test_serialize_dictionary_keeps_order() {
        let dict = Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Count", Object::Integer(1)),
        ]);
        assert_eq!(render(&dict), "<<\n/Type /Page\n/Count 1\n>>");
    }

    #[test]
    fn test_serialize_reference() {
        assert_eq!(render(&Object::Reference(ObjectRef::new(10, 0))), "10 0 R");
    }

    #[test]
    fn test_serialize_name_tree_sorted() {
        let mut tree = NameTree::new();
        tree.insert("b.txt".to_string(), Object::Reference(ObjectRef::new(8, 0)));
        tree.insert("a.txt".to_string(), Object::Reference(ObjectRef::new(9, 0)));
        assert_eq!(render(&Object::Tree(tree)), "<<\n/Names [\n(a.txt) 9 0 R\n(b.txt) 8 0 R\n]\n>>");
    }

    #[test]
    fn test_encryption_skips_names() {
        let upper = |data: &[u8]| data.iter().map(|b| b.to_ascii_uppercase()).collect::<Vec<_>>();
        let s = ObjectSerializer::with_encryption(&upper);
        let dict = Object::dict(vec![
            ("T", Object::text("abc")),
            ("N", Object::name("abc")),
            ("B", Object::ByteString(vec![b'a'])),
        ]);
        assert_eq!(s.serialize_to_string(&dict).unwrap(), "<<\n/T (ABC)\n/N /abc\n/B <41>\n>>");
    }

    #[test]
    fn test_convert_function() {
        let out = convert(&Object::Real(0.1234567), None).unwrap();
        assert_eq!(out, b"0.123457");
    }
}
