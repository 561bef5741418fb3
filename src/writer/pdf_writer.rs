//! PDF write pipeline.
//!
//! Pushes the header, every indirect object in creation order, the
//! cross-reference table and the trailer to a caller-supplied sink while
//! tracking the byte offset of each object.

use super::object_serializer::ObjectSerializer;
use super::object_table::{IndirectObject, ObjectTable};
use crate::encryption::EncryptionProvider;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use std::io::Write;

/// Compress data using Flate/Deflate compression.
///
/// Returns compressed bytes suitable for FlateDecode filter.
pub fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Per-document settings consumed while writing objects.
#[derive(Clone, Copy, Default)]
pub struct WriteContext<'a> {
    /// Flate-compress eligible streams
    pub compress: bool,
    /// Hook applied to strings and stream data
    pub encryption: Option<&'a dyn EncryptionProvider>,
}

/// Entries of the trailer dictionary besides `/Size`.
#[derive(Debug, Clone)]
pub struct Trailer {
    /// Document catalog
    pub root: ObjectRef,
    /// Info dictionary
    pub info: ObjectRef,
    /// Permanent file identifier
    pub id: Vec<u8>,
    /// Encryption dictionary, if the document is protected
    pub encrypt: Option<ObjectRef>,
}

/// Sink wrapper that counts bytes written.
struct CountingWriter<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Sequential PDF writer over any byte sink.
pub struct PdfWriter<W: Write> {
    sink: CountingWriter<W>,
}

impl<W: Write> PdfWriter<W> {
    /// Wrap a sink. Nothing is written yet.
    pub fn new(sink: W) -> Self {
        Self {
            sink: CountingWriter {
                inner: sink,
                position: 0,
            },
        }
    }

    /// Number of bytes pushed to the sink so far.
    pub fn position(&self) -> u64 {
        self.sink.position
    }

    /// Write the `%PDF-x.y` header and the binary marker comment.
    pub fn write_header(&mut self, version: &str) -> Result<()> {
        writeln!(self.sink, "%PDF-{}", version)?;
        self.sink.write_all(b"%\xE2\xE3\xCF\xD3\n")?;
        Ok(())
    }

    /// Write every completed object in ascending id order.
    ///
    /// Returns the number of objects written by this call.
    pub fn flush_ready(&mut self, table: &mut ObjectTable, ctx: &WriteContext<'_>) -> Result<usize> {
        let mut count = 0;
        for idx in table.ready_indices() {
            if let Some(obj) = table.at_mut(idx) {
                self.write_object(obj, ctx)?;
                table.record_written();
                count += 1;
            }
        }
        if count > 0 {
            log::debug!("Flushed {} objects ({} bytes so far)", count, self.position());
        }
        Ok(count)
    }

    /// Write one indirect object and record its offset.
    pub(crate) fn write_object(&mut self, obj: &mut IndirectObject, ctx: &WriteContext<'_>) -> Result<()> {
        let id = obj.id();
        let compressible = obj.compressible();
        let encryptable = obj.encryptable();
        let (mut payload, stream) = obj.take_for_write();
        let encryption = ctx.encryption.filter(|_| encryptable);

        let data = match stream {
            Some(raw) => {
                let dict = payload.as_dict_mut().ok_or_else(|| {
                    Error::Invariant(format!("stream object {} has a non-dictionary payload", id))
                })?;
                let mut data = raw.to_vec();
                if ctx.compress && compressible && !dict.contains_key("Filter") {
                    data = compress_data(&data)?;
                    dict.insert("Filter".to_string(), Object::name("FlateDecode"));
                }
                if let Some(provider) = encryption {
                    data = provider.encrypt(&data, id, 0);
                }
                dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
                Some(data)
            },
            None => None,
        };

        let body = match encryption {
            Some(provider) => {
                let encrypt_fn = |bytes: &[u8]| provider.encrypt(bytes, id, 0);
                ObjectSerializer::with_encryption(&encrypt_fn).serialize(&payload)?
            },
            None => ObjectSerializer::new().serialize(&payload)?,
        };

        let offset = self.position();
        writeln!(self.sink, "{} 0 obj", id)?;
        self.sink.write_all(&body)?;
        if let Some(data) = data {
            self.sink.write_all(b"\nstream\n")?;
            self.sink.write_all(&data)?;
            self.sink.write_all(b"\nendstream")?;
        }
        self.sink.write_all(b"\nendobj\n")?;
        obj.mark_written(offset);
        Ok(())
    }

    /// Write the cross-reference table, trailer and end-of-file markers.
    ///
    /// Every object must already be written.
    pub fn write_xref_and_trailer(&mut self, table: &ObjectTable, trailer: &Trailer) -> Result<()> {
        let mut entries = Vec::with_capacity(table.len() + 1);
        entries.push("0000000000 65535 f \n".to_string());
        for obj in table.iter() {
            let offset = obj.offset().ok_or_else(|| {
                Error::Invariant(format!("object {} has no offset at xref time", obj.id()))
            })?;
            entries.push(format!("{:010} 00000 n \n", offset));
        }
        if entries.len() != table.len() + 1 {
            return Err(Error::Invariant(format!(
                "xref has {} entries for {} objects",
                entries.len(),
                table.len()
            )));
        }

        let xref_start = self.position();
        write!(self.sink, "xref\n0 {}\n", entries.len())?;
        for entry in &entries {
            self.sink.write_all(entry.as_bytes())?;
        }

        let mut dict = vec![
            ("Size", Object::Integer(entries.len() as i64)),
            ("Root", Object::Reference(trailer.root)),
            ("Info", Object::Reference(trailer.info)),
            (
                "ID",
                Object::Array(vec![
                    Object::ByteString(trailer.id.clone()),
                    Object::ByteString(trailer.id.clone()),
                ]),
            ),
        ];
        if let Some(encrypt) = trailer.encrypt {
            dict.push(("Encrypt", Object::Reference(encrypt)));
        }

        self.sink.write_all(b"trailer\n")?;
        let body = ObjectSerializer::new().serialize(&Object::dict(dict))?;
        self.sink.write_all(&body)?;
        write!(self.sink, "\nstartxref\n{}\n%%EOF\n", xref_start)?;
        log::info!("Wrote xref with {} entries at offset {}", entries.len(), xref_start);
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trailer() -> Trailer {
        Trailer {
            root: ObjectRef::new(1, 0),
            info: ObjectRef::new(2, 0),
            id: b"abc".to_vec(),
            encrypt: None,
        }
    }

    #[test]
    fn test_header() {
        let mut writer = PdfWriter::new(Vec::new());
        writer.write_header("1.7").unwrap();
        let bytes = writer.into_inner().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7\n%"));
        assert_eq!(bytes.len(), 15);
    }

    #[test]
    fn test_offsets_point_at_object_tokens() {
        let mut table = ObjectTable::new();
        table.create(Object::dict(vec![("Type", Object::name("Catalog"))]));
        table.create(Object::Integer(42));
        table.end_all();

        let mut writer = PdfWriter::new(Vec::new());
        writer.write_header("1.4").unwrap();
        writer.flush_ready(&mut table, &WriteContext::default()).unwrap();
        writer.write_xref_and_trailer(&table, &trailer()).unwrap();
        let bytes = writer.into_inner().unwrap();

        for obj in table.iter() {
            let offset = obj.offset().unwrap() as usize;
            let token = format!("{} 0 obj", obj.id());
            assert_eq!(&bytes[offset..offset + token.len()], token.as_bytes());
        }
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("xref\n0 3\n0000000000 65535 f \n"));
        assert!(text.contains("/Size 3"));
        assert!(text.contains("/ID [<616263> <616263>]"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_stream_length_after_compression() {
        let mut table = ObjectTable::new();
        let r = table.create_stream(Object::dict(vec![]), &[b'a'; 500]);
        table.end_all();

        let mut writer = PdfWriter::new(Vec::new());
        let ctx = WriteContext {
            compress: true,
            encryption: None,
        };
        writer.flush_ready(&mut table, &ctx).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Filter /FlateDecode"));
        assert!(!text.contains("/Length 500"));
        assert!(table.get(r).unwrap().offset().is_some());
    }

    #[test]
    fn test_uncompressible_stream_kept_raw() {
        let mut table = ObjectTable::new();
        let r = table.create_stream(Object::dict(vec![]), b"hello");
        table.get_mut(r).unwrap().set_compress(false);
        table.end_all();

        let mut writer = PdfWriter::new(Vec::new());
        let ctx = WriteContext {
            compress: true,
            encryption: None,
        };
        writer.flush_ready(&mut table, &ctx).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "1 0 obj\n<<\n/Length 5\n>>\nstream\nhello\nendstream\nendobj\n");
    }

    #[test]
    fn test_open_object_does_not_block_later_ones() {
        let mut table = ObjectTable::new();
        let open = table.create(Object::dict(vec![]));
        let done = table.create(Object::Integer(7));
        table.end(done).unwrap();

        let mut writer = PdfWriter::new(Vec::new());
        writer.write_header("1.7").unwrap();
        assert_eq!(writer.flush_ready(&mut table, &WriteContext::default()).unwrap(), 1);
        assert_eq!(table.get(done).unwrap().offset(), Some(15));
        assert!(table.get(open).unwrap().offset().is_none());

        table.end(open).unwrap();
        assert_eq!(writer.flush_ready(&mut table, &WriteContext::default()).unwrap(), 1);
        writer.write_xref_and_trailer(&table, &trailer()).unwrap();
        let bytes = writer.into_inner().unwrap();
        for obj in table.iter() {
            let offset = obj.offset().unwrap() as usize;
            let token = format!("{} 0 obj", obj.id());
            assert_eq!(&bytes[offset..offset + token.len()], token.as_bytes());
        }
    }

    #[test]
    fn test_unwritten_object_is_invariant_error() {
        let mut table = ObjectTable::new();
        table.create(Object::Null);
        let mut writer = PdfWriter::new(Vec::new());
        let err = writer.write_xref_and_trailer(&table, &trailer()).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }
}
