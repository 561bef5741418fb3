//! Embedded file support for PDF documents.
//!
//! Attachments are stored as embedded file streams wrapped in file
//! specification dictionaries. Every file specification is listed in the
//! catalog `/AF` array; visible ones are also added to the `/EmbeddedFiles`
//! name tree.
//!
//! Identical payloads registered under the same name share one stream. The
//! registry only remembers the latest registration per name, so content
//! matching an older registration is stored again.
//!
//! ## Example
//!
//! ```ignore
//! use pdf_quill::writer::embedded_files::{AttachmentOptions, AttachmentSource};
//!
//! doc.file(
//!     AttachmentSource::from("data:text/csv;base64,YSxiLGM="),
//!     AttachmentOptions::new().with_description("Monthly sales data"),
//! )?;
//! ```

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use md5::{Digest, Md5};
use regex::Regex;

lazy_static! {
    static ref RE_DATA_URI: Regex = Regex::new(r"(?s)^data:(.*?);base64,(.*)$").unwrap();
}

/// Associated File Relationship per PDF 2.0 spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AFRelationship {
    /// The file is the original source
    Source,
    /// The file contains data referenced by the document
    Data,
    /// An alternative representation
    Alternative,
    /// Supplementary data
    Supplement,
    /// Encrypted payload (for protected content)
    EncryptedPayload,
    /// A form data file
    FormData,
    /// A schema definition
    Schema,
    /// Unspecified relationship
    #[default]
    Unspecified,
}

impl AFRelationship {
    /// Get the PDF name for this relationship.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            AFRelationship::Source => "Source",
            AFRelationship::Data => "Data",
            AFRelationship::Alternative => "Alternative",
            AFRelationship::Supplement => "Supplement",
            AFRelationship::EncryptedPayload => "EncryptedPayload",
            AFRelationship::FormData => "FormData",
            AFRelationship::Schema => "Schema",
            AFRelationship::Unspecified => "Unspecified",
        }
    }
}

/// Where attachment bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Raw bytes; a name must be supplied through the options
    Bytes(Vec<u8>),
    /// A `data:<mime>;base64,<payload>` URI
    DataUri(String),
}

impl From<Vec<u8>> for AttachmentSource {
    fn from(data: Vec<u8>) -> Self {
        AttachmentSource::Bytes(data)
    }
}

impl From<&[u8]> for AttachmentSource {
    fn from(data: &[u8]) -> Self {
        AttachmentSource::Bytes(data.to_vec())
    }
}

impl From<&str> for AttachmentSource {
    fn from(uri: &str) -> Self {
        AttachmentSource::DataUri(uri.to_string())
    }
}

impl From<String> for AttachmentSource {
    fn from(uri: String) -> Self {
        AttachmentSource::DataUri(uri)
    }
}

/// Options for [`embed_file`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentOptions {
    /// Name in the name tree and file specification
    pub name: Option<String>,
    /// Subtype; overrides the data URI's mime type
    pub mime_type: Option<String>,
    /// `/Desc`
    pub description: Option<String>,
    /// Keep the file out of the `/EmbeddedFiles` name tree
    pub hidden: bool,
    /// `/Params /CreationDate`
    pub creation_date: Option<DateTime<Utc>>,
    /// `/Params /ModDate`
    pub modified_date: Option<DateTime<Utc>>,
    /// `/AFRelationship`
    pub relationship: AFRelationship,
}

impl AttachmentOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Hide the file from the attachments panel.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set the creation date.
    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// Set the modification date.
    pub fn with_modified_date(mut self, date: DateTime<Utc>) -> Self {
        self.modified_date = Some(date);
        self
    }

    /// Set the AF relationship.
    pub fn with_relationship(mut self, relationship: AFRelationship) -> Self {
        self.relationship = relationship;
        self
    }
}

/// Content identity of an embedded file stream.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    /// MIME subtype
    pub subtype: Option<String>,
    /// MD5 of the payload
    pub checksum: [u8; 16],
    /// Payload length in bytes
    pub size: usize,
    /// Creation timestamp
    pub creation_date: Option<DateTime<Utc>>,
    /// Modification timestamp
    pub modified_date: Option<DateTime<Utc>>,
}

impl Fingerprint {
    /// Whether every field equals the other fingerprint's.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        self.subtype == other.subtype
            && self.checksum == other.checksum
            && self.size == other.size
            && self.creation_date == other.creation_date
            && self.modified_date == other.modified_date
    }
}

/// An attachment normalized to bytes.
#[derive(Debug, Clone)]
pub struct EmbeddedFile {
    /// The file name (used as the key in the EmbeddedFiles name tree)
    pub name: String,
    /// The file data
    pub data: Vec<u8>,
    /// MIME type of the file (e.g., "application/pdf", "text/plain")
    pub mime_type: Option<String>,
    /// Options the file was registered with
    pub options: AttachmentOptions,
}

impl EmbeddedFile {
    /// Normalize a source into bytes.
    pub fn from_source(source: AttachmentSource, options: AttachmentOptions) -> Result<Self> {
        let (name, data, uri_mime) = match source {
            AttachmentSource::Bytes(data) => {
                let name = options.name.clone().ok_or_else(|| {
                    Error::InvalidAttachment("a name is required for raw byte attachments".into())
                })?;
                (name, data, None)
            },
            AttachmentSource::DataUri(uri) => {
                let caps = RE_DATA_URI.captures(&uri).ok_or_else(|| {
                    Error::InvalidAttachment("expected a base64 data URI".to_string())
                })?;
                let mime = caps.get(1).map(|m| m.as_str()).filter(|m| !m.is_empty());
                let payload = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                let data = base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| Error::InvalidAttachment(format!("bad base64 payload: {}", e)))?;
                let mime = mime.map(str::to_string);
                let name = options.name.clone().unwrap_or_else(|| uri.clone());
                (name, data, mime)
            },
        };
        if data.is_empty() {
            return Err(Error::InvalidAttachment(format!("'{}' has no content", name)));
        }
        let mime_type = options.mime_type.clone().or(uri_mime);
        Ok(Self {
            name,
            data,
            mime_type,
            options,
        })
    }

    /// Get the size of the embedded file data.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Content identity used for deduplication.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            subtype: self.mime_type.clone(),
            checksum: md5_hash(&self.data),
            size: self.data.len(),
            creation_date: self.options.creation_date,
            modified_date: self.options.modified_date,
        }
    }

    /// Build the embedded file stream dictionary.
    pub fn build_stream_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("EmbeddedFile"));
        if let Some(mime) = &self.mime_type {
            dict.insert("Subtype".to_string(), Object::name(mime.as_str()));
        }

        let mut params = Dictionary::new();
        if let Some(date) = self.options.creation_date {
            params.insert("CreationDate".to_string(), Object::Date(date));
        }
        if let Some(date) = self.options.modified_date {
            params.insert("ModDate".to_string(), Object::Date(date));
        }
        params.insert(
            "CheckSum".to_string(),
            Object::ByteString(md5_hash(&self.data).to_vec()),
        );
        params.insert("Size".to_string(), Object::Integer(self.data.len() as i64));
        dict.insert("Params".to_string(), Object::Dictionary(params));
        dict
    }

    /// Build the file specification dictionary.
    pub fn build_filespec(&self, embedded_stream_ref: ObjectRef) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("Filespec"));
        dict.insert(
            "AFRelationship".to_string(),
            Object::name(self.options.relationship.pdf_name()),
        );
        dict.insert("F".to_string(), Object::text(self.name.as_str()));
        dict.insert(
            "EF".to_string(),
            Object::dict(vec![("F", Object::Reference(embedded_stream_ref))]),
        );
        dict.insert("UF".to_string(), Object::text(self.name.as_str()));
        if let Some(desc) = &self.options.description {
            dict.insert("Desc".to_string(), Object::text(desc.as_str()));
        }
        dict
    }
}

/// Latest embedded file stream registered under each name.
#[derive(Debug, Default)]
pub struct AttachmentRegistry {
    slots: IndexMap<String, (Fingerprint, ObjectRef)>,
}

impl AttachmentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream registered under `name` with a matching fingerprint.
    pub fn lookup(&self, name: &str, fingerprint: &Fingerprint) -> Option<ObjectRef> {
        self.slots
            .get(name)
            .filter(|(existing, _)| existing.matches(fingerprint))
            .map(|(_, stream)| *stream)
    }

    /// Make `stream` the registration for `name`, replacing any previous one.
    pub fn record(&mut self, name: &str, fingerprint: Fingerprint, stream: ObjectRef) {
        self.slots.insert(name.to_string(), (fingerprint, stream));
    }

    /// Number of names registered.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Document capabilities needed to embed attachments.
pub trait AttachmentSink {
    /// Allocate a completed stream object.
    fn add_stream(&mut self, dict: Dictionary, data: &[u8]) -> Result<ObjectRef>;

    /// Allocate a completed dictionary object.
    fn add_object(&mut self, dict: Dictionary) -> Result<ObjectRef>;

    /// The document's dedup registry.
    fn attachment_registry(&mut self) -> &mut AttachmentRegistry;

    /// List a file specification in `/AF` and, unless hidden, the name tree.
    fn register_attachment(&mut self, name: &str, filespec: ObjectRef, hidden: bool) -> Result<()>;
}

/// Embed an attachment and return its file specification.
pub fn embed_file<S: AttachmentSink + ?Sized>(
    sink: &mut S,
    source: AttachmentSource,
    options: AttachmentOptions,
) -> Result<ObjectRef> {
    let file = EmbeddedFile::from_source(source, options)?;
    let fingerprint = file.fingerprint();

    let stream = match sink.attachment_registry().lookup(&file.name, &fingerprint) {
        Some(existing) => {
            log::debug!("Reusing embedded file stream {} for '{}'", existing, file.name);
            existing
        },
        None => {
            let stream = sink.add_stream(file.build_stream_dict(), &file.data)?;
            sink.attachment_registry()
                .record(&file.name, fingerprint, stream);
            log::debug!("Embedded '{}' ({} bytes) as {}", file.name, file.size(), stream);
            stream
        },
    };

    let filespec = sink.add_object(file.build_filespec(stream))?;
    sink.register_attachment(&file.name, filespec, file.options.hidden)?;
    Ok(filespec)
}

/// MD5 hash function for checksum calculation.
fn md5_hash(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    let mut out = [0u8; 16];
    out.copy_from_slice(&hasher.finalize());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::object_table::ObjectTable;
    use chrono::TimeZone;

    #[derive(Default)]
    struct MemorySink {
        table: ObjectTable,
        registry: AttachmentRegistry,
        af: Vec<ObjectRef>,
        names: Vec<String>,
    }

    impl AttachmentSink for MemorySink {
        fn add_stream(&mut self, dict: Dictionary, data: &[u8]) -> Result<ObjectRef> {
            let r = self.table.create_stream(Object::Dictionary(dict), data);
            self.table.end(r)?;
            Ok(r)
        }

        fn add_object(&mut self, dict: Dictionary) -> Result<ObjectRef> {
            let r = self.table.create(Object::Dictionary(dict));
            self.table.end(r)?;
            Ok(r)
        }

        fn attachment_registry(&mut self) -> &mut AttachmentRegistry {
            &mut self.registry
        }

        fn register_attachment(&mut self, name: &str, filespec: ObjectRef, hidden: bool) -> Result<()> {
            self.af.push(filespec);
            if !hidden {
                self.names.push(name.to_string());
            }
            Ok(())
        }
    }

    fn streams(sink: &MemorySink) -> usize {
        sink.table.iter().filter(|o| o.stream().is_some()).count()
    }

    #[test]
    fn test_data_uri_source() {
        let file = EmbeddedFile::from_source(
            AttachmentSource::from("data:text/plain;base64,SGVsbG8="),
            AttachmentOptions::new(),
        )
        .unwrap();
        assert_eq!(file.data, b"Hello");
        assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(file.name, "data:text/plain;base64,SGVsbG8=");
    }

    #[test]
    fn test_mime_override() {
        let file = EmbeddedFile::from_source(
            AttachmentSource::from("data:text/plain;base64,SGVsbG8="),
            AttachmentOptions::new().with_mime_type("text/csv").with_name("a.csv"),
        )
        .unwrap();
        assert_eq!(file.mime_type.as_deref(), Some("text/csv"));
        assert_eq!(file.name, "a.csv");
    }

    #[test]
    fn test_invalid_sources() {
        let unnamed = EmbeddedFile::from_source(b"abc".to_vec().into(), AttachmentOptions::new());
        assert!(matches!(unnamed, Err(Error::InvalidAttachment(_))));

        let empty = EmbeddedFile::from_source(
            Vec::<u8>::new().into(),
            AttachmentOptions::new().with_name("empty.bin"),
        );
        assert!(matches!(empty, Err(Error::InvalidAttachment(_))));

        let malformed =
            EmbeddedFile::from_source("not a uri".into(), AttachmentOptions::new());
        assert!(matches!(malformed, Err(Error::InvalidAttachment(_))));
    }

    #[test]
    fn test_build_stream_dict() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let file = EmbeddedFile::from_source(
            b"Hello".to_vec().into(),
            AttachmentOptions::new()
                .with_name("test.txt")
                .with_mime_type("text/plain")
                .with_creation_date(date),
        )
        .unwrap();

        let dict = file.build_stream_dict();
        assert_eq!(dict.get("Subtype").and_then(Object::as_name), Some("text/plain"));
        let params = dict.get("Params").and_then(Object::as_dict).unwrap();
        assert_eq!(params.get("Size").and_then(Object::as_integer), Some(5));
        assert_eq!(params.get("CreationDate"), Some(&Object::Date(date)));
        match params.get("CheckSum") {
            Some(Object::ByteString(sum)) => assert_eq!(sum.len(), 16),
            other => panic!("unexpected checksum {:?}", other),
        }
    }

    #[test]
    fn test_filespec_defaults() {
        let file = EmbeddedFile::from_source(
            b"x".to_vec().into(),
            AttachmentOptions::new().with_name("x.bin").with_description("one byte"),
        )
        .unwrap();
        let spec = file.build_filespec(ObjectRef::new(9, 0));
        assert_eq!(
            spec.get("AFRelationship").and_then(Object::as_name),
            Some("Unspecified")
        );
        assert_eq!(spec.get("Desc"), Some(&Object::text("one byte")));
        let ef = spec.get("EF").and_then(Object::as_dict).unwrap();
        assert_eq!(ef.get("F").and_then(Object::as_reference), Some(ObjectRef::new(9, 0)));
    }

    #[test]
    fn test_identical_content_shares_stream() {
        let mut sink = MemorySink::default();
        let opts = AttachmentOptions::new().with_name("a.txt");
        embed_file(&mut sink, b"same".to_vec().into(), opts.clone()).unwrap();
        embed_file(&mut sink, b"same".to_vec().into(), opts).unwrap();
        assert_eq!(streams(&sink), 1);
        assert_eq!(sink.af.len(), 2);
    }

    #[test]
    fn test_other_name_creates_new_stream() {
        let mut sink = MemorySink::default();
        embed_file(&mut sink, b"same".to_vec().into(), AttachmentOptions::new().with_name("a")).unwrap();
        embed_file(&mut sink, b"same".to_vec().into(), AttachmentOptions::new().with_name("b")).unwrap();
        assert_eq!(streams(&sink), 2);
    }

    #[test]
    fn test_registry_remembers_latest_only() {
        let mut sink = MemorySink::default();
        let opts = AttachmentOptions::new().with_name("a");
        embed_file(&mut sink, b"one".to_vec().into(), opts.clone()).unwrap();
        embed_file(&mut sink, b"two".to_vec().into(), opts.clone()).unwrap();
        embed_file(&mut sink, b"one".to_vec().into(), opts).unwrap();
        assert_eq!(streams(&sink), 3);
        assert_eq!(sink.registry.len(), 1);
    }

    #[test]
    fn test_different_dates_do_not_match() {
        let mut sink = MemorySink::default();
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let opts = AttachmentOptions::new().with_name("a");
        embed_file(&mut sink, b"one".to_vec().into(), opts.clone()).unwrap();
        embed_file(&mut sink, b"one".to_vec().into(), opts.with_modified_date(date)).unwrap();
        assert_eq!(streams(&sink), 2);
    }

    #[test]
    fn test_hidden_attachment_not_named() {
        let mut sink = MemorySink::default();
        embed_file(
            &mut sink,
            b"x".to_vec().into(),
            AttachmentOptions::new().with_name("secret").hidden(true),
        )
        .unwrap();
        assert!(sink.names.is_empty());
        assert_eq!(sink.af.len(), 1);
    }
}
