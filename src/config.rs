//! Configuration for document assembly.

use crate::compliance::{PdfALevel, Subset};
use crate::encryption::SecurityOptions;
use crate::error::{Error, Result};
use crate::object::Object;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PdfVersion {
    /// PDF 1.3
    V1_3,
    /// PDF 1.4
    V1_4,
    /// PDF 1.5
    V1_5,
    /// PDF 1.6
    V1_6,
    /// PDF 1.7
    V1_7,
}

impl PdfVersion {
    /// Version string as written in the header.
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_3 => "1.3",
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        PdfVersion::V1_3
    }
}

impl FromStr for PdfVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1.3" => Ok(PdfVersion::V1_3),
            "1.4" => Ok(PdfVersion::V1_4),
            "1.5" => Ok(PdfVersion::V1_5),
            "1.6" => Ok(PdfVersion::V1_6),
            "1.7" => Ok(PdfVersion::V1_7),
            other => Err(Error::Config(format!("unsupported pdfVersion '{}'", other))),
        }
    }
}

impl TryFrom<String> for PdfVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PdfVersion> for String {
    fn from(version: PdfVersion) -> Self {
        version.as_str().to_string()
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many pages stay switchable before they are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageRetention {
    /// Commit the previous page as soon as a new one starts
    #[default]
    Current,
    /// Keep the last `n` pages buffered (at least one)
    Window(usize),
    /// Keep every page until `flush_pages` or finish
    All,
}

impl PageRetention {
    /// Maximum number of buffered pages, `None` meaning unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            PageRetention::Current => Some(1),
            PageRetention::Window(n) => Some((*n).max(1)),
            PageRetention::All => None,
        }
    }
}

/// The document information dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DocumentInfo {
    /// Producing application
    pub producer: String,
    /// Creating application
    pub creator: String,
    /// Creation timestamp
    pub creation_date: DateTime<Utc>,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Modification timestamp
    pub mod_date: Option<DateTime<Utc>>,
    /// Additional text entries, written after the standard ones
    pub custom: IndexMap<String, String>,
}

impl DocumentInfo {
    /// Info with the default producer/creator and the given creation date.
    pub fn new(creation_date: DateTime<Utc>) -> Self {
        Self {
            producer: "pdf_quill".to_string(),
            creator: "pdf_quill".to_string(),
            creation_date,
            title: None,
            author: None,
            subject: None,
            keywords: None,
            mod_date: None,
            custom: IndexMap::new(),
        }
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the document subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the document keywords.
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Entries in dictionary order: Producer, Creator, CreationDate, then the
    /// optional standard keys and finally custom keys.
    pub fn entries(&self) -> Vec<(String, Object)> {
        let mut entries = vec![
            ("Producer".to_string(), Object::text(self.producer.clone())),
            ("Creator".to_string(), Object::text(self.creator.clone())),
            ("CreationDate".to_string(), Object::Date(self.creation_date)),
        ];
        let optional = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                entries.push((key.to_string(), Object::text(value.clone())));
            }
        }
        if let Some(date) = self.mod_date {
            entries.push(("ModDate".to_string(), Object::Date(date)));
        }
        for (key, value) in &self.custom {
            entries.push((key.clone(), Object::text(value.clone())));
        }
        entries
    }
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Document construction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentOptions {
    /// Flate-compress streams that declare no filter of their own
    pub compress: bool,
    /// Output format version
    pub pdf_version: PdfVersion,
    /// Conformance subset
    pub subset: Option<Subset>,
    /// Emit a structure tree and mark the document as tagged
    pub tagged: bool,
    /// Natural language of the document (catalog `/Lang`)
    pub lang: Option<String>,
    /// Ask viewers to show the title instead of the file name
    pub display_title: bool,
    /// Page retention window before pages are committed
    pub buffer_pages: PageRetention,
    /// Reuse shaping results for identical text
    pub font_layout_cache: bool,
    /// Add a page during construction
    pub auto_first_page: bool,
    /// Page size in points `[width, height]`
    pub size: [f64; 2],
    /// Family name of the default font
    pub font: Option<String>,
    /// Font program bytes of the default font
    pub font_data: Option<Vec<u8>>,
    /// ICC profile for the archival output intent; a built-in sRGB profile is used when absent
    pub color_profile: Option<Vec<u8>>,
    /// Info dictionary
    pub info: DocumentInfo,
    /// Protection passwords
    #[serde(flatten)]
    pub security: SecurityOptions,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            compress: true,
            pdf_version: PdfVersion::default(),
            subset: None,
            tagged: false,
            lang: None,
            display_title: false,
            buffer_pages: PageRetention::default(),
            font_layout_cache: true,
            auto_first_page: true,
            size: [612.0, 792.0],
            font: None,
            font_data: None,
            color_profile: None,
            info: DocumentInfo::default(),
            security: SecurityOptions::default(),
        }
    }
}

impl DocumentOptions {
    /// Options with the mandatory default font pair.
    pub fn new(font: impl Into<String>, font_data: Vec<u8>) -> Self {
        Self {
            font: Some(font.into()),
            font_data: Some(font_data),
            ..Self::default()
        }
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid options: {}", e)))
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the output version.
    pub fn with_pdf_version(mut self, version: PdfVersion) -> Self {
        self.pdf_version = version;
        self
    }

    /// Request a conformance subset.
    pub fn with_subset(mut self, subset: Subset) -> Self {
        self.subset = Some(subset);
        self
    }

    /// Enable or disable tagging.
    pub fn with_tagged(mut self, tagged: bool) -> Self {
        self.tagged = tagged;
        self
    }

    /// Set the document language.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Set the page retention window.
    pub fn with_buffer_pages(mut self, retention: PageRetention) -> Self {
        self.buffer_pages = retention;
        self
    }

    /// Enable or disable the shaping cache.
    pub fn with_font_layout_cache(mut self, enabled: bool) -> Self {
        self.font_layout_cache = enabled;
        self
    }

    /// Enable or disable the automatic first page.
    pub fn with_auto_first_page(mut self, enabled: bool) -> Self {
        self.auto_first_page = enabled;
        self
    }

    /// Set the info dictionary.
    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    /// Set the protection passwords.
    pub fn with_security(mut self, security: SecurityOptions) -> Self {
        self.security = security;
        self
    }

    /// Check the options and apply implied settings.
    ///
    /// PDF/A levels with logical structure switch tagging on; PDF/UA requires
    /// tagging to be enabled explicitly and always displays the title.
    pub fn validate(&mut self) -> Result<()> {
        let has_font = self.font.as_deref().is_some_and(|f| !f.is_empty());
        let has_data = self.font_data.as_deref().is_some_and(|d| !d.is_empty());
        if !has_font || !has_data {
            return Err(Error::Config(
                "default font data is required, missing options.font, options.fontData"
                    .to_string(),
            ));
        }

        if let Some(subset) = self.subset {
            if self.pdf_version < subset.minimum_version() {
                return Err(Error::Config(format!(
                    "{} requires pdfVersion {} or later, got {}",
                    subset,
                    subset.minimum_version(),
                    self.pdf_version
                )));
            }
            match subset {
                Subset::PdfUA => {
                    if !self.tagged {
                        return Err(Error::Config("PDF/UA requires tagged: true".to_string()));
                    }
                    self.display_title = true;
                },
                Subset::PdfA(level) => {
                    if level.requires_structure() && !self.tagged {
                        log::debug!("{} implies a tagged document", level);
                        self.tagged = true;
                    }
                },
            }
        }
        Ok(())
    }

    /// The PDF/A level, if an archival subset is requested.
    pub fn pdfa_level(&self) -> Option<PdfALevel> {
        self.subset.and_then(|s| s.pdfa_level())
    }
}
