//! XMP metadata writing for PDF documents.
//!
//! Generates XMP (Extensible Metadata Platform) packets for the catalog
//! `/Metadata` stream, including the conformance identification schemas
//! (`pdfaid`, `pdfuaid`) that archival and accessibility readers look for.

use crate::compliance::Subset;
use crate::config::DocumentInfo;
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;

/// XMP namespace URIs
const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";
const NS_PDF: &str = "http://ns.adobe.com/pdf/1.3/";
const NS_PDFAID: &str = "http://www.aiim.org/pdfa/ns/id/";
const NS_PDFUAID: &str = "http://www.aiim.org/pdfua/ns/id/";

/// XMP metadata writer/builder.
#[derive(Debug, Clone, Default)]
pub struct XmpWriter {
    title: Option<String>,
    creators: Vec<String>,
    description: Option<String>,
    creator_tool: Option<String>,
    create_date: Option<DateTime<Utc>>,
    modify_date: Option<DateTime<Utc>>,
    producer: Option<String>,
    keywords: Option<String>,
    subset: Option<Subset>,
}

impl XmpWriter {
    /// Create an empty XMP writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the info dictionary into XMP properties.
    pub fn from_info(info: &DocumentInfo) -> Self {
        let mut writer = Self::new()
            .creator_tool(info.creator.clone())
            .producer(info.producer.clone())
            .create_date(info.creation_date);
        if let Some(title) = &info.title {
            writer = writer.title(title.clone());
        }
        if let Some(author) = &info.author {
            writer = writer.creator(author.clone());
        }
        if let Some(subject) = &info.subject {
            writer = writer.description(subject.clone());
        }
        if let Some(keywords) = &info.keywords {
            writer = writer.keywords(keywords.clone());
        }
        if let Some(date) = info.mod_date {
            writer = writer.modify_date(date);
        }
        writer
    }

    /// Set the document title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a creator/author.
    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creators.push(creator.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set the creator tool.
    pub fn creator_tool(mut self, tool: impl Into<String>) -> Self {
        self.creator_tool = Some(tool.into());
        self
    }

    /// Set the creation date.
    pub fn create_date(mut self, date: DateTime<Utc>) -> Self {
        self.create_date = Some(date);
        self
    }

    /// Set the modification date.
    pub fn modify_date(mut self, date: DateTime<Utc>) -> Self {
        self.modify_date = Some(date);
        self
    }

    /// Set the PDF producer.
    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    /// Set the PDF keywords.
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Identify the conformance subset.
    pub fn conformance(mut self, subset: Option<Subset>) -> Self {
        self.subset = subset;
        self
    }

    /// Build the XMP packet as an XML string.
    pub fn build(&self) -> String {
        self.to_xml()
    }

    /// Build the XMP packet as UTF-8 bytes.
    pub fn build_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }

    fn to_xml(&self) -> String {
        let mut xml = String::new();

        xml.push_str("<?xpacket begin=\"\u{FEFF}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n");
        xml.push_str(&format!("<x:xmpmeta xmlns:x=\"{}\">\n", NS_X));
        xml.push_str(&format!("  <rdf:RDF xmlns:rdf=\"{}\">\n", NS_RDF));

        xml.push_str(&format!(
            "    <rdf:Description rdf:about=\"\" xmlns:dc=\"{}\">\n",
            NS_DC
        ));
        xml.push_str("      <dc:format>application/pdf</dc:format>\n");
        if let Some(title) = &self.title {
            xml.push_str("      <dc:title>\n");
            xml.push_str("        <rdf:Alt>\n");
            xml.push_str(&format!(
                "          <rdf:li xml:lang=\"x-default\">{}</rdf:li>\n",
                escape(title)
            ));
            xml.push_str("        </rdf:Alt>\n");
            xml.push_str("      </dc:title>\n");
        }
        if !self.creators.is_empty() {
            xml.push_str("      <dc:creator>\n");
            xml.push_str("        <rdf:Seq>\n");
            for creator in &self.creators {
                xml.push_str(&format!("          <rdf:li>{}</rdf:li>\n", escape(creator)));
            }
            xml.push_str("        </rdf:Seq>\n");
            xml.push_str("      </dc:creator>\n");
        }
        if let Some(desc) = &self.description {
            xml.push_str("      <dc:description>\n");
            xml.push_str("        <rdf:Alt>\n");
            xml.push_str(&format!(
                "          <rdf:li xml:lang=\"x-default\">{}</rdf:li>\n",
                escape(desc)
            ));
            xml.push_str("        </rdf:Alt>\n");
            xml.push_str("      </dc:description>\n");
        }
        xml.push_str("    </rdf:Description>\n");

        xml.push_str(&format!(
            "    <rdf:Description rdf:about=\"\" xmlns:xmp=\"{}\">\n",
            NS_XMP
        ));
        if let Some(tool) = &self.creator_tool {
            xml.push_str(&format!("      <xmp:CreatorTool>{}</xmp:CreatorTool>\n", escape(tool)));
        }
        if let Some(date) = &self.create_date {
            xml.push_str(&format!("      <xmp:CreateDate>{}</xmp:CreateDate>\n", iso_date(date)));
        }
        if let Some(date) = &self.modify_date {
            xml.push_str(&format!("      <xmp:ModifyDate>{}</xmp:ModifyDate>\n", iso_date(date)));
        }
        xml.push_str("    </rdf:Description>\n");

        xml.push_str(&format!(
            "    <rdf:Description rdf:about=\"\" xmlns:pdf=\"{}\">\n",
            NS_PDF
        ));
        if let Some(producer) = &self.producer {
            xml.push_str(&format!("      <pdf:Producer>{}</pdf:Producer>\n", escape(producer)));
        }
        if let Some(keywords) = &self.keywords {
            xml.push_str(&format!("      <pdf:Keywords>{}</pdf:Keywords>\n", escape(keywords)));
        }
        xml.push_str("    </rdf:Description>\n");

        match self.subset {
            Some(Subset::PdfA(level)) => {
                xml.push_str(&format!(
                    "    <rdf:Description rdf:about=\"\" xmlns:pdfaid=\"{}\">\n",
                    NS_PDFAID
                ));
                xml.push_str(&format!("      <pdfaid:part>{}</pdfaid:part>\n", level.part()));
                xml.push_str(&format!(
                    "      <pdfaid:conformance>{}</pdfaid:conformance>\n",
                    level.conformance()
                ));
                xml.push_str("    </rdf:Description>\n");
            },
            Some(Subset::PdfUA) => {
                xml.push_str(&format!(
                    "    <rdf:Description rdf:about=\"\" xmlns:pdfuaid=\"{}\">\n",
                    NS_PDFUAID
                ));
                xml.push_str("      <pdfuaid:part>1</pdfuaid:part>\n");
                xml.push_str("    </rdf:Description>\n");
            },
            None => {},
        }

        xml.push_str("  </rdf:RDF>\n");
        xml.push_str("</x:xmpmeta>\n");
        xml.push_str("<?xpacket end=\"w\"?>");

        xml
    }
}

/// Format a timestamp the way XMP date properties expect.
fn iso_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::PdfALevel;
    use chrono::TimeZone;

    #[test]
    fn test_xmp_writer_basic() {
        let xml = XmpWriter::new()
            .title("Test Document")
            .creator("Jane Doe")
            .description("A test document")
            .build();

        assert!(xml.starts_with("<?xpacket begin=\"\u{FEFF}\""));
        assert!(xml.contains("<dc:title>"));
        assert!(xml.contains("Test Document"));
        assert!(xml.contains("<dc:creator>"));
        assert!(xml.contains("Jane Doe"));
        assert!(xml.contains("A test document"));
        assert!(xml.ends_with("<?xpacket end=\"w\"?>"));
    }

    #[test]
    fn test_xmp_writer_xml_escape() {
        let xml = XmpWriter::new().title("Test & Document <special>").build();
        assert!(xml.contains("Test &amp; Document &lt;special&gt;"));
    }

    #[test]
    fn test_xmp_dates() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let xml = XmpWriter::new().create_date(date).build();
        assert!(xml.contains("<xmp:CreateDate>2024-01-15T10:30:00Z</xmp:CreateDate>"));
    }

    #[test]
    fn test_pdfa_identification() {
        let xml = XmpWriter::new()
            .conformance(Some(Subset::PdfA(PdfALevel::A1b)))
            .build();
        assert!(xml.contains("<pdfaid:part>1</pdfaid:part>"));
        assert!(xml.contains("<pdfaid:conformance>B</pdfaid:conformance>"));
        assert!(!xml.contains("pdfuaid"));
    }

    #[test]
    fn test_pdfua_identification() {
        let xml = XmpWriter::new().conformance(Some(Subset::PdfUA)).build();
        assert!(xml.contains("<pdfuaid:part>1</pdfuaid:part>"));
        assert!(!xml.contains("pdfaid:"));
    }

    #[test]
    fn test_from_info() {
        let info = DocumentInfo::default().with_title("Report").with_keywords("a, b");
        let xml = XmpWriter::from_info(&info).build();
        assert!(xml.contains("<pdf:Producer>pdf_quill</pdf:Producer>"));
        assert!(xml.contains("<pdf:Keywords>a, b</pdf:Keywords>"));
        assert!(xml.contains("Report"));
    }

    #[test]
    fn test_bytes_include_bom() {
        let bytes = XmpWriter::new().build_bytes();
        let bom = "\u{FEFF}".as_bytes();
        assert_eq!(bom.len(), 3);
        assert!(bytes.windows(3).any(|w| w == bom));
    }
}
