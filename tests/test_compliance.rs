//! Integration tests for PDF/A and PDF/UA output.

mod common;

use common::{document, options, ParsedPdf};
use pdf_quill::{DocumentOptions, Error, PdfALevel, PdfDocument, PdfVersion, Subset};

fn pdfa(level: PdfALevel) -> DocumentOptions {
    options()
        .with_pdf_version(PdfVersion::V1_4)
        .with_subset(Subset::PdfA(level))
}

fn pdfua() -> DocumentOptions {
    options()
        .with_pdf_version(PdfVersion::V1_7)
        .with_subset(Subset::PdfUA)
        .with_tagged(true)
        .with_lang("en-US")
}

fn metadata(pdf: &ParsedPdf) -> usize {
    pdf.reference(3, "Metadata").expect("catalog /Metadata")
}

#[test]
fn test_pdfa_metadata_length_is_exact() {
    let mut doc = document(pdfa(PdfALevel::A1b).with_compress(true));
    doc.text("Mock", 12.0, 72.0, 720.0, "Archived").unwrap();
    let pdf = ParsedPdf::parse(doc.finish().unwrap());

    let id = metadata(&pdf);
    let header = pdf.object_text(id);
    assert!(header.contains("/Type /Metadata"));
    assert!(header.contains("/Subtype /XML"));
    assert!(!header.contains("/Filter"), "metadata is never compressed");
    assert_eq!(pdf.integer(id, "Length"), Some(pdf.stream(id).len() as i64));

    let xmp = String::from_utf8(pdf.stream(id).to_vec()).unwrap();
    assert!(xmp.contains("<pdfaid:part>1</pdfaid:part>"));
    assert!(xmp.contains("<pdfaid:conformance>B</pdfaid:conformance>"));
    assert!(xmp.contains("<rdf:li xml:lang=\"x-default\">Integration</rdf:li>"));
    assert!(xmp.contains("<xmp:CreateDate>2024-03-01T12:00:00Z</xmp:CreateDate>"));
}

#[test]
fn test_pdfa_output_intent() {
    let pdf = ParsedPdf::parse(document(pdfa(PdfALevel::A1b)).finish().unwrap());
    let catalog = pdf.object_text(3);
    let intents = regex::Regex::new(r"/OutputIntents \[(\d+) 0 R\]").unwrap();
    let intent: usize = intents.captures(&catalog).unwrap()[1].parse().unwrap();

    let text = pdf.object_text(intent);
    assert!(text.contains("/S /GTS_PDFA1"));
    assert!(text.contains("/OutputConditionIdentifier (sRGB IEC61966-2.1)"));
    let profile = pdf.reference(intent, "DestOutputProfile").unwrap();
    assert_eq!(profile + 1, intent);
    assert_eq!(pdf.integer(profile, "N"), Some(3));
    assert_eq!(&pdf.stream(profile)[36..40], b"acsp");
}

#[test]
fn test_pdfa_custom_profile() {
    let mut profile = vec![0u8; 128];
    profile[36..40].copy_from_slice(b"acsp");
    profile[0..4].copy_from_slice(b"MINE");
    let mut options = pdfa(PdfALevel::A2b).with_pdf_version(PdfVersion::V1_7);
    options.color_profile = Some(profile.clone());

    let pdf = ParsedPdf::parse(document(options).finish().unwrap());
    let found = pdf.objects_containing("/N 3");
    assert_eq!(found.len(), 1);
    assert_eq!(pdf.stream(found[0]), &profile[..]);
}

#[test]
fn test_pdfa_1a_implies_tagging() {
    let doc = document(pdfa(PdfALevel::A1a));
    assert!(doc.options().tagged);
    let pdf = ParsedPdf::parse(doc.finish().unwrap());
    let catalog = pdf.object_text(3);
    assert!(catalog.contains("/StructTreeRoot 4 0 R"));
    assert!(catalog.contains("/Marked true"));
}

#[test]
fn test_pdfa_1_requires_version_1_4() {
    let options = options().with_subset(Subset::PdfA(PdfALevel::A1b));
    let err = PdfDocument::new(options).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_pdfua_catalog_entries() {
    let mut doc = document(pdfua());
    doc.text("Mock", 12.0, 72.0, 720.0, "Accessible").unwrap();
    let pdf = ParsedPdf::parse(doc.finish().unwrap());

    let catalog = pdf.object_text(3);
    assert!(catalog.contains("/DisplayDocTitle true"));
    assert!(catalog.contains("/Marked true"));
    assert!(catalog.contains("/StructTreeRoot 4 0 R"));
    assert!(catalog.contains("/Lang (en-US)"));
    assert!(!catalog.contains("/OutputIntents"));

    let id = metadata(&pdf);
    assert_eq!(pdf.integer(id, "Length"), Some(pdf.stream(id).len() as i64));
    let xmp = String::from_utf8(pdf.stream(id).to_vec()).unwrap();
    assert!(xmp.contains("<pdfuaid:part>1</pdfuaid:part>"));
}

#[test]
fn test_pdfua_requires_tagging() {
    let options = pdfua().with_tagged(false);
    let err = PdfDocument::new(options).err().unwrap();
    match err {
        Error::Config(message) => assert!(message.contains("tagged")),
        other => panic!("expected Config error, got {}", other),
    }
}

#[test]
fn test_subset_from_options_json() {
    let json = r#"{
        "font": "Mock",
        "fontData": [0, 1, 0, 0],
        "pdfVersion": "1.7",
        "subset": "PDF/A-3b",
        "bufferPages": "all"
    }"#;
    let options = DocumentOptions::from_json(json).unwrap();
    assert_eq!(options.subset, Some(Subset::PdfA(PdfALevel::A3b)));
    assert_eq!(options.pdf_version, PdfVersion::V1_7);
}
