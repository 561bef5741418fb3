//! Integration tests for embedded files.

mod common;

use common::{document, options, ParsedPdf};
use pdf_quill::{AFRelationship, AttachmentOptions, Error};

fn named(name: &str) -> AttachmentOptions {
    AttachmentOptions::new().with_name(name)
}

#[test]
fn test_identical_content_shares_a_stream() {
    let mut doc = document(options());
    let first = doc.file(b"same bytes".to_vec(), named("report.csv")).unwrap();
    let second = doc.file(b"same bytes".to_vec(), named("report.csv")).unwrap();
    assert_ne!(first, second, "every call gets its own file specification");

    let pdf = ParsedPdf::parse(doc.finish().unwrap());
    let a = pdf.reference(first.id as usize, "F").unwrap();
    let b = pdf.reference(second.id as usize, "F").unwrap();
    assert_eq!(a, b);
    assert_eq!(pdf.objects_containing("/Type /EmbeddedFile\n").len(), 1);
}

#[test]
fn test_new_name_gets_new_stream() {
    let mut doc = document(options());
    let first = doc.file(b"same bytes".to_vec(), named("a.csv")).unwrap();
    let second = doc.file(b"same bytes".to_vec(), named("b.csv")).unwrap();

    let pdf = ParsedPdf::parse(doc.finish().unwrap());
    let a = pdf.reference(first.id as usize, "F").unwrap();
    let b = pdf.reference(second.id as usize, "F").unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_changed_content_gets_new_stream() {
    let mut doc = document(options());
    let first = doc.file(b"version one".to_vec(), named("notes.txt")).unwrap();
    let second = doc.file(b"version two".to_vec(), named("notes.txt")).unwrap();

    let pdf = ParsedPdf::parse(doc.finish().unwrap());
    assert_ne!(
        pdf.reference(first.id as usize, "F"),
        pdf.reference(second.id as usize, "F")
    );
}

#[test]
fn test_data_uri_attachment() {
    let mut doc = document(options());
    let spec = doc
        .file(
            "data:text/plain;base64,aGVsbG8=",
            named("hello.txt").with_description("greeting"),
        )
        .unwrap();

    let pdf = ParsedPdf::parse(doc.finish().unwrap());
    let filespec = pdf.object_text(spec.id as usize);
    assert!(filespec.contains("/Type /Filespec"));
    assert!(filespec.contains("/AFRelationship /Unspecified"));
    assert!(filespec.contains("/F (hello.txt)"));
    assert!(filespec.contains("/UF (hello.txt)"));
    assert!(filespec.contains("/Desc (greeting)"));

    let stream = pdf.reference(spec.id as usize, "F").unwrap();
    assert_eq!(pdf.stream(stream), b"hello");
    let text = pdf.object_text(stream);
    assert!(text.contains("/Subtype /text#2Fplain"));
    assert!(text.contains("/CheckSum <5D41402ABC4B2A76B9719D911017C592>"));
    assert!(text.contains("/Size 5"));
}

#[test]
fn test_name_tree_and_af() {
    let mut doc = document(options());
    let b = doc.file(b"b".to_vec(), named("b.txt")).unwrap();
    let a = doc
        .file(b"a".to_vec(), named("a.txt").with_relationship(AFRelationship::Data))
        .unwrap();
    let hidden = doc.file(b"h".to_vec(), named("h.txt").hidden(true)).unwrap();

    let pdf = ParsedPdf::parse(doc.finish().unwrap());
    let names = pdf.object_text(2);
    assert!(names.contains(&format!(
        "/EmbeddedFiles <<\n/Names [\n(a.txt) {} 0 R\n(b.txt) {} 0 R\n]\n>>",
        a.id, b.id
    )));
    assert!(!names.contains("h.txt"));

    let catalog = pdf.object_text(3);
    assert!(catalog.contains(&format!("/AF [{} 0 R {} 0 R {} 0 R]", b.id, a.id, hidden.id)));
    assert!(pdf.object_text(a.id as usize).contains("/AFRelationship /Data"));
}

#[test]
fn test_no_attachments_leaves_names_empty() {
    let pdf = ParsedPdf::parse(document(options()).finish().unwrap());
    assert_eq!(pdf.object_text(2), "2 0 obj\n<<\n>>\nendobj");
    assert!(!pdf.object_text(3).contains("/AF"));
}

#[test]
fn test_invalid_sources() {
    let mut doc = document(options());
    let unnamed = doc.file(b"data".to_vec(), AttachmentOptions::new());
    assert!(matches!(unnamed, Err(Error::InvalidAttachment(_))));

    let malformed = doc.file("not a data uri", named("x"));
    assert!(matches!(malformed, Err(Error::InvalidAttachment(_))));

    let bad_base64 = doc.file("data:text/plain;base64,@@@", named("x"));
    assert!(matches!(bad_base64, Err(Error::InvalidAttachment(_))));

    let empty = doc.file(Vec::<u8>::new(), named("empty"));
    assert!(matches!(empty, Err(Error::InvalidAttachment(_))));
}
