mod common;

use std::io::Cursor;

use common::*;
use docx_rewrite::docx::Package;
use docx_rewrite::{Document, Error, replace_all, replace_in_file};

#[test]
fn saved_document_reopens_with_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.docx");

    let mut doc = open_body(&paragraph(&[run("draft "), bold_run("v1")]));
    assert_eq!(replace_all(&mut doc, "v1", "v2"), 1);
    doc.save(&path).unwrap();

    let reopened = Document::open(&path).unwrap();
    assert_eq!(paragraph_texts(&reopened), vec!["draft v2"]);
    assert!(!dir.path().join("out.docx.tmp").exists());
}

#[test]
fn untouched_parts_survive_a_round_trip() {
    let image = png(2, 2);
    let bytes = DocxBuilder::new(&paragraph(&[run("text")]))
        .relationship("rIdImg", "image", "media/image1.png")
        .part("word/media/image1.png", image.clone())
        .part("customXml/item1.xml", "<root/>")
        .build();

    let mut doc = Document::from_bytes(&bytes).unwrap();
    let saved = doc.to_bytes().unwrap();
    let package = Package::from_bytes(&saved).unwrap();

    assert_eq!(package.part("word/media/image1.png"), Some(image.as_slice()));
    assert_eq!(package.part("customXml/item1.xml"), Some(&b"<root/>"[..]));
    assert_eq!(
        package.part_text("word/styles.xml").as_deref(),
        Some(STYLES_XML)
    );

    let original: Vec<String> = Package::from_bytes(&bytes)
        .unwrap()
        .part_names()
        .map(str::to_string)
        .collect();
    let rewritten: Vec<String> = package.part_names().map(str::to_string).collect();
    assert_eq!(original, rewritten);
}

#[test]
fn media_is_stored_and_xml_is_deflated() {
    let bytes = DocxBuilder::new(&paragraph(&[run("text")]))
        .part("word/media/image1.png", png(1, 1))
        .build();
    let mut doc = Document::from_bytes(&bytes).unwrap();
    let saved = doc.to_bytes().unwrap();

    let mut zip = zip::ZipArchive::new(Cursor::new(saved)).unwrap();
    assert_eq!(
        zip.by_name("word/media/image1.png").unwrap().compression(),
        zip::CompressionMethod::Stored
    );
    assert_eq!(
        zip.by_name("word/document.xml").unwrap().compression(),
        zip::CompressionMethod::Deflated
    );
}

#[test]
fn written_xml_keeps_namespaces_and_declaration() {
    let mut doc = open_body(&paragraph(&[run("a < b & c")]));
    replace_all(&mut doc, "a", "α");
    let saved = doc.to_bytes().unwrap();
    let package = Package::from_bytes(&saved).unwrap();
    let xml = package.part_text("word/document.xml").unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
    let parsed = roxmltree::Document::parse(&xml).unwrap();
    let root = parsed.root_element();
    assert_eq!(root.tag_name().namespace(), Some(W_NS));
    assert_eq!(root.lookup_prefix(W_NS), Some("w"));
    let text: String = parsed
        .descendants()
        .filter(|n| n.tag_name().name() == "t")
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(text, "α < b & c");
}

#[test]
fn not_a_zip_is_invalid_docx() {
    assert!(matches!(
        Document::from_bytes(b"plain text, not a package"),
        Err(Error::InvalidDocx(_))
    ));
}

#[test]
fn package_without_document_part_is_invalid_docx() {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("hello.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    std::io::Write::write_all(&mut zip, b"hi").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    assert!(matches!(
        Document::from_bytes(&bytes),
        Err(Error::InvalidDocx(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Document::open(&dir.path().join("missing.docx")).err().unwrap();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().contains("missing.docx"));
}

#[test]
fn replace_in_file_writes_output() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    std::fs::write(
        &input,
        DocxBuilder::new(&paragraph(&[run("Dear NAME,")])).build(),
    )
    .unwrap();

    let count = replace_in_file(&input, &output, "NAME", "Ada").unwrap();
    assert_eq!(count, 1);
    assert_eq!(
        paragraph_texts(&Document::open(&output).unwrap()),
        vec!["Dear Ada,"]
    );
    assert_eq!(
        paragraph_texts(&Document::open(&input).unwrap()),
        vec!["Dear NAME,"]
    );
}
