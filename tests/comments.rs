mod common;

use common::*;
use docx_rewrite::docx::comments::{extract_comments, filter_by_author, for_paragraph};

const COMMENTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:comment w:id="0" w:author="Ada Lovelace" w:initials="AL" w:date="2024-03-01T10:00:00Z">
    <w:p><w:r><w:t>Check this</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">figure. </w:t></w:r></w:p>
  </w:comment>
  <w:comment w:id="1" w:author="grace hopper">
    <w:p><w:r><w:t>Table note</w:t></w:r></w:p>
  </w:comment>
  <w:comment w:id="7">
    <w:p><w:r><w:t>Orphan</w:t></w:r></w:p>
  </w:comment>
</w:comments>"#;

fn commented_body() -> String {
    let first = format!(
        "<w:p>{}<w:commentRangeStart w:id=\"0\"/>{}{}<w:commentRangeEnd w:id=\"0\"/><w:r><w:commentReference w:id=\"0\"/></w:r></w:p>",
        run("Intro "),
        run("the "),
        bold_run("figure"),
    );
    let table = "<w:tbl><w:tr><w:tc><w:p><w:commentRangeStart w:id=\"1\"/><w:r><w:t>cell</w:t></w:r><w:commentRangeEnd w:id=\"1\"/><w:r><w:commentReference w:id=\"1\"/></w:r></w:p></w:tc></w:tr></w:tbl>";
    format!("{first}{}{table}", paragraph(&[run("Middle")]))
}

fn commented_doc(target: &str, part: &str) -> docx_rewrite::Document {
    DocxBuilder::new(&commented_body())
        .relationship("rIdC", "comments", target)
        .part(part, COMMENTS_XML)
        .open()
}

#[test]
fn comments_are_read_in_order_with_metadata() {
    let doc = commented_doc("comments.xml", "word/comments.xml");
    let comments = extract_comments(&doc);
    assert_eq!(comments.len(), 3);

    let first = &comments[0];
    assert_eq!(first.id, "comment_1");
    assert_eq!(first.comment_id, "0");
    assert_eq!(first.author, "Ada Lovelace");
    assert_eq!(first.initials, "AL");
    assert_eq!(first.date.as_deref(), Some("2024-03-01T10:00:00Z"));
    assert_eq!(first.text, "Check this\nfigure.");
    assert_eq!(first.paragraph_index, Some(0));
    assert!(!first.in_table);
    assert_eq!(first.reference_text, "the figure");

    let second = &comments[1];
    assert_eq!(second.id, "comment_2");
    assert_eq!(second.paragraph_index, Some(2));
    assert!(second.in_table);
    assert_eq!(second.reference_text, "cell");
    assert_eq!(second.date, None);
}

#[test]
fn missing_author_and_anchor_use_defaults() {
    let doc = commented_doc("comments.xml", "word/comments.xml");
    let orphan = &extract_comments(&doc)[2];
    assert_eq!(orphan.author, "Unknown");
    assert_eq!(orphan.initials, "");
    assert_eq!(orphan.paragraph_index, None);
    assert_eq!(orphan.reference_text, "");
}

#[test]
fn comments_part_is_found_through_relationships() {
    let doc = commented_doc("extra/notes.xml", "word/extra/notes.xml");
    assert_eq!(extract_comments(&doc).len(), 3);
}

#[test]
fn comments_part_falls_back_to_the_default_name() {
    let doc = DocxBuilder::new(&commented_body())
        .part("word/comments.xml", COMMENTS_XML)
        .open();
    assert_eq!(extract_comments(&doc).len(), 3);
}

#[test]
fn document_without_comments_has_none() {
    let doc = open_body(&paragraph(&[run("no comments")]));
    assert!(extract_comments(&doc).is_empty());
}

#[test]
fn filters_by_author_and_paragraph() {
    let doc = commented_doc("comments.xml", "word/comments.xml");

    let by_grace = filter_by_author(extract_comments(&doc), "GRACE HOPPER");
    assert_eq!(by_grace.len(), 1);
    assert_eq!(by_grace[0].text, "Table note");

    assert!(filter_by_author(extract_comments(&doc), "nobody").is_empty());

    let in_first = for_paragraph(extract_comments(&doc), 0);
    assert_eq!(in_first.len(), 1);
    assert_eq!(in_first[0].comment_id, "0");
    assert!(for_paragraph(extract_comments(&doc), 1).is_empty());
}

#[test]
fn comments_serialize_to_json() {
    let doc = commented_doc("comments.xml", "word/comments.xml");
    let value = serde_json::to_value(&extract_comments(&doc)[0]).unwrap();
    assert_eq!(value["author"], "Ada Lovelace");
    assert_eq!(value["paragraph_index"], 0);
    assert_eq!(value["in_table"], false);
}
