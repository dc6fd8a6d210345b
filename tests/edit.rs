mod common;

use common::*;
use docx_rewrite::docx::edit::{
    BlockReplacement, Position, Target, delete_block_under_heading, insert_heading,
    insert_numbered_list, insert_paragraph, replace_block_between_anchors,
    replace_block_under_heading,
};
use docx_rewrite::{Document, Error};

fn styles_of(doc: &Document) -> Vec<Option<String>> {
    doc.paragraphs()
        .into_iter()
        .map(|p| p.style_id(doc.tree()).map(str::to_string))
        .collect()
}

#[test]
fn paragraph_inserted_after_a_text_anchor_takes_its_style() {
    let mut doc = open_body(&format!(
        "{}{}",
        styled_paragraph("Title", &[run("Annual Report")]),
        paragraph(&[run("Intro text")]),
    ));
    let index = insert_paragraph(
        &mut doc,
        Target::Text("Report"),
        Position::After,
        " Fiscal year ",
        None,
    )
    .unwrap();
    assert_eq!(index, 1);

    let doc = reopen(&mut doc);
    assert_eq!(
        paragraph_texts(&doc),
        vec!["Annual Report", " Fiscal year ", "Intro text"]
    );
    assert_eq!(styles_of(&doc)[1].as_deref(), Some("Title"));
}

#[test]
fn paragraph_inserted_before_an_index_with_a_named_style() {
    let mut doc = open_body(&format!(
        "{}{}",
        paragraph(&[run("first")]),
        paragraph(&[run("second")]),
    ));
    let index = insert_paragraph(
        &mut doc,
        Target::Index(1),
        Position::Before,
        "Lead",
        Some("heading 1"),
    )
    .unwrap();
    assert_eq!(index, 1);

    let doc = reopen(&mut doc);
    assert_eq!(paragraph_texts(&doc), vec!["first", "Lead", "second"]);
    assert_eq!(
        styles_of(&doc),
        vec![None, Some("Heading1".to_string()), None]
    );
}

#[test]
fn heading_anchor_search_passes_over_the_table_of_contents() {
    let mut doc = open_body(&format!(
        "{}{}{}",
        styled_paragraph("TOC1", &[run("Chapter one")]),
        styled_paragraph("Heading1", &[run("Chapter one")]),
        paragraph(&[run("body")]),
    ));
    let index = insert_heading(
        &mut doc,
        Target::Text("Chapter one"),
        Position::After,
        "Background",
        None,
    )
    .unwrap();
    assert_eq!(index, 2);
    assert_eq!(
        paragraph_texts(&doc),
        vec!["Chapter one", "Chapter one", "Background", "body"]
    );
    assert_eq!(styles_of(&doc)[2].as_deref(), Some("Heading1"));
}

#[test]
fn insertion_failures_leave_the_document_alone() {
    let mut doc = open_body(&paragraph(&[run("only")]));

    assert!(matches!(
        insert_paragraph(&mut doc, Target::Text("absent"), Position::After, "x", None),
        Err(Error::ParagraphNotFound(ref anchor)) if anchor == "absent"
    ));
    assert!(matches!(
        insert_paragraph(&mut doc, Target::Index(3), Position::After, "x", None),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        insert_heading(&mut doc, Target::Index(0), Position::After, "x", Some("Fancy")),
        Err(Error::StyleNotFound(_))
    ));
    assert!(matches!(
        insert_numbered_list::<&str>(&mut doc, Target::Index(0), Position::After, &[]),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(paragraph_texts(&doc), vec!["only"]);
}

#[test]
fn numbered_list_items_keep_their_order() {
    let mut doc = open_body(&format!(
        "{}{}",
        paragraph(&[run("Steps:")]),
        paragraph(&[run("Done.")]),
    ));
    let first = insert_numbered_list(
        &mut doc,
        Target::Index(0),
        Position::After,
        &["one", "two", "three"],
    )
    .unwrap();
    assert_eq!(first, 1);

    let before = insert_numbered_list(
        &mut doc,
        Target::Text("Done."),
        Position::Before,
        &["four".to_string()],
    )
    .unwrap();
    assert_eq!(before, 4);

    let doc = reopen(&mut doc);
    assert_eq!(
        paragraph_texts(&doc),
        vec!["Steps:", "one", "two", "three", "four", "Done."]
    );
    assert!(styles_of(&doc)[1..5]
        .iter()
        .all(|s| s.as_deref() == Some("Normal")));
}

fn sectioned_body() -> String {
    format!(
        "{}{}{}{}{}{}{}",
        styled_paragraph("TOC1", &[run("Scope")]),
        styled_paragraph("Heading1", &[run("Scope")]),
        paragraph(&[run("a")]),
        table(&[&["cell"]]),
        paragraph(&[run("b")]),
        styled_paragraph("Heading1", &[run("Next")]),
        paragraph(&[run("c")]),
    )
}

#[test]
fn deleting_a_section_stops_at_the_next_heading() {
    let mut doc = open_body(&sectioned_body());
    assert_eq!(delete_block_under_heading(&mut doc, "  scope ").unwrap(), 3);
    assert!(doc.tables().is_empty());
    assert_eq!(paragraph_texts(&doc), vec!["Scope", "Scope", "Next", "c"]);

    assert_eq!(delete_block_under_heading(&mut doc, "Next").unwrap(), 1);
    let doc = reopen(&mut doc);
    assert_eq!(paragraph_texts(&doc), vec!["Scope", "Scope", "Next"]);
    assert!(doc.tree().child(doc.body(), W_NS, "sectPr").is_some());
}

#[test]
fn replacing_a_section_inserts_styled_paragraphs_after_the_heading() {
    let mut doc = open_body(&sectioned_body());
    let outcome =
        replace_block_under_heading(&mut doc, "Scope", &["new 1", "new 2"], None).unwrap();
    assert_eq!(
        outcome,
        BlockReplacement {
            removed: 3,
            inserted: 2
        }
    );

    let doc = reopen(&mut doc);
    assert_eq!(
        paragraph_texts(&doc),
        vec!["Scope", "Scope", "new 1", "new 2", "Next", "c"]
    );
    assert_eq!(styles_of(&doc)[2].as_deref(), Some("Normal"));

    let mut doc = open_body(&sectioned_body());
    assert!(matches!(
        replace_block_under_heading(&mut doc, "Missing", &["x"], None),
        Err(Error::ParagraphNotFound(_))
    ));
    assert!(matches!(
        replace_block_under_heading(&mut doc, "Scope", &["x"], Some("Fancy")),
        Err(Error::StyleNotFound(_))
    ));
    assert_eq!(paragraph_texts(&doc).len(), 7);
}

#[test]
fn block_between_anchors_ends_at_emphasized_text_by_default() {
    let mut doc = open_body(&format!(
        "{}{}{}{}",
        paragraph(&[run("START")]),
        paragraph(&[run("old")]),
        paragraph(&[bold_run("Bold Heading")]),
        paragraph(&[run("tail")]),
    ));
    let outcome =
        replace_block_between_anchors(&mut doc, " START", None, &["fresh"], None).unwrap();
    assert_eq!((outcome.removed, outcome.inserted), (1, 1));
    assert_eq!(
        paragraph_texts(&doc),
        vec!["START", "fresh", "Bold Heading", "tail"]
    );

    let outcome =
        replace_block_between_anchors::<&str>(&mut doc, "START", Some("tail"), &[], None).unwrap();
    assert_eq!((outcome.removed, outcome.inserted), (2, 0));
    assert_eq!(paragraph_texts(&doc), vec!["START", "tail"]);

    assert!(matches!(
        replace_block_between_anchors(&mut doc, "START", Some("nowhere"), &["x"], None),
        Err(Error::ParagraphNotFound(_))
    ));
    assert_eq!(paragraph_texts(&doc), vec!["START", "tail"]);
}
