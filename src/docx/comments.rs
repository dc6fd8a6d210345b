use std::collections::HashMap;

use serde::Serialize;

use super::{Document, WML_NS};
use crate::model::Run;

const COMMENTS_PART: &str = "word/comments.xml";

#[derive(Clone, Debug, Serialize)]
pub struct Comment {
    /// Ordinal id, `comment_1` for the first comment in the comments part.
    pub id: String,
    /// The `w:id` linking the comment to its anchor in the body.
    pub comment_id: String,
    pub author: String,
    pub initials: String,
    pub date: Option<String>,
    pub text: String,
    pub paragraph_index: Option<usize>,
    pub in_table: bool,
    pub reference_text: String,
}

#[derive(Default)]
struct Anchor {
    paragraph_index: Option<usize>,
    in_table: bool,
    text: String,
}

/// Where each comment id is anchored in the body, with the text it spans.
fn collect_anchors(doc: &Document) -> HashMap<String, Anchor> {
    let tree = doc.tree();
    let mut anchors: HashMap<String, Anchor> = HashMap::new();
    let mut open: Vec<String> = Vec::new();

    for (index, (paragraph, in_table)) in doc.located_paragraphs().into_iter().enumerate() {
        for node in tree.descendants(paragraph.node()) {
            let id_of = || tree.attribute(node, Some(WML_NS), "id").map(str::to_string);
            let is_start = tree.is(node, WML_NS, "commentRangeStart");
            if is_start || tree.is(node, WML_NS, "commentReference") {
                let Some(id) = id_of() else { continue };
                let anchor = anchors.entry(id.clone()).or_default();
                if anchor.paragraph_index.is_none() {
                    anchor.paragraph_index = Some(index);
                    anchor.in_table = in_table;
                }
                if is_start && !open.contains(&id) {
                    open.push(id);
                }
            } else if tree.is(node, WML_NS, "commentRangeEnd") {
                if let Some(id) = id_of() {
                    open.retain(|o| *o != id);
                }
            } else if tree.is(node, WML_NS, "r") && !open.is_empty() {
                let text = Run::new(node).text(tree);
                for id in &open {
                    if let Some(anchor) = anchors.get_mut(id) {
                        anchor.text.push_str(&text);
                    }
                }
            }
        }
    }
    anchors
}

/// Every comment of the document, in the order of the comments part.
/// A document without comments yields an empty list.
pub fn extract_comments(doc: &Document) -> Vec<Comment> {
    let part = doc
        .part_for_type("comments")
        .unwrap_or_else(|| COMMENTS_PART.to_string());
    let Some(xml_content) = doc.package().part_text(&part) else {
        return Vec::new();
    };
    let xml = match roxmltree::Document::parse(&xml_content) {
        Ok(xml) => xml,
        Err(e) => {
            log::warn!("Could not parse {part}: {e}");
            return Vec::new();
        }
    };

    let mut anchors = collect_anchors(doc);
    let mut comments = Vec::new();
    let comment_nodes = xml
        .root_element()
        .children()
        .filter(|n| n.tag_name().name() == "comment" && n.tag_name().namespace() == Some(WML_NS));
    for (i, node) in comment_nodes.enumerate() {
        let comment_id = node
            .attribute((WML_NS, "id"))
            .map(str::to_string)
            .unwrap_or_else(|| i.to_string());

        let paragraphs: Vec<String> = node
            .descendants()
            .filter(|n| n.tag_name().name() == "p" && n.tag_name().namespace() == Some(WML_NS))
            .map(|p| {
                p.descendants()
                    .filter(|n| n.tag_name().name() == "t" && n.tag_name().namespace() == Some(WML_NS))
                    .filter_map(|t| t.text())
                    .collect::<String>()
            })
            .collect();

        let anchor = anchors.remove(&comment_id).unwrap_or_default();
        comments.push(Comment {
            id: format!("comment_{}", i + 1),
            author: node
                .attribute((WML_NS, "author"))
                .unwrap_or("Unknown")
                .to_string(),
            initials: node
                .attribute((WML_NS, "initials"))
                .unwrap_or("")
                .to_string(),
            date: node
                .attribute((WML_NS, "date"))
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            text: paragraphs.join("\n").trim().to_string(),
            paragraph_index: anchor.paragraph_index,
            in_table: anchor.in_table,
            reference_text: anchor.text,
            comment_id,
        });
    }

    log::debug!("Extracted {} comment(s) from {part}", comments.len());
    comments
}

pub fn filter_by_author(comments: Vec<Comment>, author: &str) -> Vec<Comment> {
    let author = author.to_lowercase();
    comments
        .into_iter()
        .filter(|c| c.author.to_lowercase() == author)
        .collect()
}

pub fn for_paragraph(comments: Vec<Comment>, paragraph_index: usize) -> Vec<Comment> {
    comments
        .into_iter()
        .filter(|c| c.paragraph_index == Some(paragraph_index))
        .collect()
}
