use serde::Serialize;

use super::{Document, WML_NS};
use crate::model::{Block, Paragraph, Table};

const CORE_PART: &str = "docProps/core.xml";
const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

const PARAGRAPH_PREVIEW_CHARS: usize = 100;
const CELL_PREVIEW_CHARS: usize = 20;
const TABLE_PREVIEW_SIZE: usize = 3;

#[derive(Clone, Debug, Default, Serialize)]
pub struct DocumentProperties {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub created: String,
    pub modified: String,
    pub last_modified_by: String,
    pub revision: u32,
    /// Number of sections; Word does not store a page count in the body.
    pub page_count: usize,
    pub word_count: usize,
    pub paragraph_count: usize,
    pub table_count: usize,
}

fn top_level_paragraphs(doc: &Document) -> Vec<Paragraph> {
    doc.blocks()
        .into_iter()
        .filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
        .collect()
}

pub fn properties(doc: &Document) -> DocumentProperties {
    let mut props = DocumentProperties::default();

    if let Some(xml_content) = doc.package().part_text(CORE_PART) {
        match roxmltree::Document::parse(&xml_content) {
            Ok(xml) => {
                for node in xml.root_element().children().filter(|n| n.is_element()) {
                    let value = node.text().unwrap_or("").trim().to_string();
                    let tag = node.tag_name();
                    match (tag.namespace(), tag.name()) {
                        (Some(DC_NS), "title") => props.title = value,
                        (Some(DC_NS), "creator") => props.author = value,
                        (Some(DC_NS), "subject") => props.subject = value,
                        (Some(CP_NS), "keywords") => props.keywords = value,
                        (Some(DCTERMS_NS), "created") => props.created = value,
                        (Some(DCTERMS_NS), "modified") => props.modified = value,
                        (Some(CP_NS), "lastModifiedBy") => props.last_modified_by = value,
                        (Some(CP_NS), "revision") => props.revision = value.parse().unwrap_or(0),
                        _ => {}
                    }
                }
            }
            Err(e) => log::warn!("Could not parse {CORE_PART}: {e}"),
        }
    }

    let tree = doc.tree();
    // One w:sectPr per section: the body's own plus one per section break.
    props.page_count = tree
        .descendants(doc.body())
        .into_iter()
        .filter(|&n| tree.is(n, WML_NS, "sectPr"))
        .count()
        .max(1);
    let paragraphs = top_level_paragraphs(doc);
    props.paragraph_count = paragraphs.len();
    props.word_count = paragraphs
        .iter()
        .map(|p| p.text(tree).split_whitespace().count())
        .sum();
    props.table_count = doc.tables().len();
    props
}

/// All paragraph text in document order, table cells included, one
/// paragraph per line.
pub fn extract_text(doc: &Document) -> String {
    let tree = doc.tree();
    doc.paragraphs()
        .into_iter()
        .map(|p| p.text(tree))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone, Debug, Serialize)]
pub struct ParagraphSummary {
    pub index: usize,
    pub text: String,
    pub style: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TableSummary {
    pub index: usize,
    pub rows: usize,
    pub columns: usize,
    pub preview: Vec<Vec<String>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Structure {
    pub paragraphs: Vec<ParagraphSummary>,
    pub tables: Vec<TableSummary>,
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

fn summarize_table(doc: &Document, index: usize, table: Table) -> TableSummary {
    let tree = doc.tree();
    let rows = table.rows(tree);
    let columns = table.column_count(tree);
    let preview = rows
        .iter()
        .take(TABLE_PREVIEW_SIZE)
        .map(|row| {
            let cells = row.cells(tree);
            (0..columns.min(TABLE_PREVIEW_SIZE))
                .map(|col| match cells.get(col) {
                    Some(cell) => shorten(&cell.text(tree), CELL_PREVIEW_CHARS),
                    None => "N/A".to_string(),
                })
                .collect()
        })
        .collect();
    TableSummary {
        index,
        rows: rows.len(),
        columns,
        preview,
    }
}

/// Outline of the body: top-level paragraphs with a short preview and their
/// style, and top-level tables with a corner of their content.
pub fn structure(doc: &Document) -> Structure {
    let tree = doc.tree();
    let paragraphs = top_level_paragraphs(doc)
        .into_iter()
        .enumerate()
        .map(|(index, p)| ParagraphSummary {
            index,
            text: shorten(&p.text(tree), PARAGRAPH_PREVIEW_CHARS),
            style: doc
                .paragraph_style_name(p)
                .unwrap_or_else(|| "Normal".to_string()),
        })
        .collect();
    let tables = doc
        .tables()
        .into_iter()
        .enumerate()
        .map(|(index, t)| summarize_table(doc, index, t))
        .collect();
    Structure { paragraphs, tables }
}
