//! Paragraph-level edits anchored on existing content: inserting headings,
//! paragraphs and numbered lists next to a paragraph, and replacing the
//! blocks under a heading or between two anchor paragraphs.

use serde::Serialize;

use super::{Document, StyleKind, WML_NS};
use crate::error::Error;
use crate::model::{Block, Paragraph};
use crate::xml::NodeId;

/// Styles tried, in order, for numbered list items.
const LIST_STYLES: [&str; 3] = ["List Number", "List Paragraph", "Normal"];

/// The paragraph an insertion is anchored on.
#[derive(Clone, Copy, Debug)]
pub enum Target<'a> {
    /// Index into [`Document::paragraphs`].
    Index(usize),
    /// First paragraph containing the text; TOC paragraphs are passed over.
    Text(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlockReplacement {
    pub removed: usize,
    pub inserted: usize,
}

fn resolve(doc: &Document, target: Target<'_>) -> Result<Paragraph, Error> {
    match target {
        Target::Index(index) => doc.paragraph(index),
        Target::Text("") => Err(Error::InvalidArgument("anchor text cannot be empty".into())),
        Target::Text(text) => doc
            .paragraphs()
            .into_iter()
            .find(|&p| !doc.is_toc_paragraph(p) && p.text(doc.tree()).contains(text))
            .ok_or_else(|| Error::ParagraphNotFound(text.to_string())),
    }
}

fn lookup_style(doc: &Document, name: &str) -> Result<String, Error> {
    doc.styles()
        .find_by_name(name, StyleKind::Paragraph)
        .map(|s| s.id.clone())
        .ok_or_else(|| Error::StyleNotFound(name.to_string()))
}

fn index_of(doc: &Document, paragraph: Paragraph) -> Result<usize, Error> {
    doc.paragraphs()
        .iter()
        .position(|&p| p == paragraph)
        .ok_or_else(|| Error::StructuralInconsistency("inserted paragraph is not in the body".into()))
}

/// Inserts one paragraph per text next to `anchor`, keeping their order.
fn insert_paragraphs<S: AsRef<str>>(
    doc: &mut Document,
    anchor: NodeId,
    position: Position,
    style_id: Option<&str>,
    texts: &[S],
) -> Result<Vec<Paragraph>, Error> {
    let tree = doc.tree_mut();
    let mut inserted = Vec::with_capacity(texts.len());
    let mut last = anchor;
    for text in texts {
        let paragraph = match position {
            Position::Before => Paragraph::insert_new(tree, anchor, false, style_id, text.as_ref())?,
            Position::After => Paragraph::insert_new(tree, last, true, style_id, text.as_ref())?,
        };
        last = paragraph.node();
        inserted.push(paragraph);
    }
    Ok(inserted)
}

/// Inserts a paragraph next to the target and returns its index. Without a
/// style name the new paragraph takes the target's style.
pub fn insert_paragraph(
    doc: &mut Document,
    target: Target<'_>,
    position: Position,
    text: &str,
    style: Option<&str>,
) -> Result<usize, Error> {
    let anchor = resolve(doc, target)?;
    let style_id = match style {
        Some(name) => Some(lookup_style(doc, name)?),
        None => anchor.style_id(doc.tree()).map(str::to_string),
    };
    let inserted = insert_paragraphs(
        doc,
        anchor.node(),
        position,
        style_id.as_deref(),
        std::slice::from_ref(&text),
    )?;
    let index = index_of(doc, inserted[0])?;
    log::info!("Inserted paragraph {index} ({position:?} target)");
    Ok(index)
}

/// Inserts a heading (style `Heading 1` unless named) next to the target
/// and returns its index.
pub fn insert_heading(
    doc: &mut Document,
    target: Target<'_>,
    position: Position,
    title: &str,
    style: Option<&str>,
) -> Result<usize, Error> {
    insert_paragraph(doc, target, position, title, Some(style.unwrap_or("Heading 1")))
}

/// Inserts one paragraph per item next to the target, styled with the first
/// of `List Number`, `List Paragraph` or `Normal` the document defines.
/// Returns the index of the first item.
pub fn insert_numbered_list<S: AsRef<str>>(
    doc: &mut Document,
    target: Target<'_>,
    position: Position,
    items: &[S],
) -> Result<usize, Error> {
    if items.is_empty() {
        return Err(Error::InvalidArgument("list has no items".into()));
    }
    let anchor = resolve(doc, target)?;
    let style_id = LIST_STYLES
        .iter()
        .find_map(|name| doc.styles().find_by_name(name, StyleKind::Paragraph))
        .map(|s| s.id.clone());
    let inserted = insert_paragraphs(doc, anchor.node(), position, style_id.as_deref(), items)?;
    let index = index_of(doc, inserted[0])?;
    log::info!("Inserted a {}-item list at paragraph {index}", items.len());
    Ok(index)
}

fn block_node(block: Block) -> NodeId {
    match block {
        Block::Paragraph(p) => p.node(),
        Block::Table(t) => t.node(),
    }
}

/// Headings and TOC entries end the section a heading opens.
fn ends_section(doc: &Document, paragraph: Paragraph) -> bool {
    if doc.is_toc_paragraph(paragraph) {
        return true;
    }
    doc.paragraph_style_name(paragraph).is_some_and(|name| {
        let name = name.to_lowercase();
        name.starts_with("heading") || name.starts_with("título")
    })
}

/// Position in `blocks` of the first top-level paragraph accepted by `pred`.
fn find_block(
    blocks: &[Block],
    from: usize,
    mut pred: impl FnMut(Paragraph) -> bool,
) -> Option<usize> {
    blocks
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(i, b)| match *b {
            Block::Paragraph(p) if pred(p) => Some(i),
            _ => None,
        })
}

fn find_heading(doc: &Document, blocks: &[Block], heading: &str) -> Result<usize, Error> {
    let wanted = heading.trim().to_lowercase();
    find_block(blocks, 0, |p| {
        !doc.is_toc_paragraph(p) && p.text(doc.tree()).trim().to_lowercase() == wanted
    })
    .ok_or_else(|| Error::ParagraphNotFound(heading.to_string()))
}

/// Detaches `blocks[from..to]` and returns how many were removed.
fn remove_blocks(doc: &mut Document, blocks: &[Block], from: usize, to: usize) -> usize {
    let tree = doc.tree_mut();
    for &block in &blocks[from..to] {
        tree.detach(block_node(block));
    }
    to - from
}

fn section_end(doc: &Document, blocks: &[Block], heading_at: usize) -> usize {
    find_block(blocks, heading_at + 1, |p| ends_section(doc, p)).unwrap_or(blocks.len())
}

/// Removes every top-level block (paragraphs and tables) after the heading
/// whose trimmed text equals `heading` (case-insensitive), up to the next
/// heading or TOC paragraph. Returns the number of blocks removed.
pub fn delete_block_under_heading(doc: &mut Document, heading: &str) -> Result<usize, Error> {
    let blocks = doc.blocks();
    let at = find_heading(doc, &blocks, heading)?;
    let end = section_end(doc, &blocks, at);
    let removed = remove_blocks(doc, &blocks, at + 1, end);
    log::info!("Removed {removed} block(s) under {heading:?}");
    Ok(removed)
}

/// Style id for replacement paragraphs: the named style, or `Normal` when
/// the document defines it.
fn block_style(doc: &Document, style: Option<&str>) -> Result<Option<String>, Error> {
    match style {
        Some(name) => lookup_style(doc, name).map(Some),
        None => Ok(doc
            .styles()
            .find_by_name("Normal", StyleKind::Paragraph)
            .map(|s| s.id.clone())),
    }
}

/// Replaces the section under a heading (see [`delete_block_under_heading`])
/// with one paragraph per text.
pub fn replace_block_under_heading<S: AsRef<str>>(
    doc: &mut Document,
    heading: &str,
    paragraphs: &[S],
    style: Option<&str>,
) -> Result<BlockReplacement, Error> {
    let style_id = block_style(doc, style)?;
    let blocks = doc.blocks();
    let at = find_heading(doc, &blocks, heading)?;
    let end = section_end(doc, &blocks, at);

    let removed = remove_blocks(doc, &blocks, at + 1, end);
    let inserted = insert_paragraphs(
        doc,
        block_node(blocks[at]),
        Position::After,
        style_id.as_deref(),
        paragraphs,
    )?
    .len();
    log::info!("Replaced {removed} block(s) under {heading:?} with {inserted} paragraph(s)");
    Ok(BlockReplacement { removed, inserted })
}

/// Bold, all-caps or explicitly sized text marks the start of a new section
/// when no end anchor is given.
fn looks_like_heading(doc: &Document, paragraph: Paragraph) -> bool {
    let tree = doc.tree();
    paragraph.nested_runs(tree).into_iter().any(|r| {
        r.properties(tree).is_some_and(|rpr| {
            ["b", "caps", "sz"]
                .iter()
                .any(|name| tree.child(rpr, WML_NS, name).is_some())
        })
    })
}

/// Replaces the top-level blocks strictly between the paragraph whose
/// trimmed text is `start` and the one whose trimmed text is `end`.
///
/// Without `end`, the block runs to the next paragraph that has bold,
/// all-caps or sized text, or to the end of the body.
pub fn replace_block_between_anchors<S: AsRef<str>>(
    doc: &mut Document,
    start: &str,
    end: Option<&str>,
    paragraphs: &[S],
    style: Option<&str>,
) -> Result<BlockReplacement, Error> {
    let style_id = block_style(doc, style)?;
    let blocks = doc.blocks();
    let tree = doc.tree();
    let start_at = find_block(&blocks, 0, |p| p.text(tree).trim() == start.trim())
        .ok_or_else(|| Error::ParagraphNotFound(start.to_string()))?;
    let end_at = match end {
        Some(end) => find_block(&blocks, start_at + 1, |p| p.text(tree).trim() == end.trim())
            .ok_or_else(|| Error::ParagraphNotFound(end.to_string()))?,
        None => find_block(&blocks, start_at + 1, |p| looks_like_heading(doc, p))
            .unwrap_or(blocks.len()),
    };

    let removed = remove_blocks(doc, &blocks, start_at + 1, end_at);
    let inserted = insert_paragraphs(
        doc,
        block_node(blocks[start_at]),
        Position::After,
        style_id.as_deref(),
        paragraphs,
    )?
    .len();
    log::info!("Replaced {removed} block(s) after {start:?} with {inserted} paragraph(s)");
    Ok(BlockReplacement { removed, inserted })
}
