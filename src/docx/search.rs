//! Read-only lookups: paragraph text by index and text search.

use serde::Serialize;

use super::Document;
use crate::error::Error;
use crate::replace::{find_all, search_form};

#[derive(Clone, Debug, Serialize)]
pub struct ParagraphText {
    pub index: usize,
    pub text: String,
    pub style: Option<String>,
    pub in_table: bool,
}

/// Text, style name and table membership of paragraph `index`, counted over
/// every paragraph in document order (table cells included).
pub fn paragraph_text(doc: &Document, index: usize) -> Result<ParagraphText, Error> {
    let paragraph = doc.paragraph(index)?;
    let in_table = doc
        .located_paragraphs()
        .get(index)
        .is_some_and(|&(_, in_table)| in_table);
    Ok(ParagraphText {
        index,
        text: paragraph.text(doc.tree()),
        style: doc.paragraph_style_name(paragraph),
        in_table,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct TextHit {
    pub paragraph_index: usize,
    /// Char offset in the paragraph's search text (invisible characters
    /// removed, NBSP and tab read as a space).
    pub offset: usize,
    pub in_table: bool,
    pub context: String,
}

/// Lowercases char by char so offsets in the folded text line up with the
/// original.
fn fold_case(text: &str) -> String {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Every occurrence of `needle` in the document, overlapping ones included.
///
/// Text is compared the way replacement compares it, so a search for
/// `"total cost"` finds `"total\u{A0}cost"`. With `whole_word`, a hit must not
/// be preceded or followed by a letter, digit or underscore.
pub fn find_text(
    doc: &Document,
    needle: &str,
    match_case: bool,
    whole_word: bool,
) -> Result<Vec<TextHit>, Error> {
    let mut needle = search_form(needle);
    if needle.is_empty() {
        return Err(Error::InvalidArgument("search text cannot be empty".into()));
    }
    if !match_case {
        needle = fold_case(&needle);
    }

    let tree = doc.tree();
    let mut hits = Vec::new();
    for (paragraph_index, (paragraph, in_table)) in
        doc.located_paragraphs().into_iter().enumerate()
    {
        let text = paragraph.text(tree);
        let mut haystack = search_form(&text);
        if !match_case {
            haystack = fold_case(&haystack);
        }
        let chars: Vec<char> = haystack.chars().collect();

        for m in find_all(&haystack, &needle) {
            if whole_word {
                let before = m.start.checked_sub(1).map(|i| chars[i]);
                let after = chars.get(m.end).copied();
                if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
                    continue;
                }
            }
            hits.push(TextHit {
                paragraph_index,
                offset: m.start,
                in_table,
                context: text.clone(),
            });
        }
    }

    log::debug!("Found {} hit(s) for {:?}", hits.len(), needle);
    Ok(hits)
}
