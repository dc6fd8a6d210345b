//! Format-preserving find and replace.
//!
//! A match may span several runs with different formatting. The runs at
//! either edge are split so that the match covers whole runs, the covered
//! runs are swapped for clones carrying the replacement text, and every run
//! outside the match is left untouched.

mod index;
mod locate;
mod normalize;
mod split;
mod synth;

use std::time::Instant;

use crate::docx::Document;
use crate::model::Paragraph;
use crate::xml::XmlTree;

pub use index::{DirectRuns, NestedRuns, RunIndex, RunIndexStrategy, RunSpan, STRATEGIES};
pub use locate::{MatchSpan, find_all};
pub use normalize::{is_invisible, normalize, raw_offset, search_form};
pub use split::{carry_content, clone_with_text, split_run};
pub use synth::{distribute, replace_span};

/// Replaces every occurrence of `search` in the document body, table cells
/// included, and returns the number of replacements made.
///
/// Table-of-contents paragraphs are skipped; Word regenerates them. Failures
/// on individual matches are logged and skipped, never returned.
pub fn replace_all(document: &mut Document, search: &str, replacement: &str) -> usize {
    let t0 = Instant::now();

    let paragraphs: Vec<(Paragraph, bool)> = document
        .paragraphs()
        .into_iter()
        .map(|p| (p, document.is_toc_paragraph(p)))
        .collect();

    let mut total = 0;
    let mut skipped_toc = 0;
    for (paragraph, is_toc) in paragraphs {
        if is_toc {
            skipped_toc += 1;
            continue;
        }
        total += replace_in_paragraph(document.tree_mut(), paragraph, search, replacement);
    }

    log::info!(
        "Replaced {} occurrence(s) of {:?} in {:.1}ms ({} TOC paragraph(s) skipped)",
        total,
        search,
        t0.elapsed().as_secs_f64() * 1000.0,
        skipped_toc,
    );
    total
}

/// Replaces every occurrence of `search` in one paragraph.
///
/// Direct runs are tried first; the nested walk is only used when direct
/// runs yield no match. Matches are located once and applied right to left.
pub fn replace_in_paragraph(
    tree: &mut XmlTree,
    paragraph: Paragraph,
    search: &str,
    replacement: &str,
) -> usize {
    let needle = search_form(search);
    if needle.is_empty() {
        return 0;
    }

    for strategy in STRATEGIES {
        let index = strategy.build(tree, paragraph);
        let matches = find_all(&index.text, &needle);
        if matches.is_empty() {
            continue;
        }
        log::debug!(
            "{} match(es) for {:?} using {} runs ({} run(s))",
            matches.len(),
            needle,
            strategy.name(),
            index.spans.len()
        );

        let mut count = 0;
        for m in matches.into_iter().rev() {
            match replace_span(tree, strategy, paragraph, m, replacement) {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Skipping match at {}..{}: {}", m.start, m.end, e),
            }
        }
        return count;
    }
    0
}
