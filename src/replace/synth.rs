use crate::error::Error;
use crate::model::{Paragraph, Run};
use crate::xml::XmlTree;

use super::index::{RunIndexStrategy, RunSpan};
use super::locate::MatchSpan;
use super::normalize::raw_offset;
use super::split::{carry_content, clone_with_text, split_run};

/// Splits `replacement` across the runs a match covered.
///
/// Returns `(covered run position, text)` pairs in order. Each run but the
/// last takes as many chars as it originally held, the last takes whatever
/// is left, and runs past the end of the replacement get nothing. Nothing
/// is returned when no run was covered.
pub fn distribute(covered_lengths: &[usize], replacement: &str) -> Vec<(usize, String)> {
    let chars: Vec<char> = replacement.chars().collect();
    let mut pieces = Vec::new();
    let mut pos = 0;
    for (i, &len) in covered_lengths.iter().enumerate() {
        if pos >= chars.len() {
            break;
        }
        let take = if i + 1 == covered_lengths.len() {
            chars.len() - pos
        } else {
            len.max(1).min(chars.len() - pos)
        };
        pieces.push((i, chars[pos..pos + take].iter().collect()));
        pos += take;
    }
    pieces
}

/// Splits the run behind `span` at a char offset of the flattened text.
fn split_span(tree: &mut XmlTree, span: RunSpan, at: usize) -> Result<(), Error> {
    let raw = span.run.text(tree);
    let offset = raw_offset(&raw, at - span.start);
    split_run(tree, span.run, offset)?;
    Ok(())
}

/// Replaces the text under `m` in the live paragraph.
///
/// Each replacement run takes the place of the covered run it was cloned
/// from, so runs inside a hyperlink are replaced inside that hyperlink.
/// Non-text content of a covered run (drawings, breaks, field characters)
/// moves into its replacement.
///
/// Returns `Ok(false)` when no run lies under the match. The index is rebuilt
/// after every structural change, so `m` must be expressed against the
/// paragraph as it is now.
pub fn replace_span(
    tree: &mut XmlTree,
    strategy: &dyn RunIndexStrategy,
    paragraph: Paragraph,
    m: MatchSpan,
    replacement: &str,
) -> Result<bool, Error> {
    let index = strategy.build(tree, paragraph);
    if m.end > index.len() {
        return Err(Error::StructuralInconsistency(format!(
            "match {}..{} runs past the paragraph's {} chars",
            m.start,
            m.end,
            index.len()
        )));
    }
    let Some(&first) = index.overlapping(m).first() else {
        return Ok(false);
    };
    if first.start < m.start {
        split_span(tree, first, m.start)?;
    }

    let index = strategy.build(tree, paragraph);
    if let Some(&last) = index.overlapping(m).last()
        && last.end > m.end
    {
        split_span(tree, last, m.end)?;
    }

    let covered = strategy.build(tree, paragraph).covered(m);
    if covered.is_empty() {
        return Ok(false);
    }

    let lengths: Vec<usize> = covered.iter().map(RunSpan::len).collect();
    let mut clones: Vec<Option<Run>> = vec![None; covered.len()];
    for (i, text) in distribute(&lengths, replacement) {
        clones[i] = Some(clone_with_text(tree, covered[i].run, &text));
    }
    for (span, clone) in covered.iter().zip(clones) {
        // a run the replacement never reached still hands over its
        // drawings and breaks, through an empty shell
        let (target, has_text) = match clone {
            Some(run) => (run, true),
            None => (clone_with_text(tree, span.run, ""), false),
        };
        let carried = carry_content(tree, span.run, target)?;
        if has_text || carried {
            span.run.insert_before(tree, target)?;
        }
    }
    for span in covered {
        span.run.remove(tree);
    }
    Ok(true)
}
