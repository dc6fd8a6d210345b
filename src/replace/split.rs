use crate::docx::WML_NS;
use crate::error::Error;
use crate::model::{Run, write_t};
use crate::xml::XmlTree;

/// Detached copy of `source` holding `text`.
///
/// The copy keeps the run element's attributes and its `w:rPr` verbatim. No
/// other content is copied: extra text nodes would duplicate text, and
/// drawings, breaks or field characters belong to exactly one run. Callers
/// that retire `source` move that content over with [`carry_content`].
pub fn clone_with_text(tree: &mut XmlTree, source: Run, text: &str) -> Run {
    let copy = tree.shallow_copy(source.node());
    if let Some(rpr) = tree.child(source.node(), WML_NS, "rPr") {
        let rpr_copy = tree.deep_copy(rpr);
        tree.append_child(copy, rpr_copy);
    }
    let run = Run::new(copy);
    run.set_text(tree, text);
    run
}

/// Moves everything except `w:rPr` and text out of `from` into `into`.
///
/// Content that came before `from`'s first text goes ahead of `into`'s
/// text, the rest after it, in the original order. Returns whether
/// anything moved.
pub fn carry_content(tree: &mut XmlTree, from: Run, into: Run) -> Result<bool, Error> {
    let anchor = tree
        .children(into.node())
        .iter()
        .copied()
        .find(|&c| Run::is_text_slot(tree, c));
    let mut seen_text = false;
    let mut moved = false;
    for child in tree.children(from.node()).to_vec() {
        if tree.is(child, WML_NS, "rPr") {
            continue;
        }
        if Run::is_text_slot(tree, child) {
            seen_text = true;
            continue;
        }
        match anchor {
            Some(anchor) if !seen_text => tree.insert_before(anchor, child)?,
            _ => tree.append_child(into.node(), child),
        }
        moved = true;
    }
    Ok(moved)
}

/// Splits `run` at char `offset` of its text.
///
/// The run keeps everything before the offset and a clone inserted right
/// after it takes the rest, in child order: a `w:t` straddling the offset is
/// cut in two, and breaks or drawings sitting at or past the offset move
/// with the right-hand part. An offset at either end changes nothing. The
/// paragraph's text is the same before and after; only a run boundary moves.
pub fn split_run(tree: &mut XmlTree, run: Run, offset: usize) -> Result<(String, String), Error> {
    let text = run.text(tree);
    let chars: Vec<char> = text.chars().collect();
    if offset > chars.len() {
        return Err(Error::StructuralInconsistency(format!(
            "split offset {offset} is past the end of a {}-char run",
            chars.len()
        )));
    }
    let left: String = chars[..offset].iter().collect();
    let right: String = chars[offset..].iter().collect();
    if offset == 0 || offset == chars.len() {
        return Ok((left, right));
    }

    let right_run = clone_with_text(tree, run, "");
    let mut pos = 0;
    for child in tree.children(run.node()).to_vec() {
        if tree.is(child, WML_NS, "rPr") {
            continue;
        }
        let len = Run::slot_len(tree, child);
        if pos >= offset {
            tree.append_child(right_run.node(), child);
        } else if pos + len > offset {
            let content: Vec<char> = tree.text_content(child).chars().collect();
            let cut = offset - pos;
            let head: String = content[..cut].iter().collect();
            let tail: String = content[cut..].iter().collect();
            let tail_node = tree.shallow_copy(child);
            write_t(tree, child, &head);
            write_t(tree, tail_node, &tail);
            tree.append_child(right_run.node(), tail_node);
        }
        pos += len;
    }
    run.insert_after(tree, right_run)?;
    Ok((left, right))
}
