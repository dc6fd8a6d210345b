//! Search normalization.
//!
//! Documents routinely carry characters that render as nothing (zero-width
//! joiners pasted from the web, soft hyphens inserted by hyphenation tools) or
//! as an ordinary space (NBSP). Both the needle and every run are normalized
//! before comparison so that what the user sees is what gets matched.

/// Characters removed by [`normalize`].
pub fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' // zero-width space
            | '\u{200C}' // zero-width non-joiner
            | '\u{200D}' // zero-width joiner
            | '\u{00AD}' // soft hyphen
            | '\u{FEFF}' // byte-order mark / zero-width no-break space
    )
}

pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|&c| !is_invisible(c))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect()
}

/// The form used for matching: [`normalize`]d, with each tab counted as a
/// single space. A tab is not a space on the page, but for search purposes
/// it reads as whitespace; this is not a layout computation.
pub fn search_form(text: &str) -> String {
    normalize(text).replace('\t', " ")
}

/// Maps a char offset in `normalize(raw)` to a char offset in `raw`.
///
/// Invisible characters sitting on the boundary stay with the text that
/// follows it.
pub fn raw_offset(raw: &str, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }
    let mut visible = 0;
    for (i, c) in raw.chars().enumerate() {
        if is_invisible(c) {
            continue;
        }
        visible += 1;
        if visible == offset {
            return i + 1;
        }
    }
    raw.chars().count()
}
