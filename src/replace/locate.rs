/// Half-open `[start, end)` char range of one occurrence in a paragraph's
/// flattened text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Every occurrence of `needle` in `haystack`, left to right, in char offsets.
///
/// Scanning resumes one character after each hit rather than after the whole
/// match, so overlapping occurrences (`"aa"` in `"aaaa"` at 0, 1 and 2) are all
/// reported. Callers apply them right to left against the live paragraph.
pub fn find_all(haystack: &str, needle: &str) -> Vec<MatchSpan> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle_len = needle.chars().count();
    let mut matches = Vec::new();
    let mut from = 0; // byte offset
    let mut chars_before = 0; // chars in haystack[..from]
    while let Some(rel) = haystack[from..].find(needle) {
        let pos = from + rel;
        let start = chars_before + haystack[from..pos].chars().count();
        matches.push(MatchSpan {
            start,
            end: start + needle_len,
        });
        let step = haystack[pos..].chars().next().map_or(1, char::len_utf8);
        from = pos + step;
        chars_before = start + 1;
    }
    matches
}
