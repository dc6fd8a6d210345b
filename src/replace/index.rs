use crate::model::{Paragraph, Run};
use crate::xml::XmlTree;

use super::locate::MatchSpan;
use super::normalize::search_form;

/// Where one run's text lands in the paragraph's flattened text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSpan {
    pub start: usize,
    pub end: usize,
    pub run: Run,
}

impl RunSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, m: MatchSpan) -> bool {
        self.start < m.end && self.end > m.start
    }

    pub fn within(&self, m: MatchSpan) -> bool {
        self.start >= m.start && self.end <= m.end
    }
}

/// Snapshot of a paragraph: flattened search text plus the spans that
/// produced it. Only valid until the next mutation of that paragraph.
#[derive(Clone, Debug, Default)]
pub struct RunIndex {
    pub text: String,
    pub spans: Vec<RunSpan>,
}

impl RunIndex {
    pub fn from_runs(tree: &XmlTree, runs: impl IntoIterator<Item = Run>) -> RunIndex {
        let mut text = String::new();
        let mut spans = Vec::new();
        let mut len = 0;
        for run in runs {
            let piece = search_form(&run.text(tree));
            let piece_len = piece.chars().count();
            if piece_len == 0 {
                continue;
            }
            text.push_str(&piece);
            spans.push(RunSpan {
                start: len,
                end: len + piece_len,
                run,
            });
            len += piece_len;
        }
        RunIndex { text, spans }
    }

    /// Length of the flattened text in chars.
    pub fn len(&self) -> usize {
        self.spans.last().map_or(0, |s| s.end)
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn overlapping(&self, m: MatchSpan) -> Vec<RunSpan> {
        self.spans.iter().copied().filter(|s| s.overlaps(m)).collect()
    }

    pub fn covered(&self, m: MatchSpan) -> Vec<RunSpan> {
        self.spans.iter().copied().filter(|s| s.within(m)).collect()
    }
}

/// A way of finding the runs that make up a paragraph's text.
pub trait RunIndexStrategy {
    fn name(&self) -> &'static str;

    fn collect_runs(&self, tree: &XmlTree, paragraph: Paragraph) -> Vec<Run>;

    fn build(&self, tree: &XmlTree, paragraph: Paragraph) -> RunIndex {
        RunIndex::from_runs(tree, self.collect_runs(tree, paragraph))
    }
}

/// The paragraph's direct `w:r` children.
pub struct DirectRuns;

impl RunIndexStrategy for DirectRuns {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn collect_runs(&self, tree: &XmlTree, paragraph: Paragraph) -> Vec<Run> {
        paragraph.runs(tree)
    }
}

/// Every `w:r` below the paragraph, including those wrapped in hyperlinks
/// and content controls that the direct children miss.
pub struct NestedRuns;

impl RunIndexStrategy for NestedRuns {
    fn name(&self) -> &'static str {
        "nested"
    }

    fn collect_runs(&self, tree: &XmlTree, paragraph: Paragraph) -> Vec<Run> {
        paragraph.nested_runs(tree)
    }
}

/// Strategies in the order they are tried.
pub static STRATEGIES: [&(dyn RunIndexStrategy + Sync); 2] = [&DirectRuns, &NestedRuns];
