//! Handles onto the WordprocessingML structure of a document tree.
//!
//! Each handle is a copyable structural reference (an arena node id). Handles
//! stay valid across sibling insertions and removals, which is what lets the
//! replace engine keep working on a run after its neighbours were split.

use crate::docx::{WML_NS, collect_block_nodes, new_wml_element, wml, wml_attr, wml_bool};
use crate::error::Error;
use crate::xml::{NodeId, QName, XML_NS, XmlTree};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn parse(val: &str) -> Option<Alignment> {
        match val.to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// Value written to `w:jc/@w:val`.
    pub fn as_jc(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

pub(crate) fn blocks_of(tree: &XmlTree, parent: NodeId) -> Vec<Block> {
    collect_block_nodes(tree, parent)
        .into_iter()
        .filter_map(|n| {
            if tree.is(n, WML_NS, "p") {
                Some(Block::Paragraph(Paragraph(n)))
            } else if tree.is(n, WML_NS, "tbl") {
                Some(Block::Table(Table(n)))
            } else {
                None
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Paragraph(NodeId);

impl Paragraph {
    pub fn new(node: NodeId) -> Self {
        Paragraph(node)
    }

    pub fn node(self) -> NodeId {
        self.0
    }

    /// New paragraph holding one plain run of `text`, inserted next to
    /// `sibling`. It is attached before its content is built so that new
    /// elements pick up the prefix bound where they land.
    pub fn insert_new(
        tree: &mut XmlTree,
        sibling: NodeId,
        after: bool,
        style_id: Option<&str>,
        text: &str,
    ) -> Result<Paragraph, Error> {
        let p = new_wml_element(tree, sibling, "p");
        if after {
            tree.insert_after(sibling, p)?;
        } else {
            tree.insert_before(sibling, p)?;
        }
        let paragraph = Paragraph(p);
        if let Some(id) = style_id {
            paragraph.set_style_id(tree, id);
        }
        let r = new_wml_element(tree, p, "r");
        tree.append_child(p, r);
        Run(r).set_text(tree, text);
        Ok(paragraph)
    }

    /// Runs that are direct children of the paragraph.
    pub fn runs(self, tree: &XmlTree) -> Vec<Run> {
        tree.children_named(self.0, WML_NS, "r").map(Run).collect()
    }

    /// Runs at any depth below the paragraph: inside hyperlinks, content
    /// controls, smart tags or revision marks. A run's own subtree is not
    /// searched (text boxes anchored in a run belong to their own paragraphs).
    pub fn nested_runs(self, tree: &XmlTree) -> Vec<Run> {
        fn walk(tree: &XmlTree, node: NodeId, out: &mut Vec<Run>) {
            for &child in tree.children(node) {
                if tree.is(child, WML_NS, "r") {
                    out.push(Run(child));
                } else if !tree.is(child, WML_NS, "p") {
                    walk(tree, child, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(tree, self.0, &mut out);
        out
    }

    pub fn text(self, tree: &XmlTree) -> String {
        self.nested_runs(tree)
            .into_iter()
            .map(|r| r.text(tree))
            .collect()
    }

    fn properties(self, tree: &XmlTree) -> Option<NodeId> {
        wml(tree, self.0, "pPr")
    }

    fn ensure_properties(self, tree: &mut XmlTree) -> NodeId {
        if let Some(ppr) = self.properties(tree) {
            return ppr;
        }
        let ppr = new_wml_element(tree, self.0, "pPr");
        tree.prepend_child(self.0, ppr);
        ppr
    }

    pub fn style_id(self, tree: &XmlTree) -> Option<&str> {
        self.properties(tree)
            .and_then(|ppr| wml_attr(tree, ppr, "pStyle"))
    }

    pub fn set_style_id(self, tree: &mut XmlTree, style_id: &str) {
        let ppr = self.ensure_properties(tree);
        let pstyle = match wml(tree, ppr, "pStyle") {
            Some(n) => n,
            None => {
                // w:pStyle is always the first child of w:pPr
                let n = new_wml_element(tree, ppr, "pStyle");
                tree.prepend_child(ppr, n);
                n
            }
        };
        tree.set_attribute(pstyle, Some(WML_NS), "val", style_id);
    }

    pub fn alignment(self, tree: &XmlTree) -> Option<Alignment> {
        self.properties(tree)
            .and_then(|ppr| wml_attr(tree, ppr, "jc"))
            .and_then(Alignment::parse)
    }

    pub fn set_alignment(self, tree: &mut XmlTree, alignment: Alignment) -> Result<(), Error> {
        // Elements that follow w:jc in CT_PPr's sequence.
        const AFTER_JC: &[&str] = &[
            "textDirection",
            "textAlignment",
            "textboxTightWrap",
            "outlineLvl",
            "divId",
            "cnfStyle",
            "rPr",
            "sectPr",
            "pPrChange",
        ];
        let ppr = self.ensure_properties(tree);
        let jc = match wml(tree, ppr, "jc") {
            Some(n) => n,
            None => {
                let n = new_wml_element(tree, ppr, "jc");
                let successor = tree.children(ppr).iter().copied().find(|&c| {
                    AFTER_JC.iter().any(|name| tree.is(c, WML_NS, name))
                });
                match successor {
                    Some(next) => tree.insert_before(next, n)?,
                    None => tree.append_child(ppr, n),
                }
                n
            }
        };
        tree.set_attribute(jc, Some(WML_NS), "val", alignment.as_jc());
        Ok(())
    }
}

/// Sets the content of a `w:t`, marking it `xml:space="preserve"` when the
/// text has leading or trailing whitespace.
pub(crate) fn write_t(tree: &mut XmlTree, t: NodeId, text: &str) {
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        tree.set_attribute(t, Some(XML_NS), "space", "preserve");
    }
    tree.set_text_content(t, text);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Run(NodeId);

impl Run {
    pub fn new(node: NodeId) -> Self {
        Run(node)
    }

    pub fn node(self) -> NodeId {
        self.0
    }

    /// `w:t` or `w:tab`: the children that carry the run's text.
    pub(crate) fn is_text_slot(tree: &XmlTree, node: NodeId) -> bool {
        tree.is(node, WML_NS, "t") || tree.is(node, WML_NS, "tab")
    }

    /// Chars a child contributes to [`Run::text`].
    pub(crate) fn slot_len(tree: &XmlTree, node: NodeId) -> usize {
        if tree.is(node, WML_NS, "t") {
            tree.text_content(node).chars().count()
        } else if tree.is(node, WML_NS, "tab") {
            1
        } else {
            0
        }
    }

    /// Visible text: `w:t` content and one `'\t'` per `w:tab`, in child order.
    pub fn text(self, tree: &XmlTree) -> String {
        let mut text = String::new();
        for &child in tree.children(self.0) {
            if tree.is(child, WML_NS, "t") {
                text.push_str(&tree.text_content(child));
            } else if tree.is(child, WML_NS, "tab") {
                text.push('\t');
            }
        }
        text
    }

    /// Replaces the run's text. The new `w:t`/`w:tab` nodes take the place of
    /// the first existing one; all other run content (properties, breaks,
    /// drawings) is left where it was.
    pub fn set_text(self, tree: &mut XmlTree, text: &str) {
        let slots: Vec<NodeId> = tree
            .children(self.0)
            .iter()
            .copied()
            .filter(|&c| Self::is_text_slot(tree, c))
            .collect();

        let prefix = tree.element(self.0).and_then(|el| el.name.prefix.clone());
        let mut nodes = Vec::new();
        for (i, segment) in text.split('\t').enumerate() {
            if i > 0 {
                nodes.push(tree.create_element(QName::new(Some(WML_NS), prefix.as_deref(), "tab")));
            }
            if segment.is_empty() {
                continue;
            }
            let t = tree.create_element(QName::new(Some(WML_NS), prefix.as_deref(), "t"));
            write_t(tree, t, segment);
            nodes.push(t);
        }

        match slots.first() {
            Some(&anchor) => {
                for node in nodes {
                    // anchor is a live child of this run, so this cannot fail
                    tree.insert_before(anchor, node).ok();
                }
            }
            None => {
                for node in nodes {
                    tree.append_child(self.0, node);
                }
            }
        }
        for slot in slots {
            tree.detach(slot);
        }
    }

    /// The `w:rPr` element, if the run carries direct formatting.
    pub fn properties(self, tree: &XmlTree) -> Option<NodeId> {
        wml(tree, self.0, "rPr")
    }

    pub fn is_bold(self, tree: &XmlTree) -> bool {
        self.properties(tree)
            .and_then(|rpr| wml_bool(tree, rpr, "b"))
            .unwrap_or(false)
    }

    pub fn is_italic(self, tree: &XmlTree) -> bool {
        self.properties(tree)
            .and_then(|rpr| wml_bool(tree, rpr, "i"))
            .unwrap_or(false)
    }

    pub fn parent(self, tree: &XmlTree) -> Option<NodeId> {
        tree.parent(self.0)
    }

    pub fn is_attached(self, tree: &XmlTree) -> bool {
        tree.is_attached(self.0)
    }

    pub fn insert_after(self, tree: &mut XmlTree, run: Run) -> Result<(), Error> {
        tree.insert_after(self.0, run.0)
    }

    pub fn insert_before(self, tree: &mut XmlTree, run: Run) -> Result<(), Error> {
        tree.insert_before(self.0, run.0)
    }

    pub fn remove(self, tree: &mut XmlTree) {
        tree.detach(self.0);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Table(NodeId);

impl Table {
    pub fn node(self) -> NodeId {
        self.0
    }

    pub fn rows(self, tree: &XmlTree) -> Vec<Row> {
        collect_block_nodes(tree, self.0)
            .into_iter()
            .filter(|&n| tree.is(n, WML_NS, "tr"))
            .map(Row)
            .collect()
    }

    /// Column count from `w:tblGrid`, falling back to the widest row.
    pub fn column_count(self, tree: &XmlTree) -> usize {
        let grid = wml(tree, self.0, "tblGrid")
            .map(|g| tree.children_named(g, WML_NS, "gridCol").count())
            .unwrap_or(0);
        if grid > 0 {
            return grid;
        }
        self.rows(tree)
            .into_iter()
            .map(|r| r.cells(tree).len())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Row(NodeId);

impl Row {
    pub fn cells(self, tree: &XmlTree) -> Vec<Cell> {
        collect_block_nodes(tree, self.0)
            .into_iter()
            .filter(|&n| tree.is(n, WML_NS, "tc"))
            .map(Cell)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell(NodeId);

impl Cell {
    pub fn blocks(self, tree: &XmlTree) -> Vec<Block> {
        blocks_of(tree, self.0)
    }

    /// Paragraphs of the cell, including those of nested tables.
    pub fn paragraphs(self, tree: &XmlTree) -> Vec<Paragraph> {
        let mut out = Vec::new();
        for block in self.blocks(tree) {
            match block {
                Block::Paragraph(p) => out.push(p),
                Block::Table(t) => {
                    for row in t.rows(tree) {
                        for cell in row.cells(tree) {
                            out.extend(cell.paragraphs(tree));
                        }
                    }
                }
            }
        }
        out
    }

    pub fn text(self, tree: &XmlTree) -> String {
        self.paragraphs(tree)
            .into_iter()
            .map(|p| p.text(tree))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
