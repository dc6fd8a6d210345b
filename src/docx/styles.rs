use std::collections::HashMap;

use super::{Package, WML_NS};

const STYLES_PART: &str = "word/styles.xml";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleKind {
    fn parse(val: &str) -> Option<StyleKind> {
        match val {
            "paragraph" => Some(StyleKind::Paragraph),
            "character" => Some(StyleKind::Character),
            "table" => Some(StyleKind::Table),
            "numbering" => Some(StyleKind::Numbering),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StyleDef {
    pub id: String,
    pub name: String,
    pub kind: StyleKind,
    pub is_default: bool,
    pub based_on: Option<String>,
}

/// Styles declared in `word/styles.xml`, keyed by style id.
#[derive(Clone, Debug, Default)]
pub struct StyleCatalog {
    styles: HashMap<String, StyleDef>,
}

/// Table-of-contents styles: Word's built-ins are stored as `toc 1`..`toc 9`
/// and `TOC Heading`; ids are `TOC1`.. and `TOCHeading`. The prefix has to
/// end a word, so `Tocata` is not one.
pub fn is_toc_style(name: &str) -> bool {
    let Some(prefix) = name.get(..3) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case("toc") {
        return false;
    }
    match name[3..].chars().next() {
        None => true,
        Some(c) if c.is_whitespace() || c.is_ascii_digit() => true,
        Some(c) => prefix == "TOC" && c.is_uppercase(),
    }
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

impl StyleCatalog {
    pub(super) fn parse(package: &Package) -> StyleCatalog {
        let mut styles = HashMap::new();

        let Some(xml_content) = package.part_text(STYLES_PART) else {
            return StyleCatalog { styles };
        };
        let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
            log::warn!("Could not parse {STYLES_PART}, continuing without a style catalog");
            return StyleCatalog { styles };
        };

        for style_node in xml.root_element().children() {
            if style_node.tag_name().name() != "style"
                || style_node.tag_name().namespace() != Some(WML_NS)
            {
                continue;
            }
            let Some(id) = style_node.attribute((WML_NS, "styleId")) else {
                continue;
            };
            let kind = style_node
                .attribute((WML_NS, "type"))
                .and_then(StyleKind::parse)
                .unwrap_or(StyleKind::Paragraph);
            let is_default = style_node
                .attribute((WML_NS, "default"))
                .is_some_and(|v| v == "1" || v == "true");
            let name = wml_attr(style_node, "name").unwrap_or(id).to_string();
            let based_on = wml_attr(style_node, "basedOn").map(str::to_string);

            styles.insert(
                id.to_string(),
                StyleDef {
                    id: id.to_string(),
                    name,
                    kind,
                    is_default,
                    based_on,
                },
            );
        }

        StyleCatalog { styles }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StyleDef> {
        self.styles.get(id)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.styles.get(id).map(|s| s.name.as_str())
    }

    /// Case-insensitive lookup by display name, then by id.
    pub fn find_by_name(&self, name: &str, kind: StyleKind) -> Option<&StyleDef> {
        let mut candidates: Vec<&StyleDef> =
            self.styles.values().filter(|s| s.kind == kind).collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        candidates
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .or_else(|| candidates.iter().find(|s| s.id.eq_ignore_ascii_case(name)))
            .copied()
    }

    pub fn default_paragraph_style(&self) -> Option<&StyleDef> {
        self.styles
            .values()
            .find(|s| s.kind == StyleKind::Paragraph && s.is_default)
    }
}
