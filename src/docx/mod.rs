pub mod comments;
pub mod edit;
pub mod pictures;
pub mod properties;
pub mod search;
mod styles;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use crate::error::Error;
use crate::model::{Block, Paragraph, Table, blocks_of};
use crate::xml::{NodeId, QName, XmlTree};

pub use styles::{StyleCatalog, StyleDef, StyleKind, is_toc_style};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const WPD_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

pub(crate) fn wml(tree: &XmlTree, node: NodeId, name: &str) -> Option<NodeId> {
    tree.child(node, WML_NS, name)
}

pub(crate) fn wml_attr<'a>(tree: &'a XmlTree, node: NodeId, child: &str) -> Option<&'a str> {
    wml(tree, node, child).and_then(|n| tree.attribute(n, Some(WML_NS), "val"))
}

/// Parse a WML boolean toggle element (e.g., w:b, w:i, w:strike).
/// Present with no val or val != "0"/"false" means true.
pub(crate) fn wml_bool(tree: &XmlTree, parent: NodeId, name: &str) -> Option<bool> {
    wml(tree, parent, name).map(|n| {
        tree.attribute(n, Some(WML_NS), "val")
            .is_none_or(|v| v != "0" && v != "false")
    })
}

/// New element in the WordprocessingML namespace, using whatever prefix is
/// bound to it where it will be inserted.
pub(crate) fn new_wml_element(tree: &mut XmlTree, context: NodeId, name: &str) -> NodeId {
    let prefix = tree.lookup_prefix(context, WML_NS);
    tree.create_element(QName::new(Some(WML_NS), prefix.as_deref(), name))
}

/// Flatten SDT wrappers: descend into w:sdtContent and collect effective children.
pub(crate) fn collect_block_nodes(tree: &XmlTree, parent: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    for &child in tree.children(parent) {
        if tree.is(child, WML_NS, "sdt") {
            if let Some(content) = wml(tree, child, "sdtContent") {
                nodes.extend(collect_block_nodes(tree, content));
            }
        } else if tree.element(child).is_some() {
            nodes.push(child);
        }
    }
    nodes
}

/// The zip container, kept as an ordered list of parts so that a rewrite
/// reproduces the original entry order.
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        Self::read(file)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::read(Cursor::new(bytes))
    }

    fn read<R: Read + Seek>(reader: R) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }
        Ok(Package { entries })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn part_text(&self, name: &str) -> Option<String> {
        self.part(name)
            .and_then(|data| String::from_utf8(data.to_vec()).ok())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// Media is stored as-is (it is already compressed); XML parts are deflated.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, Error> {
        let mut zip = zip::ZipWriter::new(writer);
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in &self.entries {
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Writes next to the destination first and renames into place, so a
    /// failed write never leaves a truncated document behind.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("docx.tmp");
        std::fs::write(&tmp, &bytes)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            std::fs::remove_file(&tmp).ok();
            return Err(Error::Io(e));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Relationship {
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

fn parse_rels_xml(xml_content: &str) -> HashMap<String, Relationship> {
    let mut rels = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        log::warn!("Unreadable relationships part, ignoring it");
        return rels;
    };
    for node in xml.root_element().children() {
        if node.tag_name().name() == "Relationship"
            && let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target"))
        {
            rels.insert(
                id.to_string(),
                Relationship {
                    rel_type: node.attribute("Type").unwrap_or("").to_string(),
                    target: target.to_string(),
                    external: node.attribute("TargetMode") == Some("External"),
                },
            );
        }
    }
    rels
}

/// Resolve a relationship target of word/document.xml to a zip entry name.
fn part_path(target: &str) -> String {
    target
        .strip_prefix('/')
        .map(String::from)
        .unwrap_or_else(|| format!("word/{}", target))
}

/// An opened document: the package, the live `word/document.xml` tree and
/// the catalogs needed to interpret it.
pub struct Document {
    package: Package,
    tree: XmlTree,
    body: NodeId,
    styles: StyleCatalog,
    rels: HashMap<String, Relationship>,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, Error> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    pub fn from_package(package: Package) -> Result<Self, Error> {
        let xml_content = package.part_text(DOCUMENT_PART).ok_or_else(|| {
            Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into())
        })?;
        let tree = XmlTree::parse(&xml_content)?;
        let root = tree
            .root_element()
            .ok_or_else(|| Error::InvalidDocx("empty word/document.xml".into()))?;
        let body =
            wml(&tree, root, "body").ok_or_else(|| Error::InvalidDocx("Missing w:body".into()))?;

        let styles = StyleCatalog::parse(&package);
        let rels = package
            .part_text(DOCUMENT_RELS_PART)
            .map(|xml| parse_rels_xml(&xml))
            .unwrap_or_default();

        log::debug!(
            "Opened document: {} part(s), {} style(s), {} relationship(s)",
            package.entries.len(),
            styles.len(),
            rels.len()
        );

        Ok(Document {
            package,
            tree,
            body,
            styles,
            rels,
        })
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn styles(&self) -> &StyleCatalog {
        &self.styles
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Top-level blocks of the body, with block-level content controls flattened.
    pub fn blocks(&self) -> Vec<Block> {
        blocks_of(&self.tree, self.body)
    }

    pub fn tables(&self) -> Vec<Table> {
        self.blocks()
            .into_iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                Block::Paragraph(_) => None,
            })
            .collect()
    }

    /// Every paragraph in document order, descending into table cells
    /// (and tables nested in cells).
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.located_paragraphs()
            .into_iter()
            .map(|(p, _)| p)
            .collect()
    }

    /// Paragraph `index` of [`Document::paragraphs`].
    pub fn paragraph(&self, index: usize) -> Result<Paragraph, Error> {
        let paragraphs = self.paragraphs();
        paragraphs.get(index).copied().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "paragraph {index} out of range: document has {} paragraph(s)",
                paragraphs.len()
            ))
        })
    }

    /// Like [`Document::paragraphs`], paired with whether the paragraph sits in a table.
    pub fn located_paragraphs(&self) -> Vec<(Paragraph, bool)> {
        fn walk(
            tree: &XmlTree,
            blocks: Vec<Block>,
            in_table: bool,
            out: &mut Vec<(Paragraph, bool)>,
        ) {
            for block in blocks {
                match block {
                    Block::Paragraph(p) => out.push((p, in_table)),
                    Block::Table(t) => {
                        for row in t.rows(tree) {
                            for cell in row.cells(tree) {
                                walk(tree, cell.blocks(tree), true, out);
                            }
                        }
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.tree, self.blocks(), false, &mut out);
        out
    }

    /// Display name of the paragraph's style; paragraphs without `w:pStyle`
    /// report the document's default paragraph style.
    pub fn paragraph_style_name(&self, paragraph: Paragraph) -> Option<String> {
        match paragraph.style_id(&self.tree) {
            Some(id) => Some(self.styles.name_of(id).unwrap_or(id).to_string()),
            None => self
                .styles
                .default_paragraph_style()
                .map(|s| s.name.clone()),
        }
    }

    pub fn is_toc_paragraph(&self, paragraph: Paragraph) -> bool {
        let Some(id) = paragraph.style_id(&self.tree) else {
            return false;
        };
        is_toc_style(id) || self.styles.name_of(id).is_some_and(is_toc_style)
    }

    /// Applies a paragraph style looked up by display name (or id).
    pub fn set_paragraph_style(
        &mut self,
        paragraph: Paragraph,
        style_name: &str,
    ) -> Result<(), Error> {
        let style = self
            .styles
            .find_by_name(style_name, StyleKind::Paragraph)
            .ok_or_else(|| Error::StyleNotFound(style_name.to_string()))?;
        let id = style.id.clone();
        paragraph.set_style_id(&mut self.tree, &id);
        Ok(())
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.rels.get(id)
    }

    /// Zip entry name of an internal relationship target.
    pub fn relationship_part(&self, id: &str) -> Option<String> {
        self.rels
            .get(id)
            .filter(|r| !r.external)
            .map(|r| part_path(&r.target))
    }

    /// Zip entry name of the first internal relationship whose type ends in `/kind`.
    pub fn part_for_type(&self, kind: &str) -> Option<String> {
        let suffix = format!("/{kind}");
        let mut matching: Vec<(&String, &Relationship)> = self
            .rels
            .iter()
            .filter(|(_, r)| !r.external && r.rel_type.ends_with(&suffix))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(b.0));
        matching.first().map(|(_, r)| part_path(&r.target))
    }

    /// Serializes the live tree back into the package.
    fn flush(&mut self) -> Result<(), Error> {
        let xml = self.tree.to_xml()?;
        self.package.set_part(DOCUMENT_PART, xml);
        Ok(())
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, Error> {
        self.flush()?;
        self.package.to_bytes()
    }

    pub fn save(&mut self, path: &Path) -> Result<(), Error> {
        self.flush()?;
        self.package.save(path)
    }
}
