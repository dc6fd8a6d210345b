//! Owned, mutable XML tree.
//!
//! `roxmltree` only gives a borrowed, read-only view of a document, while
//! rewriting runs needs to insert, clone and detach nodes. A parsed part is
//! therefore copied once into this arena. A `NodeId` stays valid for the life
//! of the tree: detaching a node keeps its slot, it just stops being reachable
//! from the root.

use std::io::Write as _;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::Error;

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, prefix: Option<&str>, local: &str) -> Self {
        QName {
            namespace: namespace.map(str::to_string),
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Clone, Debug)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    /// Namespace declarations made on this element: (prefix, uri).
    pub namespaces: Vec<(Option<String>, String)>,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Root,
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        value: Option<String>,
    },
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct XmlTree {
    nodes: Vec<NodeData>,
}

impl XmlTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn parse(text: &str) -> Result<Self, Error> {
        let doc = roxmltree::Document::parse(text)?;
        let mut tree = XmlTree {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        };
        for child in doc.root().children() {
            tree.import(child, Self::ROOT);
        }
        Ok(tree)
    }

    fn import(&mut self, node: roxmltree::Node, parent: NodeId) {
        let kind = match node.node_type() {
            roxmltree::NodeType::Root => return,
            roxmltree::NodeType::Element => NodeKind::Element(import_element(node)),
            roxmltree::NodeType::Text => NodeKind::Text(node.text().unwrap_or("").to_string()),
            roxmltree::NodeType::Comment => {
                NodeKind::Comment(node.text().unwrap_or("").to_string())
            }
            roxmltree::NodeType::PI => {
                let Some(pi) = node.pi() else {
                    return;
                };
                NodeKind::ProcessingInstruction {
                    target: pi.target.to_string(),
                    value: pi.value.map(str::to_string),
                }
            }
        };
        let id = self.push(kind);
        self.append_child(parent, id);
        for child in node.children() {
            self.import(child, id);
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::ROOT)
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// True when the node can still be reached from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == Self::ROOT
    }

    pub fn is(&self, id: NodeId, namespace: &str, local: &str) -> bool {
        self.element(id).is_some_and(|el| el.name.is(namespace, local))
    }

    pub fn child(&self, id: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.is(c, namespace, local))
    }

    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.is(c, namespace, local))
    }

    /// All nodes below `id` in document (pre-)order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn attribute(&self, id: NodeId, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|a| a.name.local == local && a.name.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, id: NodeId, namespace: Option<&str>, local: &str, value: &str) {
        let prefix = namespace.and_then(|ns| self.lookup_prefix(id, ns));
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if let Some(attr) = el
            .attributes
            .iter_mut()
            .find(|a| a.name.local == local && a.name.namespace.as_deref() == namespace)
        {
            attr.value = value.to_string();
            return;
        }
        el.attributes.push(Attribute {
            name: QName::new(namespace, prefix.as_deref(), local),
            value: value.to_string(),
        });
    }

    /// Finds the prefix bound to `namespace` in scope at `id`.
    pub fn lookup_prefix(&self, id: NodeId, namespace: &str) -> Option<String> {
        if namespace == XML_NS {
            return Some("xml".to_string());
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(el) = self.element(node) {
                if let Some((prefix, _)) = el.namespaces.iter().find(|(_, uri)| uri == namespace) {
                    return prefix.clone();
                }
            }
            current = self.parent(node);
        }
        None
    }

    /// Content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.push(NodeKind::Element(Element {
            name,
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), Error> {
        self.insert_sibling(anchor, node, 0)
    }

    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<(), Error> {
        self.insert_sibling(anchor, node, 1)
    }

    fn insert_sibling(&mut self, anchor: NodeId, node: NodeId, offset: usize) -> Result<(), Error> {
        if anchor == node {
            return Err(Error::StructuralInconsistency(
                "cannot insert a node next to itself".into(),
            ));
        }
        self.detach(node);
        let parent = self.parent(anchor).ok_or_else(|| {
            Error::StructuralInconsistency("anchor node has no parent".into())
        })?;
        let pos = self
            .position_in_parent(anchor)
            .ok_or_else(|| Error::StructuralInconsistency("anchor missing from parent".into()))?;
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos + offset, node);
        Ok(())
    }

    fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Removes the node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
    }

    /// Detached copy of a single element with its attributes but no children.
    pub fn shallow_copy(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        self.push(kind)
    }

    /// Detached copy of a whole subtree.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let copy = self.shallow_copy(id);
        for child in self.children(id).to_vec() {
            let child_copy = self.deep_copy(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    pub fn to_xml(&self) -> Result<Vec<u8>, Error> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(write_error)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped("\r\n")))
            .map_err(write_error)?;
        for &child in self.children(Self::ROOT) {
            self.write_node(&mut writer, child)?;
        }
        Ok(writer.into_inner())
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), Error> {
        match self.kind(id) {
            NodeKind::Root => Ok(()),
            NodeKind::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error),
            NodeKind::Comment(text) => writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(write_error),
            NodeKind::ProcessingInstruction { target, value } => {
                let raw = match value {
                    Some(v) => format!("<?{target} {v}?>"),
                    None => format!("<?{target}?>"),
                };
                writer
                    .get_mut()
                    .write_all(raw.as_bytes())
                    .map_err(|e| Error::Write(e.to_string()))
            }
            NodeKind::Element(el) => {
                let name = el.name.qualified();
                let mut start = BytesStart::new(name.as_str());
                for (prefix, uri) in &el.namespaces {
                    let key = match prefix {
                        Some(p) => format!("xmlns:{p}"),
                        None => "xmlns".to_string(),
                    };
                    start.push_attribute((key.as_str(), uri.as_str()));
                }
                for attr in &el.attributes {
                    let key = attr.name.qualified();
                    start.push_attribute((key.as_str(), attr.value.as_str()));
                }
                let children = self.children(id);
                if children.is_empty() {
                    return writer.write_event(Event::Empty(start)).map_err(write_error);
                }
                writer.write_event(Event::Start(start)).map_err(write_error)?;
                for &child in children {
                    self.write_node(writer, child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(name.as_str())))
                    .map_err(write_error)
            }
        }
    }
}

fn write_error(e: impl std::fmt::Display) -> Error {
    Error::Write(e.to_string())
}

fn prefix_for(node: roxmltree::Node, namespace: &str) -> Option<String> {
    if namespace == XML_NS {
        return Some("xml".to_string());
    }
    // the default namespace comes back as an empty prefix
    node.lookup_prefix(namespace)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

fn import_element(node: roxmltree::Node) -> Element {
    let tag = node.tag_name();
    let name = QName {
        namespace: tag.namespace().map(str::to_string),
        prefix: tag.namespace().and_then(|ns| prefix_for(node, ns)),
        local: tag.name().to_string(),
    };

    // roxmltree reports every namespace in scope; keep only the ones this
    // element introduces so the output declares them in the same place.
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    let namespaces = node
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect();

    let attributes = node
        .attributes()
        .map(|a| Attribute {
            name: QName {
                namespace: a.namespace().map(str::to_string),
                prefix: a.namespace().and_then(|ns| prefix_for(node, ns)),
                local: a.name().to_string(),
            },
            value: a.value().to_string(),
        })
        .collect();

    Element {
        name,
        attributes,
        namespaces,
    }
}
