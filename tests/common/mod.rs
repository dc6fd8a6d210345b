#![allow(dead_code)]

use std::io::{Cursor, Write};

use docx_rewrite::Document;
use docx_rewrite::model::{Paragraph, Run};
use docx_rewrite::xml::{NodeId, NodeKind, XmlTree};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="TOC1"><w:name w:val="toc 1"/><w:basedOn w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Contents"><w:name w:val="TOC Entry"/></w:style>
  <w:style w:type="paragraph" w:styleId="TOCHeading"><w:name w:val="TOC Heading"/></w:style>
  <w:style w:type="paragraph" w:styleId="Tocata"><w:name w:val="Tocata"/></w:style>
  <w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style>
</w:styles>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `<w:r>` holding `text`, tabs written as `<w:tab/>`.
pub fn run(text: &str) -> String {
    format!("<w:r>{}</w:r>", run_content(text))
}

pub fn bold_run(text: &str) -> String {
    format!("<w:r><w:rPr><w:b/></w:rPr>{}</w:r>", run_content(text))
}

pub fn italic_run(text: &str) -> String {
    format!("<w:r><w:rPr><w:i/></w:rPr>{}</w:r>", run_content(text))
}

fn run_content(text: &str) -> String {
    text.split('\t')
        .map(|segment| {
            if segment.is_empty() {
                String::new()
            } else {
                format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(segment))
            }
        })
        .collect::<Vec<_>>()
        .join("<w:tab/>")
}

pub fn paragraph(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

pub fn styled_paragraph(style_id: &str, runs: &[String]) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{style_id}"/></w:pPr>{}</w:p>"#,
        runs.concat()
    )
}

/// Single-cell-per-entry table, rows given as cell texts.
pub fn table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in row.iter() {
            xml.push_str(&format!("<w:tc>{}</w:tc>", paragraph(&[run(cell)])));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    )
}

/// In-memory DOCX package for tests.
pub struct DocxBuilder {
    body: String,
    styles: Option<String>,
    rels: Vec<(String, String, String)>,
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new(body: &str) -> Self {
        DocxBuilder {
            body: body.to_string(),
            styles: Some(STYLES_XML.to_string()),
            rels: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn without_styles(mut self) -> Self {
        self.styles = None;
        self
    }

    /// Adds a relationship from `word/document.xml`; `kind` is the last
    /// segment of the relationship type (`image`, `comments`, ...).
    pub fn relationship(mut self, id: &str, kind: &str, target: &str) -> Self {
        self.rels.push((
            id.to_string(),
            format!("{REL_TYPE_BASE}/{kind}"),
            target.to_string(),
        ));
        self
    }

    pub fn part(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.parts.push((name.to_string(), data.into()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let mut write = |name: &str, data: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        write(
            "[Content_Types].xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        );
        write(
            "_rels/.rels",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
        );
        write("word/document.xml", document_xml(&self.body).as_bytes());
        if let Some(styles) = &self.styles {
            write("word/styles.xml", styles.as_bytes());
        }

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        if self.styles.is_some() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdStyles" Type="{REL_TYPE_BASE}/styles" Target="styles.xml"/>"#
            ));
        }
        for (id, rel_type, target) in &self.rels {
            rels.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{rel_type}" Target="{target}"/>"#
            ));
        }
        rels.push_str("</Relationships>");
        write("word/_rels/document.xml.rels", rels.as_bytes());

        for (name, data) in &self.parts {
            write(name, data);
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn open(self) -> Document {
        Document::from_bytes(&self.build()).expect("test document should open")
    }
}

pub fn open_body(body: &str) -> Document {
    DocxBuilder::new(body).open()
}

/// Serializes and re-opens the document, so assertions see what a reader
/// of the saved file would see.
pub fn reopen(doc: &mut Document) -> Document {
    let bytes = doc.to_bytes().expect("document should serialize");
    Document::from_bytes(&bytes).expect("serialized document should reopen")
}

pub fn paragraph_texts(doc: &Document) -> Vec<String> {
    doc.paragraphs()
        .into_iter()
        .map(|p| p.text(doc.tree()))
        .collect()
}

/// (text, bold) of each direct run of a paragraph.
pub fn runs_of(doc: &Document, paragraph: Paragraph) -> Vec<(String, bool)> {
    paragraph
        .runs(doc.tree())
        .into_iter()
        .map(|r| (r.text(doc.tree()), r.is_bold(doc.tree())))
        .collect()
}

/// Children of a run other than `w:rPr`: `t:<text>` for text, the local
/// name for anything else.
pub fn layout(tree: &XmlTree, run: Run) -> Vec<String> {
    tree.children(run.node())
        .iter()
        .filter_map(|&c| tree.element(c).map(|el| (c, el)))
        .filter(|(_, el)| el.name.local != "rPr")
        .map(|(c, el)| {
            if el.name.local == "t" {
                format!("t:{}", tree.text_content(c))
            } else {
                el.name.local.clone()
            }
        })
        .collect()
}

/// Markup of a subtree: names, attributes and text in order.
pub fn markup(tree: &XmlTree, node: NodeId) -> String {
    match tree.kind(node) {
        NodeKind::Element(el) => {
            let mut out = format!("<{}", el.name.qualified());
            for attr in &el.attributes {
                out.push_str(&format!(" {}=\"{}\"", attr.name.qualified(), attr.value));
            }
            out.push('>');
            for &child in tree.children(node) {
                out.push_str(&markup(tree, child));
            }
            out.push_str(&format!("</{}>", el.name.qualified()));
            out
        }
        NodeKind::Text(text) => text.clone(),
        _ => String::new(),
    }
}

pub fn first_paragraph(doc: &Document) -> Paragraph {
    doc.paragraphs()[0]
}

/// A small PNG of the given pixel size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png should encode");
    out.into_inner()
}

/// Inline picture referencing relationship `rel_id`, sized in EMU.
pub fn inline_picture(rel_id: &str, cx: i64, cy: i64, name: &str) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="1" name="{name}" descr="{name} description"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:blipFill><a:blip r:embed="{rel_id}"/></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

pub fn anchored_picture(rel_id: &str, cx: i64, cy: i64) -> String {
    format!(
        r#"<w:r><w:drawing><wp:anchor><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="2" name="Floating"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:blipFill><a:blip r:embed="{rel_id}"/></pic:blipFill><pic:spPr><a:xfrm><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:anchor></w:drawing></w:r>"#
    )
}
