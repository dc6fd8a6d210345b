use std::io::Cursor;

use serde::Serialize;

use super::{DML_NS, Document, REL_NS, WML_NS, WPD_NS};
use crate::error::Error;
use crate::model::{Alignment, Paragraph};
use crate::xml::{NodeId, XmlTree};

pub const EMU_PER_INCH: f64 = 914400.0;

#[derive(Clone, Debug, Serialize)]
pub struct Picture {
    pub index: usize,
    /// `inline` or `anchor`.
    pub placement: String,
    pub width_emu: i64,
    pub height_emu: i64,
    pub width_inches: f64,
    pub height_inches: f64,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Media part the picture's blip points at.
    pub target: Option<String>,
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
    pub format: Option<String>,
    pub paragraph_index: usize,
    pub alignment: Option<String>,
}

/// A `wp:inline` or `wp:anchor` container and the paragraph holding it.
struct Located {
    container: NodeId,
    paragraph: Paragraph,
    paragraph_index: usize,
}

fn locate_drawings(doc: &Document) -> Vec<Located> {
    let tree = doc.tree();
    let mut found = Vec::new();
    for (paragraph_index, (paragraph, _)) in doc.located_paragraphs().into_iter().enumerate() {
        for node in tree.descendants(paragraph.node()) {
            if !tree.is(node, WML_NS, "drawing") {
                continue;
            }
            for &container in tree.children(node) {
                if tree.is(container, WPD_NS, "inline") || tree.is(container, WPD_NS, "anchor") {
                    found.push(Located {
                        container,
                        paragraph,
                        paragraph_index,
                    });
                }
            }
        }
    }
    found
}

fn locate(doc: &Document, index: usize) -> Result<Located, Error> {
    let mut drawings = locate_drawings(doc);
    let count = drawings.len();
    if index >= count {
        return Err(Error::PictureNotFound { index, count });
    }
    Ok(drawings.swap_remove(index))
}

fn emu_attr(tree: &XmlTree, node: Option<NodeId>, name: &str) -> i64 {
    node.and_then(|n| tree.attribute(n, None, name))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn find_descendant(tree: &XmlTree, node: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
    tree.descendants(node)
        .into_iter()
        .find(|&n| tree.is(n, namespace, local))
}

/// Pixel size and format of an embedded image, if `image` can make sense of it.
fn read_pixel_size(data: &[u8]) -> Option<(u32, u32, String)> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;
    let format = reader.format()?;
    let name = format
        .extensions_str()
        .first()
        .map_or_else(|| format!("{format:?}").to_lowercase(), |ext| ext.to_string());
    let (width, height) = reader.into_dimensions().ok()?;
    Some((width, height, name))
}

fn describe(doc: &Document, index: usize, located: &Located) -> Picture {
    let tree = doc.tree();
    let container = located.container;
    let extent = tree.child(container, WPD_NS, "extent");
    let width_emu = emu_attr(tree, extent, "cx");
    let height_emu = emu_attr(tree, extent, "cy");
    let doc_pr = tree.child(container, WPD_NS, "docPr");
    let doc_pr_attr = |name: &str| {
        doc_pr
            .and_then(|n| tree.attribute(n, None, name))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let target = find_descendant(tree, container, DML_NS, "blip")
        .and_then(|blip| tree.attribute(blip, Some(REL_NS), "embed"))
        .and_then(|id| doc.relationship_part(id));
    let pixels = target
        .as_deref()
        .and_then(|t| doc.package().part(t))
        .and_then(read_pixel_size);

    Picture {
        index,
        placement: if tree.is(container, WPD_NS, "anchor") {
            "anchor".into()
        } else {
            "inline".into()
        },
        width_emu,
        height_emu,
        width_inches: width_emu as f64 / EMU_PER_INCH,
        height_inches: height_emu as f64 / EMU_PER_INCH,
        name: doc_pr_attr("name"),
        description: doc_pr_attr("descr"),
        target,
        pixel_width: pixels.as_ref().map(|p| p.0),
        pixel_height: pixels.as_ref().map(|p| p.1),
        format: pixels.map(|p| p.2),
        paragraph_index: located.paragraph_index,
        alignment: located
            .paragraph
            .alignment(tree)
            .map(|a| a.as_jc().to_string()),
    }
}

/// Every drawing in the document, in document order, table cells included.
pub fn list_pictures(doc: &Document) -> Vec<Picture> {
    locate_drawings(doc)
        .iter()
        .enumerate()
        .map(|(i, located)| describe(doc, i, located))
        .collect()
}

fn check_size(width: Option<f64>, height: Option<f64>) -> Result<(), Error> {
    if width.is_none() && height.is_none() {
        return Err(Error::InvalidArgument(
            "at least one of width or height must be given".into(),
        ));
    }
    if width.into_iter().chain(height).any(|v| !v.is_finite() || v <= 0.0) {
        return Err(Error::InvalidArgument(
            "width and height must be positive".into(),
        ));
    }
    Ok(())
}

/// Resizes a picture to the given size in inches.
///
/// With `keep_aspect` and only one dimension given, the other follows the
/// picture's current aspect ratio; otherwise a missing dimension is kept.
pub fn resize_picture(
    doc: &mut Document,
    index: usize,
    width: Option<f64>,
    height: Option<f64>,
    keep_aspect: bool,
) -> Result<Picture, Error> {
    check_size(width, height)?;

    let located = locate(doc, index)?;
    let tree = doc.tree_mut();
    let extent = tree.child(located.container, WPD_NS, "extent").ok_or_else(|| {
        Error::InvalidDocx(format!("picture {index} has no size information"))
    })?;
    let cur_w = emu_attr(tree, Some(extent), "cx") as f64 / EMU_PER_INCH;
    let cur_h = emu_attr(tree, Some(extent), "cy") as f64 / EMU_PER_INCH;

    let (new_w, new_h) = match (width, height) {
        (Some(w), None) if keep_aspect && cur_w > 0.0 => (w, w * cur_h / cur_w),
        (None, Some(h)) if keep_aspect && cur_h > 0.0 => (h * cur_w / cur_h, h),
        (w, h) => (w.unwrap_or(cur_w), h.unwrap_or(cur_h)),
    };
    let cx = ((new_w * EMU_PER_INCH).round() as i64).to_string();
    let cy = ((new_h * EMU_PER_INCH).round() as i64).to_string();

    tree.set_attribute(extent, None, "cx", &cx);
    tree.set_attribute(extent, None, "cy", &cy);
    if let Some(ext) = find_descendant(tree, located.container, DML_NS, "xfrm")
        .and_then(|xfrm| tree.child(xfrm, DML_NS, "ext"))
    {
        tree.set_attribute(ext, None, "cx", &cx);
        tree.set_attribute(ext, None, "cy", &cy);
    }

    log::info!(
        "Resized picture {index} from {cur_w:.2}\"x{cur_h:.2}\" to {new_w:.2}\"x{new_h:.2}\""
    );
    Ok(describe(doc, index, &located))
}

/// Aligns a picture by setting the justification of its paragraph.
pub fn align_picture(doc: &mut Document, index: usize, alignment: Alignment) -> Result<(), Error> {
    let located = locate(doc, index)?;
    located.paragraph.set_alignment(doc.tree_mut(), alignment)?;
    log::info!("Aligned picture {index} ({})", alignment.as_jc());
    Ok(())
}

/// Outcome for one picture of a batch operation.
#[derive(Clone, Debug, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub success: bool,
    pub error: Option<String>,
}

impl BatchItem {
    fn from_result<T>(index: usize, result: Result<T, Error>) -> BatchItem {
        match result {
            Ok(_) => BatchItem {
                index,
                success: true,
                error: None,
            },
            Err(e) => BatchItem {
                index,
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

fn require_indices(indices: &[usize]) -> Result<(), Error> {
    if indices.is_empty() {
        return Err(Error::InvalidArgument("picture index list is empty".into()));
    }
    Ok(())
}

fn log_batch(action: &str, items: &[BatchItem]) {
    let failed = items.iter().filter(|i| !i.success).count();
    log::info!(
        "{action} {} of {} picture(s), {failed} failed",
        items.len() - failed,
        items.len()
    );
}

fn align_each(doc: &mut Document, indices: &[usize], alignment: Alignment) -> Vec<BatchItem> {
    let items: Vec<BatchItem> = indices
        .iter()
        .map(|&i| BatchItem::from_result(i, align_picture(doc, i, alignment)))
        .collect();
    log_batch("Aligned", &items);
    items
}

fn resize_each(
    doc: &mut Document,
    indices: &[usize],
    width: Option<f64>,
    height: Option<f64>,
    keep_aspect: bool,
) -> Vec<BatchItem> {
    let items: Vec<BatchItem> = indices
        .iter()
        .map(|&i| {
            BatchItem::from_result(i, resize_picture(doc, i, width, height, keep_aspect))
        })
        .collect();
    log_batch("Resized", &items);
    items
}

/// Aligns each listed picture. A bad index fails that item only.
pub fn align_pictures(
    doc: &mut Document,
    indices: &[usize],
    alignment: Alignment,
) -> Result<Vec<BatchItem>, Error> {
    require_indices(indices)?;
    Ok(align_each(doc, indices, alignment))
}

/// Aligns every picture in the document; empty when there are none.
pub fn align_all_pictures(doc: &mut Document, alignment: Alignment) -> Vec<BatchItem> {
    let indices: Vec<usize> = (0..locate_drawings(doc).len()).collect();
    align_each(doc, &indices, alignment)
}

/// Resizes each listed picture the way [`resize_picture`] does. The size
/// arguments are checked once, up front; a bad index fails that item only.
pub fn resize_pictures(
    doc: &mut Document,
    indices: &[usize],
    width: Option<f64>,
    height: Option<f64>,
    keep_aspect: bool,
) -> Result<Vec<BatchItem>, Error> {
    require_indices(indices)?;
    check_size(width, height)?;
    Ok(resize_each(doc, indices, width, height, keep_aspect))
}

/// Resizes every picture in the document; empty when there are none.
pub fn resize_all_pictures(
    doc: &mut Document,
    width: Option<f64>,
    height: Option<f64>,
    keep_aspect: bool,
) -> Result<Vec<BatchItem>, Error> {
    check_size(width, height)?;
    let indices: Vec<usize> = (0..locate_drawings(doc).len()).collect();
    Ok(resize_each(doc, &indices, width, height, keep_aspect))
}

/// Inclusive bounds in inches; an unset bound does not filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeFilter {
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
}

impl SizeFilter {
    pub fn matches(&self, picture: &Picture) -> bool {
        let (w, h) = (picture.width_inches, picture.height_inches);
        self.min_width.is_none_or(|min| w >= min)
            && self.max_width.is_none_or(|max| w <= max)
            && self.min_height.is_none_or(|min| h >= min)
            && self.max_height.is_none_or(|max| h <= max)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SizeBatch {
    pub matched: Vec<usize>,
    pub aligned: Vec<BatchItem>,
    pub resized: Vec<BatchItem>,
}

/// Aligns and/or resizes the pictures whose current size passes `filter`.
/// Resizing keeps the aspect ratio. With neither action given only the
/// matching indices are reported.
pub fn process_pictures_by_size(
    doc: &mut Document,
    filter: &SizeFilter,
    alignment: Option<Alignment>,
    width: Option<f64>,
    height: Option<f64>,
) -> Result<SizeBatch, Error> {
    let resize = width.is_some() || height.is_some();
    if resize {
        check_size(width, height)?;
    }
    let matched: Vec<usize> = list_pictures(doc)
        .iter()
        .filter(|p| filter.matches(p))
        .map(|p| p.index)
        .collect();
    log::debug!("{} picture(s) match {:?}", matched.len(), filter);

    let mut batch = SizeBatch {
        matched,
        ..SizeBatch::default()
    };
    if batch.matched.is_empty() {
        return Ok(batch);
    }
    if let Some(alignment) = alignment {
        batch.aligned = align_each(doc, &batch.matched, alignment);
    }
    if resize {
        batch.resized = resize_each(doc, &batch.matched, width, height, true);
    }
    Ok(batch)
}
