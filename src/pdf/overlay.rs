//! Page number overlay
//!
//! Numbers are drawn in a Form XObject appended to each song page. The page's
//! own content streams are left alone; only a Do invocation is appended and
//! the XObject is registered in the page resources.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use crate::config::PageNumbering;
use crate::error::Result;
use crate::layout::PageDimensions;
use crate::pdf::font::{helvetica_font, IndexFont};

/// Resource name of the overlay XObject
const XOBJECT_NAME: &str = "PageNumber";

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, PartialEq)]
struct TransformMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl TransformMatrix {
    fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    /// Inverse of this matrix; singular matrices give the identity
    fn inverse(&self) -> Self {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-10 {
            return Self::identity();
        }

        Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        }
    }

    fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 0.001
            && self.b.abs() < 0.001
            && self.c.abs() < 0.001
            && (self.d - 1.0).abs() < 0.001
            && self.e.abs() < 0.001
            && self.f.abs() < 0.001
    }

    fn to_array(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.a),
            Object::Real(self.b),
            Object::Real(self.c),
            Object::Real(self.d),
            Object::Real(self.e),
            Object::Real(self.f),
        ])
    }
}

/// Visible area of a page in default user space
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Stamp running page numbers on every page after the first `index_pages`
///
/// The first page after the indexes is numbered 1. Returns the number of
/// pages stamped.
pub fn stamp(doc: &mut Document, index_pages: usize, numbering: &PageNumbering) -> Result<usize> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if pages.len() <= index_pages {
        return Ok(0);
    }

    let font_id = helvetica_font(doc);
    let metrics = IndexFont::helvetica();

    for (i, &page_id) in pages.iter().enumerate().skip(index_pages) {
        let number = i - index_pages + 1;
        let bounds = page_box(doc, page_id);

        let content = page_number_content(number, &bounds, numbering, &metrics);
        let transform = detect_page_transformation(doc, page_id)?;
        let xobject_id =
            create_form_xobject_with_transform(doc, content, font_id, &transform, &bounds);

        add_xobject_to_page_resources(doc, page_id, xobject_id)?;

        let invoke_content = format!("q\n/{} Do\nQ\n", XOBJECT_NAME);
        let content_stream_id =
            doc.add_object(Stream::new(Dictionary::new(), invoke_content.into_bytes()));
        append_content_to_page(doc, page_id, content_stream_id)?;
    }

    let stamped = pages.len() - index_pages;
    log::info!("Numbered {} song pages", stamped);
    Ok(stamped)
}

/// Content stream drawing `number` at the configured edges
fn page_number_content(
    number: usize,
    page_box: &PageBox,
    numbering: &PageNumbering,
    metrics: &IndexFont,
) -> String {
    let text = number.to_string();
    let size = numbering.font_size;
    let side = numbering.side_offset.pt() as f32;
    let y = page_box.y + numbering.bottom_offset.pt() as f32;

    let mut xs = Vec::with_capacity(2);
    if numbering.position.includes_leading() {
        xs.push(page_box.x + side);
    }
    if numbering.position.includes_trailing() {
        xs.push(page_box.x + page_box.width - side - metrics.text_width(&text, size));
    }

    let mut content = String::from("0 g\n");
    for x in xs {
        content.push_str("BT\n");
        content.push_str(&format!("/F1 {} Tf\n", size));
        content.push_str(&format!("1 0 0 1 {} {} Tm\n", x, y));
        content.push_str(&format!("({}) Tj\n", text));
        content.push_str("ET\n");
    }
    content
}

/// Origin and size of a page from its MediaBox
fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let media_box = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"MediaBox").ok())
        .and_then(|media_box| match media_box {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .and_then(|media_box| media_box.as_array().ok())
        .and_then(|values| {
            let values: Vec<f32> = values.iter().filter_map(|v| v.as_float().ok()).collect();
            (values.len() == 4).then(|| PageBox {
                x: values[0].min(values[2]),
                y: values[1].min(values[3]),
                width: (values[2] - values[0]).abs(),
                height: (values[3] - values[1]).abs(),
            })
        });

    media_box.unwrap_or_else(|| {
        let [x, y, width, height] = PageDimensions::a4().media_box();
        PageBox { x, y, width, height }
    })
}

/// Transformation matrix set at the start of a page's first content stream
///
/// Returns the identity when there is none.
fn detect_page_transformation(doc: &Document, page_id: ObjectId) -> Result<TransformMatrix> {
    let page = doc.get_dictionary(page_id)?;

    let content_ids: Vec<ObjectId> = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![*id],
        Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => vec![],
    };

    if let Some(content_id) = content_ids.first() {
        if let Ok(Object::Stream(stream)) = doc.get_object(*content_id) {
            let bytes = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            return Ok(parse_initial_transformation(&String::from_utf8_lossy(&bytes)));
        }
    }

    Ok(TransformMatrix::identity())
}

/// Parse the `cm` matrix at the start of a content stream
///
/// A matrix set inside `q` is restored before the appended overlay runs, so
/// only an unwrapped one (`.24 0 0 -.24 0 792 cm`) is returned.
fn parse_initial_transformation(content: &str) -> TransformMatrix {
    let content = content.trim();

    if let Some(cm_pos) = content.find(" cm") {
        let parts: Vec<&str> = content[..cm_pos].split_whitespace().collect();

        if parts.len() >= 6 {
            let start = parts.len() - 6;

            let has_q_before = parts[..start].iter().any(|&p| p == "q");
            if has_q_before || content.starts_with("q ") || content.starts_with("q\n") {
                return TransformMatrix::identity();
            }

            let nums: Vec<f32> = parts[start..]
                .iter()
                .filter_map(|s| s.parse::<f32>().ok())
                .collect();

            if let [a, b, c, d, e, f] = nums[..] {
                return TransformMatrix { a, b, c, d, e, f };
            }
        }
    }

    TransformMatrix::identity()
}

/// Form XObject holding `content`, with the inverse of the page transform
fn create_form_xobject_with_transform(
    doc: &mut Document,
    content: String,
    font_id: ObjectId,
    page_transform: &TransformMatrix,
    page_box: &PageBox,
) -> ObjectId {
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));
    xobject_dict.set(
        "BBox",
        Object::Array(vec![
            Object::Real(page_box.x),
            Object::Real(page_box.y),
            Object::Real(page_box.x + page_box.width),
            Object::Real(page_box.y + page_box.height),
        ]),
    );

    // The page CTM is still in effect when Do runs
    let matrix = if page_transform.is_identity() {
        TransformMatrix::identity()
    } else {
        page_transform.inverse()
    };
    xobject_dict.set("Matrix", matrix.to_array());
    xobject_dict.set("Resources", Object::Dictionary(resources));

    doc.add_object(Object::Stream(Stream::new(xobject_dict, content.into_bytes())))
}

/// Register the overlay XObject in the page's own Resources
fn add_xobject_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<()> {
    let mut resources = match doc.get_dictionary(page_id)?.get(b"Resources") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };

    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(xo)) => xo.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };
    xobjects.set(XOBJECT_NAME, Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    // Shared resource dictionaries stay untouched; the page gets its own copy
    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));

    Ok(())
}

/// Append a content stream so it is drawn on top of the page
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let page = doc.get_dictionary_mut(page_id)?;

    let contents = match page.get(b"Contents").ok().cloned() {
        Some(Object::Reference(content_id)) => {
            vec![Object::Reference(content_id), Object::Reference(new_content_id)]
        }
        Some(Object::Array(mut content_array)) => {
            content_array.push(Object::Reference(new_content_id));
            content_array
        }
        _ => vec![Object::Reference(new_content_id)],
    };
    page.set("Contents", Object::Array(contents));

    Ok(())
}
