//! Clickable index rows

use std::collections::BTreeMap;
use lopdf::{dictionary, Document, Object, ObjectId};
use crate::error::Result;
use crate::index::render::RenderedIndex;
use crate::pdf::font::IndexFont;

/// Horizontal slack around the page number
const LINK_PADDING: f32 = 2.0;

/// A link rectangle on an index page
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPlacement {
    /// 1-based page carrying the link
    pub source_page: usize,
    /// [x1 y1 x2 y2] in default user space
    pub rect: [f32; 4],
    /// 1-based page the link jumps to
    pub dest_page: usize,
}

/// Link rectangles for every row of an index that starts at `index_start`
///
/// Each rectangle covers the printed page number from descender to ascender
/// on the row's baseline.
pub fn plan(
    index_start: usize,
    rendered: &RenderedIndex,
    font: &IndexFont,
    font_size: f32,
) -> Vec<LinkPlacement> {
    rendered
        .rows
        .iter()
        .map(|row| LinkPlacement {
            source_page: index_start + row.page,
            rect: [
                row.number_x - LINK_PADDING,
                row.baseline + font.descent(font_size),
                row.number_x + row.number_width + LINK_PADDING,
                row.baseline + font.ascent(font_size),
            ],
            dest_page: row.target_page,
        })
        .collect()
}

/// Add Link annotations to `doc`; returns how many were added
///
/// Links whose source or destination page does not exist are skipped with a
/// warning.
pub fn apply(doc: &mut Document, links: &[LinkPlacement]) -> Result<usize> {
    let pages: BTreeMap<u32, ObjectId> = doc.get_pages();
    let page_id = |n: usize| u32::try_from(n).ok().and_then(|n| pages.get(&n)).copied();

    let mut by_page: BTreeMap<ObjectId, Vec<Object>> = BTreeMap::new();

    for link in links {
        let (Some(source_id), Some(dest_id)) = (page_id(link.source_page), page_id(link.dest_page))
        else {
            log::warn!(
                "Skipping link on page {} to page {}: the document has {} pages",
                link.source_page,
                link.dest_page,
                pages.len()
            );
            continue;
        };

        let dest = vec![Object::Reference(dest_id), "Fit".into()];
        let action = dictionary! { "Type" => "Action", "S" => "GoTo", "D" => dest };
        let rect: Vec<Object> = link.rect.iter().map(|&v| Object::Real(v)).collect();
        let annot = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => rect,
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "A" => action,
        };
        let annot_id = doc.add_object(annot);
        by_page.entry(source_id).or_default().push(annot_id.into());
    }

    let mut added = 0;
    for (page_id, annots) in by_page {
        added += annots.len();

        let existing = match doc.get_dictionary(page_id)?.get(b"Annots") {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Reference(id)) => doc
                .get_object(*id)
                .and_then(Object::as_array)
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let mut all = existing;
        all.extend(annots);
        doc.get_dictionary_mut(page_id)?.set("Annots", Object::Array(all));
    }

    log::info!("Added {} index links", added);
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::render::RowPlacement;
    use crate::pdf::assemble::tests::inherited_pages;

    fn row(page: usize, slot: usize, target_page: usize) -> RowPlacement {
        RowPlacement {
            page,
            slot,
            entry: slot,
            baseline: 700.0 - slot as f32 * 28.0,
            target_page,
            number_x: 540.0,
            number_width: 8.0,
        }
    }

    fn annotations(doc: &Document, page: u32) -> Vec<ObjectId> {
        let pages = doc.get_pages();
        let page = doc.get_dictionary(pages[&page]).unwrap();
        match page.get(b"Annots") {
            Ok(Object::Array(arr)) => arr.iter().map(|o| o.as_reference().unwrap()).collect(),
            _ => Vec::new(),
        }
    }

    fn destination(doc: &Document, annot_id: ObjectId) -> ObjectId {
        let annot = doc.get_dictionary(annot_id).unwrap();
        let action = annot.get(b"A").unwrap().as_dict().unwrap();
        let dest = action.get(b"D").unwrap().as_array().unwrap();
        assert_eq!(dest[1].as_name().unwrap(), b"Fit");
        dest[0].as_reference().unwrap()
    }

    #[test]
    fn test_plan_covers_page_number() {
        let rendered = RenderedIndex {
            pages: vec![Vec::new(), Vec::new()],
            rows: vec![row(0, 0, 3), row(1, 2, 4)],
        };
        let font = IndexFont::helvetica();

        let links = plan(1, &rendered, &font, 14.0);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].source_page, 1);
        assert_eq!(links[0].dest_page, 3);
        assert_eq!(links[1].source_page, 2);

        let [x1, y1, x2, y2] = links[1].rect;
        assert!(x1 < 540.0 && x2 > 548.0);
        assert!(y1 < rendered.rows[1].baseline && y2 > rendered.rows[1].baseline);
    }

    #[test]
    fn test_apply_points_at_destination_pages() {
        let mut doc = inherited_pages(4, 595);
        let links = vec![
            LinkPlacement { source_page: 1, rect: [0.0, 0.0, 10.0, 10.0], dest_page: 2 },
            LinkPlacement { source_page: 1, rect: [0.0, 20.0, 10.0, 30.0], dest_page: 4 },
        ];

        assert_eq!(apply(&mut doc, &links).unwrap(), 2);

        let pages = doc.get_pages();
        let annots = annotations(&doc, 1);
        assert_eq!(annots.len(), 2);
        assert_eq!(destination(&doc, annots[0]), pages[&2]);
        assert_eq!(destination(&doc, annots[1]), pages[&4]);
        assert!(annotations(&doc, 2).is_empty());
    }

    #[test]
    fn test_apply_skips_out_of_range_destination() {
        let mut doc = inherited_pages(2, 595);
        let links = vec![
            LinkPlacement { source_page: 1, rect: [0.0; 4], dest_page: 9 },
            LinkPlacement { source_page: 1, rect: [0.0; 4], dest_page: 0 },
        ];

        assert_eq!(apply(&mut doc, &links).unwrap(), 0);
        assert!(annotations(&doc, 1).is_empty());
    }
}
