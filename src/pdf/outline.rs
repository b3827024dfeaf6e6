//! Document outline with one bookmark per song

use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::catalog::DocumentCatalog;
use crate::error::{Error, Result};
use crate::index::resolver::PageMap;
use crate::pdf::text::pdf_text_string;

/// One bookmark
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub title: String,
    /// 1-based destination page
    pub page: usize,
}

/// Bookmarks for every catalogued document, in catalog order
///
/// The outline follows discovery order, not the order songs are listed in
/// the indexes; each entry still points at the document's start page.
pub fn entries(catalog: &DocumentCatalog, page_map: &PageMap) -> Vec<OutlineEntry> {
    catalog
        .documents()
        .iter()
        .filter_map(|doc| {
            let page = page_map.document_start(doc.id)?;
            Some(OutlineEntry {
                title: doc.display_title.clone(),
                page,
            })
        })
        .collect()
}

/// Write a flat outline into `doc` and open the outline panel
///
/// Entries pointing past the last page are skipped with a warning. Returns
/// the number of bookmarks written.
pub fn apply(doc: &mut Document, entries: &[OutlineEntry]) -> Result<usize> {
    let pages = doc.get_pages();

    let items: Vec<(&str, ObjectId)> = entries
        .iter()
        .filter_map(|entry| {
            let page_id = u32::try_from(entry.page).ok().and_then(|n| pages.get(&n));
            if page_id.is_none() {
                log::warn!(
                    "Skipping bookmark '{}': page {} is past the end of the document",
                    entry.title,
                    entry.page
                );
            }
            page_id.map(|&id| (entry.title.as_str(), id))
        })
        .collect();

    if items.is_empty() {
        return Ok(0);
    }

    let outline_id = doc.new_object_id();
    let item_ids: Vec<ObjectId> = items.iter().map(|_| doc.new_object_id()).collect();

    for (i, ((title, page_id), &item_id)) in items.iter().zip(&item_ids).enumerate() {
        let mut item = Dictionary::new();
        item.set("Title", pdf_text_string(title));
        item.set("Parent", Object::Reference(outline_id));
        item.set(
            "Dest",
            Object::Array(vec![Object::Reference(*page_id), Object::Name(b"Fit".to_vec())]),
        );
        if i > 0 {
            item.set("Prev", Object::Reference(item_ids[i - 1]));
        }
        if let Some(&next) = item_ids.get(i + 1) {
            item.set("Next", Object::Reference(next));
        }
        doc.objects.insert(item_id, Object::Dictionary(item));
    }

    let mut outline = Dictionary::new();
    outline.set("Type", Object::Name(b"Outlines".to_vec()));
    outline.set("Count", Object::Integer(item_ids.len() as i64));
    outline.set("First", Object::Reference(item_ids[0]));
    outline.set("Last", Object::Reference(item_ids[item_ids.len() - 1]));
    doc.objects.insert(outline_id, Object::Dictionary(outline));

    let catalog = doc
        .catalog_mut()
        .map_err(|e| Error::General(format!("Cannot add outline: {}", e)))?;
    catalog.set("Outlines", Object::Reference(outline_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    log::info!("Added {} bookmarks", item_ids.len());
    Ok(item_ids.len())
}
