//! Appending indexes and songs into one document

use std::collections::BTreeMap;
use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::catalog::DocumentCatalog;
use crate::error::{Error, Result};
use crate::index::resolver::{AssemblyPlan, Segment};
use crate::store::DocumentStore;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Longest Parent chain followed when looking up inherited attributes
const MAX_TREE_DEPTH: usize = 64;

/// Build the combined document in plan order
///
/// `indexes` holds one rendered document per index segment, in plan order.
/// Documents with zero pages are skipped. A source whose page count differs
/// from the catalog fails with [`Error::PageCountChanged`], and the combined
/// page count is checked against the plan.
pub fn assemble(
    plan: &AssemblyPlan,
    indexes: Vec<Document>,
    catalog: &DocumentCatalog,
    store: &dyn DocumentStore,
) -> Result<Document> {
    let mut indexes = indexes.into_iter();
    let mut parts = Vec::new();
    let mut expected = 0usize;

    for segment in &plan.segments {
        match segment {
            Segment::Index { spec, pages } => {
                let doc = indexes.next().ok_or_else(|| {
                    Error::PageOffsetDivergence(format!("index '{}' was not rendered", spec.title))
                })?;
                let actual = doc.get_pages().len();
                if actual != *pages {
                    return Err(Error::PageOffsetDivergence(format!(
                        "index '{}' rendered {} pages, estimated {}",
                        spec.title, actual, pages
                    )));
                }
                expected += pages;
                parts.push(doc);
            }
            Segment::Documents { label, documents } => {
                log::debug!("Appending {} documents of '{}'", documents.len(), label);
                for &id in documents {
                    let source = catalog.get(id).ok_or_else(|| {
                        Error::PageOffsetDivergence(format!("document {:?} is not in the catalog", id))
                    })?;
                    if source.page_count == 0 {
                        log::debug!("Skipping {} (no pages)", source.path.display());
                        continue;
                    }

                    let doc = store.load(&source.path)?;
                    let actual = doc.get_pages().len();
                    if actual != source.page_count {
                        return Err(Error::PageCountChanged {
                            path: source.path.clone(),
                            expected: source.page_count,
                            actual,
                        });
                    }
                    expected += actual;
                    parts.push(doc);
                }
            }
        }
    }

    let merged = merge_documents(parts)?;
    let actual = merged.get_pages().len();
    if actual != expected {
        return Err(Error::AssemblyMismatch { expected, actual });
    }

    log::info!("Assembled {} pages", actual);
    Ok(merged)
}

/// Append the pages of `documents` into one new document
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        materialize_inherited(&mut doc)?;

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_values());

        // The old page tree and catalog are replaced below
        doc.objects
            .retain(|_, object| !matches!(type_name(object), Some(b"Catalog") | Some(b"Pages")));
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);

    // new_object_id() must hand out ids above everything just added
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(merged)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
}

/// Copy inherited page attributes onto each page
///
/// Pages lose their original ancestors when re-parented, so anything they
/// inherited has to live on the page itself first.
fn materialize_inherited(doc: &mut Document) -> Result<()> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in page_ids {
        let mut inherited: Vec<(&[u8], Object)> = Vec::new();
        {
            let page = doc.get_dictionary(page_id)?;
            for key in INHERITABLE {
                if page.has(key) {
                    continue;
                }
                if let Some(value) = find_inherited(doc, page, key) {
                    inherited.push((key, value));
                }
            }
        }

        if inherited.is_empty() {
            continue;
        }

        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    Ok(())
}

fn find_inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent_id = page.get(b"Parent").and_then(Object::as_reference).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        let parent = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        parent_id = parent.get(b"Parent").and_then(Object::as_reference).ok()?;
    }

    None
}
