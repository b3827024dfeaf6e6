//! Page offset resolution
//!
//! Index size depends only on the number of rows, never on the page numbers
//! printed in them, so every offset is fixed in a single walk over the
//! segments: estimate each index, then hand out start pages in book order.

use std::collections::HashMap;
use crate::catalog::{DocumentCatalog, DocumentId};
use crate::error::{Error, Result};
use crate::index::budget::PageBudget;
use crate::index::builder::document_order;
use crate::index::spec::IndexSpec;

/// A contiguous run of pages in the final document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentId {
    /// The k-th index in the plan
    Index(usize),
    Document(DocumentId),
}

/// Absolute 1-based start page of every segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMap {
    starts: HashMap<SegmentId, usize>,
}

impl PageMap {
    pub fn get(&self, segment: SegmentId) -> Option<usize> {
        self.starts.get(&segment).copied()
    }

    pub fn document_start(&self, id: DocumentId) -> Option<usize> {
        self.get(SegmentId::Document(id))
    }

    pub fn index_start(&self, k: usize) -> Option<usize> {
        self.get(SegmentId::Index(k))
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    fn insert(&mut self, segment: SegmentId, start: usize) {
        self.starts.insert(segment, start);
    }
}

/// One step of the append order
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Index { spec: IndexSpec, pages: usize },
    Documents { label: String, documents: Vec<DocumentId> },
}

/// Ordered segments of the final document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyPlan {
    pub segments: Vec<Segment>,
}

impl AssemblyPlan {
    /// Index specs with their page counts, in plan order
    pub fn indexes(&self) -> impl Iterator<Item = (&IndexSpec, usize)> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Index { spec, pages } => Some((spec, *pages)),
            Segment::Documents { .. } => None,
        })
    }

    /// Documents in append order
    pub fn documents(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| match segment {
                Segment::Documents { documents, .. } => documents.as_slice(),
                Segment::Index { .. } => &[][..],
            })
            .copied()
    }
}

/// Result of offset resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub plan: AssemblyPlan,
    pub page_map: PageMap,
    /// Pages taken by all indexes together; they open the book
    pub index_pages: usize,
    pub total_pages: usize,
}

/// Fix the start page of every index and every document
///
/// Indexes come first in the order given, then the non-separated documents,
/// then each separated group. Page numbers start at 1.
pub fn resolve(
    specs: Vec<IndexSpec>,
    catalog: &DocumentCatalog,
    budget: &PageBudget,
) -> Result<ResolvedLayout> {
    let mut plan = AssemblyPlan::default();
    let mut page_map = PageMap::default();
    let mut cursor: usize = 1;

    for (k, spec) in specs.into_iter().enumerate() {
        let pages = budget.estimate(spec.row_count());
        page_map.insert(SegmentId::Index(k), cursor);
        log::debug!("Index '{}' starts at page {} ({} pages)", spec.title, cursor, pages);
        cursor = advance(cursor, pages)?;
        plan.segments.push(Segment::Index { spec, pages });
    }

    let index_pages = cursor - 1;

    for (label, documents) in document_order(catalog) {
        for &id in &documents {
            let doc = catalog.get(id).ok_or_else(|| {
                Error::PageOffsetDivergence(format!("document {:?} is not in the catalog", id))
            })?;
            page_map.insert(SegmentId::Document(id), cursor);
            cursor = advance(cursor, doc.page_count)?;
        }
        log::debug!("Segment '{}': {} documents", label, documents.len());
        plan.segments.push(Segment::Documents { label, documents });
    }

    let total_pages = cursor - 1;
    log::info!(
        "Resolved {} index pages and {} pages in total",
        index_pages,
        total_pages
    );

    Ok(ResolvedLayout {
        plan,
        page_map,
        index_pages,
        total_pages,
    })
}

fn advance(cursor: usize, pages: usize) -> Result<usize> {
    cursor.checked_add(pages).ok_or_else(|| {
        Error::PageOffsetDivergence(format!("page cursor overflows at {} + {}", cursor, pages))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::doc;
    use crate::catalog::{DocumentGroup, SourceDocument};
    use crate::config::SongbookConfig;
    use crate::index::builder::build_specs;

    fn resolve_catalog(catalog: &DocumentCatalog, per_page: usize) -> ResolvedLayout {
        let specs = build_specs(catalog, &SongbookConfig::default());
        let budget = PageBudget::with_entries_per_page(per_page).unwrap();
        resolve(specs, catalog, &budget).unwrap()
    }

    #[test]
    fn test_three_single_page_songs() {
        let catalog = DocumentCatalog::from_documents(vec![
            doc("B", 1, DocumentGroup::Regular),
            doc("A", 1, DocumentGroup::Regular),
            doc("C", 1, DocumentGroup::Regular),
        ]);

        let resolved = resolve_catalog(&catalog, 24);
        assert_eq!(resolved.index_pages, 1);
        assert_eq!(resolved.total_pages, 4);

        // A is id 1, B id 0, C id 2
        assert_eq!(resolved.page_map.index_start(0), Some(1));
        assert_eq!(resolved.page_map.document_start(DocumentId(1)), Some(2));
        assert_eq!(resolved.page_map.document_start(DocumentId(0)), Some(3));
        assert_eq!(resolved.page_map.document_start(DocumentId(2)), Some(4));
    }

    #[test]
    fn test_two_hundred_documents_forty_per_page() {
        let documents: Vec<SourceDocument> = (0..200)
            .map(|i| doc(&format!("Song {:03}", i), 1, DocumentGroup::Regular))
            .collect();
        let catalog = DocumentCatalog::from_documents(documents);

        let resolved = resolve_catalog(&catalog, 40);
        assert_eq!(resolved.index_pages, 5);
        for rank in 1..=200 {
            // Titles sort in id order, so rank r is id r-1
            assert_eq!(
                resolved.page_map.document_start(DocumentId(rank - 1)),
                Some(5 + rank)
            );
        }
    }

    #[test]
    fn test_total_is_sum_of_segments() {
        let catalog = DocumentCatalog::from_documents(vec![
            doc("One - X", 3, DocumentGroup::Regular),
            doc("Two", 2, DocumentGroup::SubfolderMember("Folk".to_string())),
            doc("Three", 4, DocumentGroup::Separated("Xmas".to_string())),
        ]);

        let resolved = resolve_catalog(&catalog, 24);
        let index_sum: usize = resolved.plan.indexes().map(|(_, pages)| pages).sum();
        let document_sum: usize = catalog.documents().iter().map(|d| d.page_count).sum();
        assert_eq!(resolved.index_pages, index_sum);
        assert_eq!(resolved.total_pages, index_sum + document_sum);
    }

    #[test]
    fn test_separated_documents_come_last() {
        let catalog = DocumentCatalog::from_documents(vec![
            doc("A", 2, DocumentGroup::Separated("Xmas".to_string())),
            doc("B", 2, DocumentGroup::Separated("Xmas".to_string())),
            doc("Y", 3, DocumentGroup::Regular),
            doc("Z", 1, DocumentGroup::SubfolderMember("Folk".to_string())),
        ]);

        let resolved = resolve_catalog(&catalog, 24);
        let start = |i| resolved.page_map.document_start(DocumentId(i)).unwrap();
        let last_regular_end = (start(2) + 3).max(start(3) + 1);
        assert!(start(0) >= last_regular_end);
        assert!(start(1) >= last_regular_end);
        assert_eq!(start(1), start(0) + 2);

        let order: Vec<DocumentId> = resolved.plan.documents().collect();
        assert_eq!(order, vec![DocumentId(2), DocumentId(3), DocumentId(0), DocumentId(1)]);
    }

    #[test]
    fn test_segments_never_overlap() {
        let catalog = DocumentCatalog::from_documents(
            (0..30)
                .map(|i| doc(&format!("T{:02} - Band{}", i, i % 4), i % 3 + 1, DocumentGroup::Regular))
                .collect(),
        );

        let resolved = resolve_catalog(&catalog, 7);
        let mut previous_end = 1;
        for (k, (_, pages)) in resolved.plan.indexes().enumerate() {
            assert_eq!(resolved.page_map.index_start(k), Some(previous_end));
            previous_end += pages;
        }
        for id in resolved.plan.documents() {
            let start = resolved.page_map.document_start(id).unwrap();
            assert_eq!(start, previous_end);
            previous_end += catalog.get(id).unwrap().page_count;
        }
        assert_eq!(previous_end - 1, resolved.total_pages);
    }

    #[test]
    fn test_unreadable_document_takes_no_pages() {
        let catalog = DocumentCatalog::from_documents(vec![
            doc("A", 0, DocumentGroup::Regular),
            doc("B", 2, DocumentGroup::Regular),
        ]);

        let resolved = resolve_catalog(&catalog, 24);
        assert_eq!(resolved.page_map.document_start(DocumentId(0)), Some(2));
        assert_eq!(resolved.page_map.document_start(DocumentId(1)), Some(2));
        assert_eq!(resolved.total_pages, 3);
    }
}
