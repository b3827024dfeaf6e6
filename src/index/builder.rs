//! Turning the catalog into index descriptions

use std::collections::BTreeMap;
use crate::catalog::{DocumentCatalog, DocumentId, SourceDocument};
use crate::config::SongbookConfig;
use crate::error::Error;
use crate::index::spec::{IndexEntry, IndexKind, IndexSpec, Subheading};
use crate::store::CustomOrder;

/// Build every index the catalog calls for, in book order
///
/// Main, Artist, then one per ordered list, one per subfolder and one per
/// separated folder. Kinds without entries are left out.
pub fn build_specs(catalog: &DocumentCatalog, config: &SongbookConfig) -> Vec<IndexSpec> {
    let mut specs = Vec::new();

    specs.extend(main_index(catalog, &config.labels.main_title));

    if config.artist_index {
        specs.extend(artist_index(
            catalog,
            &config.labels.artist_title,
            &config.labels.no_artist_heading,
        ));
    }

    for order in catalog.custom_orders() {
        specs.extend(custom_index(catalog, order));
    }

    if config.subfolder_indexes {
        for (tag, documents) in catalog.subfolder_groups() {
            specs.extend(titled_index(IndexKind::Subfolder, &tag, &documents));
        }
    }

    for (tag, documents) in catalog.separated_groups() {
        specs.extend(titled_index(IndexKind::Separated, &tag, &documents));
    }

    for spec in &specs {
        log::debug!(
            "{:?} index '{}': {} entries, {} headings",
            spec.kind,
            spec.title,
            spec.entries.len(),
            spec.subheadings.len()
        );
    }

    specs
}

/// Every non-separated document by title
pub fn main_index(catalog: &DocumentCatalog, title: &str) -> Option<IndexSpec> {
    titled_index(IndexKind::Main, title, &catalog.main_documents())
}

fn titled_index(kind: IndexKind, title: &str, documents: &[&SourceDocument]) -> Option<IndexSpec> {
    if documents.is_empty() {
        return None;
    }

    let entries = documents
        .iter()
        .map(|doc| IndexEntry::new(doc.display_title.clone(), doc.id))
        .collect();

    Some(IndexSpec::new(kind, title, entries))
}

/// Non-separated documents grouped by artist
///
/// Artists are ordered case-insensitively and songs by name inside each
/// artist. Songs without an artist follow under `no_artist_heading`. Returns
/// `None` when no document names an artist.
pub fn artist_index(
    catalog: &DocumentCatalog,
    title: &str,
    no_artist_heading: &str,
) -> Option<IndexSpec> {
    let mut by_artist: BTreeMap<&str, Vec<&SourceDocument>> = BTreeMap::new();
    let mut without_artist: Vec<&SourceDocument> = Vec::new();

    for doc in catalog.documents().iter().filter(|d| !d.group.is_separated()) {
        match doc.artist.as_deref() {
            Some(artist) => by_artist.entry(artist).or_default().push(doc),
            None => without_artist.push(doc),
        }
    }

    if by_artist.is_empty() {
        return None;
    }

    let mut artists: Vec<(&str, Vec<&SourceDocument>)> = by_artist.into_iter().collect();
    artists.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

    let mut entries = Vec::new();
    for (artist, mut songs) in artists {
        sort_by_song(&mut songs);
        entries.extend(
            songs
                .into_iter()
                .map(|doc| IndexEntry::new(format!("{} - {}", artist, doc.song), doc.id)),
        );
    }

    let mut spec = IndexSpec::new(IndexKind::Artist, title, entries);

    if !without_artist.is_empty() {
        sort_by_song(&mut without_artist);
        spec.subheadings.push(Subheading {
            before_entry: spec.entries.len(),
            text: no_artist_heading.to_string(),
        });
        spec.entries.extend(
            without_artist
                .into_iter()
                .map(|doc| IndexEntry::new(doc.song.clone(), doc.id)),
        );
    }

    Some(spec)
}

fn sort_by_song(docs: &mut [&SourceDocument]) {
    docs.sort_by(|a, b| crate::catalog::compare_titles(&a.song, a.id, &b.song, b.id));
}

/// Documents named by an ordered list, in list order
///
/// Names that match no document are dropped with an error in the log.
pub fn custom_index(catalog: &DocumentCatalog, order: &CustomOrder) -> Option<IndexSpec> {
    let mut entries = Vec::with_capacity(order.entries.len());

    for name in &order.entries {
        match catalog.find_by_title(name) {
            Some(doc) => entries.push(IndexEntry::new(doc.display_title.clone(), doc.id)),
            None => {
                let err = Error::UnresolvedCustomEntry {
                    list: order.name.clone(),
                    name: name.clone(),
                };
                log::error!("{}; skipping it", err);
            }
        }
    }

    if entries.is_empty() {
        return None;
    }

    Some(IndexSpec::new(IndexKind::Custom, order.name.clone(), entries))
}

/// Documents in the order their pages appear after the indexes
///
/// Non-separated documents sorted by title, then each separated folder in tag
/// order.
pub fn document_order(catalog: &DocumentCatalog) -> Vec<(String, Vec<DocumentId>)> {
    let mut segments = vec![(
        "songs".to_string(),
        catalog.main_documents().iter().map(|d| d.id).collect::<Vec<_>>(),
    )];

    segments.extend(
        catalog
            .separated_groups()
            .into_iter()
            .map(|(tag, docs)| (tag, docs.iter().map(|d| d.id).collect())),
    );

    segments.retain(|(_, ids)| !ids.is_empty());
    segments
}
