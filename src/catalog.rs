//! Source document catalog
//!
//! The catalog is populated once from a [`DocumentStore`] and is read-only
//! afterwards. Index entries, the page map and the outline refer to documents
//! by [`DocumentId`], which is the position of the document in discovery order.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use rayon::prelude::*;
use crate::error::{Error, Result};
use crate::store::{CustomOrder, DocumentStore};

/// Delimiter between song name and artist in a file title
pub const ARTIST_DELIMITER: &str = " - ";

/// Stable identifier of a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub usize);

/// How a document takes part in the songbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentGroup {
    /// Top-level song
    Regular,
    /// Song inside a subfolder; listed in the main index and its subfolder index
    SubfolderMember(String),
    /// Song in a folder marked as separate; only listed in its own index and placed last
    Separated(String),
}

impl DocumentGroup {
    pub fn is_separated(&self) -> bool {
        matches!(self, DocumentGroup::Separated(_))
    }

    /// Folder tag for grouped documents
    pub fn tag(&self) -> Option<&str> {
        match self {
            DocumentGroup::Regular => None,
            DocumentGroup::SubfolderMember(tag) | DocumentGroup::Separated(tag) => Some(tag),
        }
    }
}

/// One source PDF
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub path: PathBuf,
    /// Title as shown in the main index (the file stem)
    pub display_title: String,
    /// Song name part of the title
    pub song: String,
    /// Artist part of the title, if the title names one
    pub artist: Option<String>,
    pub page_count: usize,
    pub group: DocumentGroup,
}

/// Split a title into song and artist on the first `" - "`
///
/// Everything after the first delimiter is the artist, including any further
/// delimiters. Both parts are trimmed; an empty artist counts as none.
///
/// ```
/// use pdf_songbook::catalog::split_title;
///
/// assert_eq!(split_title("Song - Artist"), ("Song".to_string(), Some("Artist".to_string())));
/// assert_eq!(split_title("SoloSong"), ("SoloSong".to_string(), None));
/// ```
pub fn split_title(title: &str) -> (String, Option<String>) {
    match title.split_once(ARTIST_DELIMITER) {
        Some((song, artist)) => {
            let artist = artist.trim();
            let artist = (!artist.is_empty()).then(|| artist.to_string());
            (song.trim().to_string(), artist)
        }
        None => (title.trim().to_string(), None),
    }
}

/// Case-insensitive ordering of display strings, ties broken by document id
pub fn compare_titles(a: &str, a_id: DocumentId, b: &str, b_id: DocumentId) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a_id.cmp(&b_id))
}

/// All source documents known to the songbook
#[derive(Debug, Clone, Default)]
pub struct DocumentCatalog {
    documents: Vec<SourceDocument>,
    custom_orders: Vec<CustomOrder>,
    unreadable: Vec<PathBuf>,
}

impl DocumentCatalog {
    /// Build a catalog from already-known documents; ids are reassigned in order
    pub fn from_documents(documents: Vec<SourceDocument>) -> Self {
        let documents = documents
            .into_iter()
            .enumerate()
            .map(|(i, mut doc)| {
                doc.id = DocumentId(i);
                doc
            })
            .collect();

        Self {
            documents,
            custom_orders: Vec::new(),
            unreadable: Vec::new(),
        }
    }

    /// Attach ordered name lists
    pub fn with_custom_orders(mut self, orders: Vec<CustomOrder>) -> Self {
        self.custom_orders = orders;
        self
    }

    /// Discover documents in `store` and count their pages on `jobs` workers
    ///
    /// A document whose page count cannot be read stays in the catalog with
    /// zero pages and is remembered in [`DocumentCatalog::unreadable`].
    pub fn load(store: &dyn DocumentStore, jobs: usize) -> Result<Self> {
        let discovery = store.discover()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .map_err(|e| Error::General(format!("Failed to start page count workers: {}", e)))?;

        // Workers finish in any order; collect() keeps discovery order
        let counts: Vec<Result<usize>> = pool.install(|| {
            discovery
                .documents
                .par_iter()
                .map(|found| store.page_count(&found.path))
                .collect()
        });

        let mut documents = Vec::with_capacity(discovery.documents.len());
        let mut unreadable = Vec::new();

        for (i, (found, count)) in discovery.documents.into_iter().zip(counts).enumerate() {
            let page_count = match count {
                Ok(n) => n,
                Err(e) => {
                    let err = Error::UnreadableDocument {
                        path: found.path.clone(),
                        reason: e.to_string(),
                    };
                    log::error!("{}; counting it as 0 pages", err);
                    unreadable.push(found.path.clone());
                    0
                }
            };

            let display_title = title_from_path(&found.path);
            let (song, artist) = split_title(&display_title);

            documents.push(SourceDocument {
                id: DocumentId(i),
                path: found.path,
                display_title,
                song,
                artist,
                page_count,
                group: found.group,
            });
        }

        log::info!(
            "Catalogued {} documents ({} unreadable)",
            documents.len(),
            unreadable.len()
        );

        Ok(Self {
            documents,
            custom_orders: discovery.custom_orders,
            unreadable,
        })
    }

    /// Documents in discovery order
    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn get(&self, id: DocumentId) -> Option<&SourceDocument> {
        self.documents.get(id.0)
    }

    pub fn custom_orders(&self) -> &[CustomOrder] {
        &self.custom_orders
    }

    /// Paths whose page count could not be read
    pub fn unreadable(&self) -> &[PathBuf] {
        &self.unreadable
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Non-separated documents sorted by title
    pub fn main_documents(&self) -> Vec<&SourceDocument> {
        let mut docs: Vec<&SourceDocument> = self
            .documents
            .iter()
            .filter(|d| !d.group.is_separated())
            .collect();
        sort_by_title(&mut docs);
        docs
    }

    /// Documents of each separated tag, tags and documents sorted
    pub fn separated_groups(&self) -> Vec<(String, Vec<&SourceDocument>)> {
        self.grouped(|group| match group {
            DocumentGroup::Separated(tag) => Some(tag.as_str()),
            _ => None,
        })
    }

    /// Documents of each subfolder tag, tags and documents sorted
    pub fn subfolder_groups(&self) -> Vec<(String, Vec<&SourceDocument>)> {
        self.grouped(|group| match group {
            DocumentGroup::SubfolderMember(tag) => Some(tag.as_str()),
            _ => None,
        })
    }

    fn grouped<'a, F>(&'a self, tag_of: F) -> Vec<(String, Vec<&'a SourceDocument>)>
    where
        F: Fn(&'a DocumentGroup) -> Option<&'a str>,
    {
        let mut groups: std::collections::BTreeMap<&str, Vec<&SourceDocument>> =
            std::collections::BTreeMap::new();

        for doc in &self.documents {
            if let Some(tag) = tag_of(&doc.group) {
                groups.entry(tag).or_default().push(doc);
            }
        }

        groups
            .into_iter()
            .map(|(tag, mut docs)| {
                sort_by_title(&mut docs);
                (tag.to_string(), docs)
            })
            .collect()
    }

    /// Find a document by title for ordered lists
    ///
    /// Exact title match wins, then a case-insensitive match. A trailing
    /// ".pdf" in `name` is ignored. Among several matches the lowest id wins.
    pub fn find_by_title(&self, name: &str) -> Option<&SourceDocument> {
        let name = name.trim();
        let name = strip_pdf_extension(name);

        self.documents
            .iter()
            .find(|d| d.display_title == name)
            .or_else(|| {
                let lower = name.to_lowercase();
                self.documents
                    .iter()
                    .find(|d| d.display_title.to_lowercase() == lower)
            })
    }
}

/// Sort documents by display title
pub fn sort_by_title(docs: &mut [&SourceDocument]) {
    docs.sort_by(|a, b| compare_titles(&a.display_title, a.id, &b.display_title, b.id));
}

/// Display title of a document file: its stem
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn strip_pdf_extension(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..len - 4]
    } else {
        name
    }
}
