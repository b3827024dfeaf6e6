//! Source document discovery
//!
//! A [`DocumentStore`] supplies the raw song PDFs: which files exist, which
//! group each belongs to, the ordered name lists, and the page count and
//! content of each file. [`FsDocumentStore`] implements it over a folder:
//!
//! ```text
//! songs/
//!   Yesterday - Beatles.pdf     regular song
//!   order.txt                   ordered list named after the root folder
//!   Folk/
//!     Scarborough Fair.pdf      subfolder member, tag "Folk"
//!   Christmas/
//!     separate                  sentinel: this folder is separated
//!     Silent Night.pdf          separated song, tag "Christmas"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use glob::glob;
use lopdf::Document;
use crate::catalog::{title_from_path, DocumentGroup};
use crate::error::{Error, Result};
use crate::pdf::count_pages;

/// Sentinel file that marks a subfolder as separated
pub const SEPARATE_MARKER: &str = "separate";

/// List file holding an ordered list of song titles
pub const ORDER_LIST: &str = "order.txt";

/// A document found by discovery, before its pages are counted
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDocument {
    pub path: PathBuf,
    pub group: DocumentGroup,
}

/// An ordered list of song titles for a custom index
#[derive(Debug, Clone, PartialEq)]
pub struct CustomOrder {
    /// Index title; the folder the list was found in
    pub name: String,
    /// Titles in display order
    pub entries: Vec<String>,
}

/// Everything discovery yields
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub documents: Vec<DiscoveredDocument>,
    pub custom_orders: Vec<CustomOrder>,
}

/// Supplier of source documents
///
/// `page_count` is called from several worker threads at once.
pub trait DocumentStore: Sync {
    /// List documents in catalog order with their group and ordering hints
    fn discover(&self) -> Result<Discovery>;

    /// Where documents come from, for messages
    fn location(&self) -> &Path;

    /// Number of pages of one document
    fn page_count(&self, path: &Path) -> Result<usize>;

    /// Load one document for assembly
    fn load(&self, path: &Path) -> Result<Document>;
}

/// Document store over a folder of PDFs
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Skip a file during discovery (typically the output songbook)
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|excluded| {
            excluded == path
                || match (fs::canonicalize(excluded), fs::canonicalize(path)) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
        })
    }

    /// Group of a file from its first-level subfolder under the root
    fn group_of(&self, path: &Path) -> DocumentGroup {
        let relative = match path.strip_prefix(&self.root) {
            Ok(relative) => relative,
            Err(_) => return DocumentGroup::Regular,
        };

        let mut components = relative.components();
        let first = components.next();
        // A file directly in the root has no further components
        if components.next().is_none() {
            return DocumentGroup::Regular;
        }

        let folder = match first {
            Some(component) => component.as_os_str().to_string_lossy().into_owned(),
            None => return DocumentGroup::Regular,
        };

        if self.root.join(&folder).join(SEPARATE_MARKER).exists() {
            DocumentGroup::Separated(folder)
        } else {
            DocumentGroup::SubfolderMember(folder)
        }
    }

    /// Read ordered lists from the root and each first-level subfolder
    fn custom_orders(&self) -> Result<Vec<CustomOrder>> {
        let mut folders = vec![self.root.clone()];

        let mut subfolders: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subfolders.sort();
        folders.extend(subfolders);

        let mut orders = Vec::new();
        for folder in folders {
            let list_path = folder.join(ORDER_LIST);
            if !list_path.is_file() {
                continue;
            }

            let text = fs::read_to_string(&list_path)?;
            let entries = parse_order_list(&text);
            let name = title_from_path(&folder);

            log::debug!("Ordered list '{}' with {} entries", name, entries.len());
            orders.push(CustomOrder { name, entries });
        }

        Ok(orders)
    }
}

/// Parse an ordered list: one title per line, blank lines and `#` comments skipped
pub fn parse_order_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect()
}

impl DocumentStore for FsDocumentStore {
    fn discover(&self) -> Result<Discovery> {
        if !self.root.is_dir() {
            return Err(Error::FileNotFound(self.root.clone()));
        }

        let root = self
            .root
            .to_str()
            .ok_or_else(|| Error::General(format!("Non UTF-8 folder: {}", self.root.display())))?;
        let pattern = format!("{}/**/*.pdf", glob::Pattern::escape(root));

        let mut paths = Vec::new();
        for entry in glob(&pattern).map_err(|e| Error::InvalidGlob(e.to_string()))? {
            match entry {
                Ok(path) if !self.is_excluded(&path) => paths.push(path),
                Ok(path) => log::debug!("Skipping excluded {}", path.display()),
                Err(e) => log::warn!("Cannot read {}: {}", e.path().display(), e.error()),
            }
        }

        // Sort by file name only, case-insensitive
        paths.sort_by(|a, b| {
            title_from_path(a)
                .to_lowercase()
                .cmp(&title_from_path(b).to_lowercase())
                .then_with(|| a.cmp(b))
        });

        let documents = paths
            .into_iter()
            .map(|path| DiscoveredDocument {
                group: self.group_of(&path),
                path,
            })
            .collect();

        Ok(Discovery {
            documents,
            custom_orders: self.custom_orders()?,
        })
    }

    fn location(&self) -> &Path {
        &self.root
    }

    fn page_count(&self, path: &Path) -> Result<usize> {
        count_pages(path)
    }

    fn load(&self, path: &Path) -> Result<Document> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Ok(Document::load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_parse_order_list() {
        let text = "# favourites\nImagine\n\n  Yesterday - Beatles  \n#skip\nHey Jude.pdf\n";
        assert_eq!(
            parse_order_list(text),
            vec!["Imagine", "Yesterday - Beatles", "Hey Jude.pdf"]
        );
    }

    #[test]
    fn test_discover_groups_and_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("b.pdf"));
        touch(&root.join("A.pdf"));
        touch(&root.join("Folk/Scarborough Fair.pdf"));
        touch(&root.join("Christmas/separate"));
        touch(&root.join("Christmas/Silent Night.pdf"));
        touch(&root.join("notes.txt"));

        let store = FsDocumentStore::new(root);
        let discovery = store.discover().unwrap();

        let found: Vec<(String, DocumentGroup)> = discovery
            .documents
            .iter()
            .map(|d| (title_from_path(&d.path), d.group.clone()))
            .collect();

        assert_eq!(
            found,
            vec![
                ("A".to_string(), DocumentGroup::Regular),
                ("b".to_string(), DocumentGroup::Regular),
                (
                    "Scarborough Fair".to_string(),
                    DocumentGroup::SubfolderMember("Folk".to_string())
                ),
                (
                    "Silent Night".to_string(),
                    DocumentGroup::Separated("Christmas".to_string())
                ),
            ]
        );
    }

    #[test]
    fn test_discover_reads_order_lists() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("Set/One.pdf"));
        fs::write(root.join("Set").join(ORDER_LIST), "Two\nOne\n").unwrap();

        let discovery = FsDocumentStore::new(root).discover().unwrap();
        assert_eq!(
            discovery.custom_orders,
            vec![CustomOrder {
                name: "Set".to_string(),
                entries: vec!["Two".to_string(), "One".to_string()],
            }]
        );
    }

    #[test]
    fn test_discover_skips_excluded_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("Song.pdf"));
        touch(&root.join("Songbook.pdf"));

        let store = FsDocumentStore::new(root).exclude(root.join("Songbook.pdf"));
        let discovery = store.discover().unwrap();
        assert_eq!(discovery.documents.len(), 1);
        assert_eq!(title_from_path(&discovery.documents[0].path), "Song");
    }

    #[test]
    fn test_discover_missing_root() {
        let store = FsDocumentStore::new("definitely/not/here");
        assert!(matches!(store.discover(), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_page_count_of_garbage_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"not a pdf").unwrap();

        let store = FsDocumentStore::new(dir.path());
        assert!(store.page_count(&path).is_err());
    }
}
