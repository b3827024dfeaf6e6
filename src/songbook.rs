//! The songbook pipeline
//!
//! ```text
//! catalog -> index specs -> offsets -> index pages -> assembly
//!         -> page numbers -> links + bookmarks -> atomic write
//! ```
//!
//! Page counting runs on worker threads; every later step works on the
//! finished catalog and page map on the calling thread.

use std::path::{Path, PathBuf};
use chrono::Local;
use lopdf::Document;
use crate::catalog::DocumentCatalog;
use crate::config::SongbookConfig;
use crate::error::{Error, Result};
use crate::index::{build_specs, resolve, IndexRenderer, PageBudget, RenderedIndex, ResolvedLayout};
use crate::pdf::font::IndexFont;
use crate::pdf::metadata::write_info;
use crate::pdf::text::{PassthroughShaper, TextShaper};
use crate::pdf::{assemble, links, outline, overlay, write_atomic};
use crate::store::DocumentStore;

/// Catalog and resolved page layout, before anything is drawn
#[derive(Debug, Clone)]
pub struct SongbookPlan {
    pub catalog: DocumentCatalog,
    pub layout: ResolvedLayout,
}

/// Summary of a finished build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub output: PathBuf,
    pub documents: usize,
    /// Documents counted as empty because they could not be read
    pub unreadable: Vec<PathBuf>,
    pub indexes: usize,
    pub index_pages: usize,
    pub total_pages: usize,
    pub links: usize,
    pub bookmarks: usize,
    pub bytes: u64,
}

/// Builds a songbook from a [`DocumentStore`]
///
/// # Example
///
/// ```no_run
/// use pdf_songbook::config::SongbookConfig;
/// use pdf_songbook::songbook::SongbookBuilder;
/// use pdf_songbook::store::FsDocumentStore;
/// use std::path::Path;
///
/// let output = Path::new("songs/Songbook.pdf");
/// let store = FsDocumentStore::new("songs").exclude(output);
/// let report = SongbookBuilder::new(SongbookConfig::default())
///     .build(&store, output)
///     .expect("Failed to build songbook");
/// println!("{} pages", report.total_pages);
/// ```
pub struct SongbookBuilder {
    config: SongbookConfig,
    shaper: Box<dyn TextShaper>,
}

impl SongbookBuilder {
    pub fn new(config: SongbookConfig) -> Self {
        Self {
            config,
            shaper: Box::new(PassthroughShaper),
        }
    }

    /// Use `shaper` for every string drawn on index pages
    pub fn with_shaper(mut self, shaper: impl TextShaper + 'static) -> Self {
        self.shaper = Box::new(shaper);
        self
    }

    pub fn config(&self) -> &SongbookConfig {
        &self.config
    }

    /// Catalog the store and fix every start page without drawing anything
    pub fn plan(&self, store: &dyn DocumentStore) -> Result<SongbookPlan> {
        let budget = PageBudget::new(&self.config.layout)?;

        log::info!("Scanning {}", store.location().display());
        let catalog = DocumentCatalog::load(store, self.config.effective_jobs())?;
        if catalog.is_empty() {
            return Err(Error::NoDocuments(store.location().to_path_buf()));
        }

        let specs = build_specs(&catalog, &self.config);
        let layout = resolve(specs, &catalog, &budget)?;

        Ok(SongbookPlan { catalog, layout })
    }

    /// Build the combined document in memory
    pub fn build_document(&self, store: &dyn DocumentStore) -> Result<(Document, BuildReport)> {
        // A bad font must fail before any work is done
        let font = self.load_font()?;
        let plan = self.plan(store)?;
        let SongbookPlan { catalog, layout } = &plan;

        let budget = PageBudget::new(&self.config.layout)?;
        let renderer = IndexRenderer {
            layout: &self.config.layout,
            labels: &self.config.labels,
            budget,
            font: &font,
            shaper: self.shaper.as_ref(),
            direction: self.config.direction,
            number_entries: self.config.number_entries,
        };

        let mut rendered: Vec<RenderedIndex> = Vec::new();
        for (spec, pages) in layout.plan.indexes() {
            let index = renderer.render(spec, &layout.page_map)?;
            if index.page_count() != pages {
                return Err(Error::PageOffsetDivergence(format!(
                    "index '{}' rendered {} pages, estimated {}",
                    spec.title,
                    index.page_count(),
                    pages
                )));
            }
            rendered.push(index);
        }

        let index_documents = rendered
            .iter()
            .map(|index| index.to_document(&font, &self.config.layout))
            .collect::<Result<Vec<_>>>()?;

        let mut doc = assemble(&layout.plan, index_documents, catalog, store)?;

        overlay::stamp(&mut doc, layout.index_pages, &self.config.page_numbers)?;

        let mut link_count = 0;
        if self.config.links {
            let placements: Vec<links::LinkPlacement> = rendered
                .iter()
                .enumerate()
                .filter_map(|(k, index)| {
                    let start = layout.page_map.index_start(k)?;
                    Some(links::plan(start, index, &font, self.config.layout.entry_font_size))
                })
                .flatten()
                .collect();
            link_count = links::apply(&mut doc, &placements)?;
        }

        let mut bookmark_count = 0;
        if self.config.bookmarks {
            let entries = outline::entries(catalog, &layout.page_map);
            bookmark_count = outline::apply(&mut doc, &entries)?;
        }

        let title = self
            .config
            .document_title
            .clone()
            .unwrap_or_else(|| self.config.labels.main_title.clone());
        write_info(&mut doc, &title, &Local::now())?;

        let report = BuildReport {
            output: PathBuf::new(),
            documents: catalog.len(),
            unreadable: catalog.unreadable().to_vec(),
            indexes: rendered.len(),
            index_pages: layout.index_pages,
            total_pages: layout.total_pages,
            links: link_count,
            bookmarks: bookmark_count,
            bytes: 0,
        };

        Ok((doc, report))
    }

    /// Build the songbook and write it to `output`
    ///
    /// Nothing is written to `output` unless every step succeeds.
    pub fn build(&self, store: &dyn DocumentStore, output: &Path) -> Result<BuildReport> {
        let (mut doc, mut report) = self.build_document(store)?;

        report.bytes = write_atomic(&mut doc, output)?;
        report.output = output.to_path_buf();

        log::info!(
            "Songbook has {} pages ({} index pages, {} songs)",
            report.total_pages,
            report.index_pages,
            report.documents
        );
        Ok(report)
    }

    fn load_font(&self) -> Result<IndexFont> {
        match &self.config.font_path {
            Some(path) => IndexFont::load(path),
            None => Ok(IndexFont::helvetica()),
        }
    }
}
