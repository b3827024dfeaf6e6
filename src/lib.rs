//! PDF Songbook Library
//!
//! Assembles a folder of song sheet PDFs into one songbook. The songbook opens
//! with generated indexes (all songs, songs by artist, ordered lists and one
//! index per subfolder) whose page numbers are clickable, followed by the
//! songs themselves with running page numbers and one bookmark per song.
//!
//! # Example
//!
//! ```no_run
//! use pdf_songbook::config::SongbookConfig;
//! use pdf_songbook::songbook::SongbookBuilder;
//! use pdf_songbook::store::FsDocumentStore;
//! use std::path::Path;
//!
//! let output = Path::new("Songbook.pdf");
//! let store = FsDocumentStore::new("songs").exclude(output);
//!
//! SongbookBuilder::new(SongbookConfig::default())
//!     .build(&store, output)
//!     .expect("Failed to build songbook");
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod layout;
pub mod pdf;
pub mod songbook;
pub mod store;

// Re-export commonly used items
pub use config::SongbookConfig;
pub use error::{Error, Result};
pub use songbook::{BuildReport, SongbookBuilder};
