//! Songbook configuration
//!
//! Every tunable of the pipeline lives in one [`SongbookConfig`] value that is
//! passed explicitly to the stages that need it.

use std::path::PathBuf;
use crate::layout::{IndexLayout, Length};

/// Where page numbers are stamped on song pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumberPosition {
    /// Left edge of the page
    #[default]
    Leading,
    /// Right edge of the page
    Trailing,
    /// Both edges
    Both,
}

impl PageNumberPosition {
    /// Parse "left"/"leading", "right"/"trailing" or "both" (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" | "leading" => Some(Self::Leading),
            "right" | "trailing" => Some(Self::Trailing),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn includes_leading(&self) -> bool {
        matches!(self, Self::Leading | Self::Both)
    }

    pub fn includes_trailing(&self) -> bool {
        matches!(self, Self::Trailing | Self::Both)
    }
}

/// Reading direction of index rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    /// Titles on the left, page numbers right-aligned on the right
    #[default]
    LeftToRight,
    /// Titles right-aligned on the right, page numbers on the left
    RightToLeft,
}

/// Page number overlay settings
#[derive(Debug, Clone, PartialEq)]
pub struct PageNumbering {
    pub position: PageNumberPosition,
    pub font_size: f32,
    /// Distance from the page edge to the number
    pub side_offset: Length,
    /// Distance from the bottom edge to the baseline
    pub bottom_offset: Length,
}

impl Default for PageNumbering {
    fn default() -> Self {
        Self {
            position: PageNumberPosition::Leading,
            font_size: 16.0,
            side_offset: Length::from_cm(2.0),
            bottom_offset: Length::from_cm(1.5),
        }
    }
}

/// User-visible strings drawn on index pages
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    pub main_title: String,
    pub artist_title: String,
    pub no_artist_heading: String,
    pub column_title: String,
    pub column_page: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            main_title: "Songbook - Contents".to_string(),
            artist_title: "Songs by Artist".to_string(),
            no_artist_heading: "Other Songs".to_string(),
            column_title: "Song".to_string(),
            column_page: "Page".to_string(),
        }
    }
}

/// Complete configuration for building a songbook
#[derive(Debug, Clone, PartialEq)]
pub struct SongbookConfig {
    pub layout: IndexLayout,
    pub labels: Labels,
    pub page_numbers: PageNumbering,
    pub direction: TextDirection,
    /// TrueType font for index pages; standard Helvetica when unset
    pub font_path: Option<PathBuf>,
    /// Build the artist index when any song names an artist
    pub artist_index: bool,
    /// Build one index per subfolder
    pub subfolder_indexes: bool,
    /// Prefix index rows with their running number ("3. Title")
    pub number_entries: bool,
    /// Make index rows clickable
    pub links: bool,
    /// Add one outline entry per song
    pub bookmarks: bool,
    /// Worker threads for page counting; defaults to available parallelism
    pub jobs: Option<usize>,
    /// Title written to the document Info dictionary
    pub document_title: Option<String>,
}

impl Default for SongbookConfig {
    fn default() -> Self {
        Self {
            layout: IndexLayout::default(),
            labels: Labels::default(),
            page_numbers: PageNumbering::default(),
            direction: TextDirection::LeftToRight,
            font_path: None,
            artist_index: true,
            subfolder_indexes: true,
            number_entries: true,
            links: true,
            bookmarks: true,
            jobs: None,
            document_title: None,
        }
    }
}

impl SongbookConfig {
    /// Number of page-count workers to run
    pub fn effective_jobs(&self) -> usize {
        self.jobs
            .filter(|&jobs| jobs > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }
}
