//! PDF Songbook CLI tool
//!
//! A command-line tool for assembling song sheet PDFs into a songbook.

use std::path::{Path, PathBuf};
use std::process;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pdf_songbook::config::{PageNumberPosition, SongbookConfig, TextDirection};
use pdf_songbook::index::Segment;
use pdf_songbook::songbook::SongbookBuilder;
use pdf_songbook::store::FsDocumentStore;

/// PDF Songbook - Assemble song sheets into one indexed songbook
#[derive(Parser)]
#[command(name = "pdf-songbook")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Build a songbook from every PDF under songs/
    pdf-songbook build songs -o Songbook.pdf

    # Hebrew songbook: right-to-left index, numbers on both edges
    pdf-songbook build shirim -o Shiron.pdf --rtl --page-numbers both --font DavidLibre.ttf

    # Show where every song will start without writing anything
    pdf-songbook plan songs")]
struct Cli {
    /// Log every step
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the PDFs under a folder into a songbook
    Build {
        /// Folder holding the song PDFs
        folder: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        options: BuildOptions,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Print the start page of every index and song without writing a file
    Plan {
        /// Folder holding the song PDFs
        folder: PathBuf,

        #[command(flatten)]
        options: BuildOptions,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(clap::Args)]
struct BuildOptions {
    /// Document title stored in the PDF metadata
    #[arg(long)]
    title: Option<String>,

    /// Title of the main index
    #[arg(long)]
    index_title: Option<String>,

    /// Where to stamp page numbers: left, right or both
    #[arg(long, default_value = "left", value_parser = parse_position)]
    page_numbers: PageNumberPosition,

    /// Lay out index rows right-to-left
    #[arg(long)]
    rtl: bool,

    /// TrueType font for index pages (default: Helvetica)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Skip the artist index
    #[arg(long)]
    no_artist_index: bool,

    /// Skip the per-subfolder indexes
    #[arg(long)]
    no_subfolder_indexes: bool,

    /// Do not number index rows
    #[arg(long)]
    no_numbering: bool,

    /// Do not make index rows clickable
    #[arg(long)]
    no_links: bool,

    /// Do not add bookmarks
    #[arg(long)]
    no_bookmarks: bool,

    /// Worker threads for reading page counts (default: all cores)
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl BuildOptions {
    fn into_config(self) -> SongbookConfig {
        let mut config = SongbookConfig::default();

        if let Some(index_title) = self.index_title {
            config.labels.main_title = index_title;
        }
        config.document_title = self.title;
        config.page_numbers.position = self.page_numbers;
        if self.rtl {
            config.direction = TextDirection::RightToLeft;
        }
        config.font_path = self.font;
        config.artist_index = !self.no_artist_index;
        config.subfolder_indexes = !self.no_subfolder_indexes;
        config.number_entries = !self.no_numbering;
        config.links = !self.no_links;
        config.bookmarks = !self.no_bookmarks;
        config.jobs = self.jobs;

        config
    }
}

fn parse_position(s: &str) -> Result<PageNumberPosition, String> {
    PageNumberPosition::parse(s)
        .ok_or_else(|| format!("expected left, right or both, got '{}'", s))
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Build { folder, output, options, open } => {
            cmd_build(&folder, &output, options, open)
        }
        Commands::Plan { folder, options } => cmd_plan(&folder, options),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Build the songbook
fn cmd_build(folder: &Path, output: &Path, options: BuildOptions, open: bool) -> Result<()> {
    let store = FsDocumentStore::new(folder).exclude(output);
    let builder = SongbookBuilder::new(options.into_config());

    let report = builder
        .build(&store, output)
        .with_context(|| format!("Failed to build songbook from {}", folder.display()))?;

    eprintln!(
        "Output: {} ({} pages: {} index pages, {} songs, {} links, {} bookmarks)",
        report.output.display(),
        report.total_pages,
        report.index_pages,
        report.documents,
        report.links,
        report.bookmarks
    );
    for path in &report.unreadable {
        eprintln!("Warning: {} could not be read and was left out", path.display());
    }

    if open {
        open_file(output)?;
    }

    Ok(())
}

/// Print the resolved page map
fn cmd_plan(folder: &Path, options: BuildOptions) -> Result<()> {
    let store = FsDocumentStore::new(folder);
    let builder = SongbookBuilder::new(options.into_config());

    let plan = builder
        .plan(&store)
        .with_context(|| format!("Failed to plan songbook from {}", folder.display()))?;
    let layout = &plan.layout;

    let mut index_number = 0;
    for segment in &layout.plan.segments {
        match segment {
            Segment::Index { spec, pages } => {
                let start = layout.page_map.index_start(index_number).unwrap_or(0);
                println!(
                    "{:>5}  [{:?} index] {} ({} pages, {} entries)",
                    start,
                    spec.kind,
                    spec.title,
                    pages,
                    spec.entries.len()
                );
                index_number += 1;
            }
            Segment::Documents { label, documents } => {
                println!("       -- {} --", label);
                for &id in documents {
                    let Some(doc) = plan.catalog.get(id) else { continue };
                    let start = layout.page_map.document_start(id).unwrap_or(0);
                    println!("{:>5}  {} ({} pages)", start, doc.display_title, doc.page_count);
                }
            }
        }
    }

    println!("Total: {} pages ({} index pages)", layout.total_pages, layout.index_pages);
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = pdf_songbook::pdf::extract_metadata(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}
