//! Integration tests for the songbook pipeline

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdf_songbook::config::SongbookConfig;
use pdf_songbook::pdf::{count_pages, extract_metadata};
use pdf_songbook::songbook::SongbookBuilder;
use pdf_songbook::store::{FsDocumentStore, SEPARATE_MARKER};
use pdf_songbook::Error;
use tempfile::TempDir;

/// Write a song sheet with `pages` pages of text
fn write_song(path: &Path, pages: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let title = path.file_stem().unwrap().to_string_lossy().into_owned();
    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("{} ({})", title, n))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    // Resources and MediaBox are inherited from the page tree root
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).unwrap();
}

struct Songbook {
    _dir: TempDir,
    root: PathBuf,
    output: PathBuf,
}

impl Songbook {
    fn new(songs: &[(&str, usize)]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = dir.path().join("songs");
        for (name, pages) in songs {
            write_song(&root.join(format!("{}.pdf", name)), *pages);
        }
        let output = dir.path().join("Songbook.pdf");
        Self { _dir: dir, root, output }
    }

    fn store(&self) -> FsDocumentStore {
        FsDocumentStore::new(&self.root).exclude(&self.output)
    }

    fn build(&self, config: SongbookConfig) -> pdf_songbook::BuildReport {
        SongbookBuilder::new(config)
            .build(&self.store(), &self.output)
            .expect("Failed to build songbook")
    }

    fn load(&self) -> Document {
        Document::load(&self.output).expect("Failed to load songbook")
    }
}

/// Page number of every page object
fn page_numbers(doc: &Document) -> HashMap<ObjectId, u32> {
    doc.get_pages().into_iter().map(|(n, id)| (id, n)).collect()
}

/// Destination page of every link on `page`, in annotation order
fn link_targets(doc: &Document, page: u32) -> Vec<u32> {
    let numbers = page_numbers(doc);
    let page_id = doc.get_pages()[&page];
    let page = doc.get_dictionary(page_id).unwrap();

    let annots = match page.get(b"Annots") {
        Ok(Object::Array(arr)) => arr.clone(),
        _ => return Vec::new(),
    };

    annots
        .iter()
        .map(|annot| {
            let annot = doc.get_dictionary(annot.as_reference().unwrap()).unwrap();
            let action = annot.get(b"A").unwrap().as_dict().unwrap();
            let dest = action.get(b"D").unwrap().as_array().unwrap();
            numbers[&dest[0].as_reference().unwrap()]
        })
        .collect()
}

/// Bookmark titles with their destination pages
fn bookmarks(doc: &Document) -> Vec<(String, u32)> {
    let numbers = page_numbers(doc);
    let catalog = doc.catalog().unwrap();
    let Ok(outline_ref) = catalog.get(b"Outlines") else {
        return Vec::new();
    };
    let outline = doc.get_dictionary(outline_ref.as_reference().unwrap()).unwrap();

    let mut items = Vec::new();
    let mut next = outline.get(b"First").and_then(Object::as_reference).ok();
    while let Some(id) = next {
        let item = doc.get_dictionary(id).unwrap();
        let title = String::from_utf8_lossy(item.get(b"Title").unwrap().as_str().unwrap()).into_owned();
        let dest = item.get(b"Dest").unwrap().as_array().unwrap();
        items.push((title, numbers[&dest[0].as_reference().unwrap()]));
        next = item.get(b"Next").and_then(Object::as_reference).ok();
    }
    items
}

fn has_page_number(doc: &Document, page: u32) -> bool {
    let page_id = doc.get_pages()[&page];
    let page = doc.get_dictionary(page_id).unwrap();
    page.get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|res| res.get(b"XObject"))
        .and_then(Object::as_dict)
        .map(|xobjects| xobjects.has(b"PageNumber"))
        .unwrap_or(false)
}

#[test]
fn test_three_songs_main_index_points_at_pages_2_to_4() {
    let book = Songbook::new(&[("B", 1), ("A", 1), ("C", 1)]);
    let report = book.build(SongbookConfig::default());

    assert_eq!(report.indexes, 1);
    assert_eq!(report.index_pages, 1);
    assert_eq!(report.total_pages, 4);
    assert_eq!(count_pages(&book.output).unwrap(), 4);

    let doc = book.load();
    assert_eq!(link_targets(&doc, 1), vec![2, 3, 4]);
    assert_eq!(
        bookmarks(&doc),
        vec![("A".to_string(), 2), ("B".to_string(), 3), ("C".to_string(), 4)]
    );
}

#[test]
fn test_page_count_is_sum_of_indexes_and_songs() {
    let book = Songbook::new(&[
        ("Song1 - Alice", 2),
        ("Song2 - Bob", 3),
        ("Song3", 1),
    ]);
    let report = book.build(SongbookConfig::default());

    // Main and artist index, one page each
    assert_eq!(report.indexes, 2);
    assert_eq!(report.index_pages, 2);
    assert_eq!(report.total_pages, 2 + 6);
    assert_eq!(count_pages(&book.output).unwrap(), report.total_pages);

    let doc = book.load();
    // Main: Song1 - Alice, Song2 - Bob, Song3
    assert_eq!(link_targets(&doc, 1), vec![3, 5, 8]);
    // Artist: Alice - Song1, Bob - Song2, then the no-artist song
    assert_eq!(link_targets(&doc, 2), vec![3, 5, 8]);
}

#[test]
fn test_song_pages_are_numbered_and_indexes_are_not() {
    let book = Songbook::new(&[("A", 2), ("B", 1)]);
    book.build(SongbookConfig::default());

    let doc = book.load();
    assert!(!has_page_number(&doc, 1));
    assert!(has_page_number(&doc, 2));
    assert!(has_page_number(&doc, 3));
    assert!(has_page_number(&doc, 4));
}

#[test]
fn test_separated_songs_come_after_all_others() {
    let book = Songbook::new(&[("Zebra", 1), ("Apple", 2)]);
    let xmas = book.root.join("Christmas");
    write_song(&xmas.join("Away in a Manger.pdf"), 1);
    write_song(&xmas.join("Silent Night.pdf"), 2);
    fs::write(xmas.join(SEPARATE_MARKER), b"").unwrap();

    let report = book.build(SongbookConfig::default());
    // Main index and the separated index
    assert_eq!(report.indexes, 2);
    assert_eq!(report.total_pages, 2 + 6);

    let doc = book.load();
    // Bookmarks follow discovery order; pages follow the book layout
    assert_eq!(
        bookmarks(&doc),
        vec![
            ("Apple".to_string(), 3),
            ("Away in a Manger".to_string(), 6),
            ("Silent Night".to_string(), 7),
            ("Zebra".to_string(), 5),
        ]
    );

    // Main index lists only the regular songs; the separated index its own
    assert_eq!(link_targets(&doc, 1), vec![3, 5]);
    assert_eq!(link_targets(&doc, 2), vec![6, 7]);
}

#[test]
fn test_unreadable_song_is_counted_as_empty() {
    let book = Songbook::new(&[("Good", 2)]);
    fs::write(book.root.join("Broken.pdf"), b"this is not a pdf").unwrap();

    let report = book.build(SongbookConfig::default());
    assert_eq!(report.documents, 2);
    assert_eq!(report.unreadable.len(), 1);
    assert!(report.unreadable[0].ends_with("Broken.pdf"));
    assert_eq!(report.total_pages, 1 + 2);
    assert_eq!(count_pages(&book.output).unwrap(), 3);
}

#[test]
fn test_write_failure_leaves_no_output() {
    let book = Songbook::new(&[("A", 1)]);
    let output = book.root.join("missing").join("Songbook.pdf");

    let result = SongbookBuilder::new(SongbookConfig::default()).build(&book.store(), &output);
    assert!(matches!(result, Err(Error::OutputWrite { .. })));
    assert!(!output.exists());
}

#[test]
fn test_plan_writes_nothing() {
    let book = Songbook::new(&[("A", 3), ("B", 1)]);

    let plan = SongbookBuilder::new(SongbookConfig::default())
        .plan(&book.store())
        .unwrap();
    assert_eq!(plan.layout.total_pages, 5);
    assert!(!book.output.exists());
}

#[test]
fn test_toggles_disable_links_and_bookmarks() {
    let book = Songbook::new(&[("A", 1), ("B", 1)]);
    let config = SongbookConfig {
        links: false,
        bookmarks: false,
        ..SongbookConfig::default()
    };
    let report = book.build(config);
    assert_eq!(report.links, 0);
    assert_eq!(report.bookmarks, 0);

    let doc = book.load();
    assert!(link_targets(&doc, 1).is_empty());
    assert!(bookmarks(&doc).is_empty());
}

#[test]
fn test_ordered_list_builds_custom_index() {
    let book = Songbook::new(&[("Alpha", 1), ("Beta", 1), ("Gamma", 1)]);
    fs::write(book.root.join("order.txt"), "Gamma\nNowhere\nAlpha\n").unwrap();

    let report = book.build(SongbookConfig::default());
    assert_eq!(report.indexes, 2);

    let doc = book.load();
    // Songs start at page 3: Alpha 3, Beta 4, Gamma 5
    assert_eq!(link_targets(&doc, 2), vec![5, 3]);
}

#[test]
fn test_info_reads_title_back() {
    let book = Songbook::new(&[("A", 1)]);
    let config = SongbookConfig {
        document_title: Some("Campfire Songs".to_string()),
        ..SongbookConfig::default()
    };
    book.build(config);

    let metadata = extract_metadata(&book.output).unwrap();
    assert_eq!(metadata.page_count, 2);
    assert_eq!(metadata.title.as_deref(), Some("Campfire Songs"));
}
