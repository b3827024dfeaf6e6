//! Drawing index pages

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use crate::config::{Labels, TextDirection};
use crate::error::{Error, Result};
use crate::index::budget::PageBudget;
use crate::index::resolver::PageMap;
use crate::index::spec::{IndexRow, IndexSpec};
use crate::layout::IndexLayout;
use crate::pdf::font::IndexFont;
use crate::pdf::text::TextShaper;

/// Resource name of the index font on every index page
const FONT_NAME: &str = "F1";

/// Where one entry row ended up
#[derive(Debug, Clone, PartialEq)]
pub struct RowPlacement {
    /// 0-based page inside the index
    pub page: usize,
    /// 0-based row slot on that page
    pub slot: usize,
    /// Position of the entry in `IndexSpec::entries`
    pub entry: usize,
    /// Baseline of the row
    pub baseline: f32,
    /// Absolute page printed in the page column
    pub target_page: usize,
    /// Left edge of the printed page number
    pub number_x: f32,
    pub number_width: f32,
}

/// Encoded page contents of one index
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedIndex {
    /// One content stream per page
    pub pages: Vec<Vec<u8>>,
    /// Entry rows in entry order
    pub rows: Vec<RowPlacement>,
}

impl RenderedIndex {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Standalone PDF holding the index pages
    pub fn to_document(&self, font: &IndexFont, layout: &IndexLayout) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = font.embed(&mut doc)?;
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { FONT_NAME => font_id },
        });

        let media_box: Vec<Object> = layout
            .page
            .media_box()
            .iter()
            .map(|&v| Object::Real(v))
            .collect();

        let mut kids = Vec::with_capacity(self.pages.len());
        for content in &self.pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }
}

/// Draws index specs onto pages
pub struct IndexRenderer<'a> {
    pub layout: &'a IndexLayout,
    pub labels: &'a Labels,
    pub budget: PageBudget,
    pub font: &'a IndexFont,
    pub shaper: &'a dyn TextShaper,
    pub direction: TextDirection,
    /// Prefix entries with "{n}. "
    pub number_entries: bool,
}

impl IndexRenderer<'_> {
    /// Draw `spec` with page numbers taken from `page_map`
    ///
    /// Pages break after exactly `budget.entries_per_page()` rows, so the page
    /// count always equals `budget.estimate(spec.row_count())`.
    pub fn render(&self, spec: &IndexSpec, page_map: &PageMap) -> Result<RenderedIndex> {
        let rows = spec.rows();
        let per_page = self.budget.entries_per_page();

        let mut pages = Vec::with_capacity(self.budget.estimate(rows.len()));
        let mut placements = Vec::with_capacity(spec.entries.len());

        for (page, chunk) in rows.chunks(per_page).enumerate() {
            let mut ops = Vec::new();

            if page == 0 {
                self.draw_title(&mut ops, &spec.title);
            }
            self.draw_headers(&mut ops);

            for (slot, row) in chunk.iter().enumerate() {
                let baseline = self.layout.row_baseline(slot);
                match row {
                    IndexRow::Heading(text) => self.draw_heading(&mut ops, text, baseline),
                    IndexRow::Entry(i, entry) => {
                        let start = page_map.document_start(entry.target).ok_or_else(|| {
                            Error::PageOffsetDivergence(format!(
                                "no start page for '{}'",
                                entry.display_text
                            ))
                        })?;
                        let target_page = start + entry.target_page_within_document - 1;

                        let label = if self.number_entries {
                            format!("{}. {}", i + 1, entry.display_text)
                        } else {
                            entry.display_text.clone()
                        };

                        let (number_x, number_width) =
                            self.draw_entry(&mut ops, &label, target_page, baseline);

                        placements.push(RowPlacement {
                            page,
                            slot,
                            entry: *i,
                            baseline,
                            target_page,
                            number_x,
                            number_width,
                        });
                    }
                }
            }

            pages.push(Content { operations: ops }.encode()?);
        }

        Ok(RenderedIndex {
            pages,
            rows: placements,
        })
    }

    fn draw_title(&self, ops: &mut Vec<Operation>, title: &str) {
        let size = self.layout.title_font_size;
        let shaped = self.shaper.shape(title);
        let x = self.title_side_x(&shaped, size);
        push_text(ops, self.font, x, self.layout.title_baseline(), size, &shaped);
    }

    fn draw_headers(&self, ops: &mut Vec<Operation>) {
        let size = self.layout.header_font_size;
        let y = self.layout.header_baseline();

        let title = self.shaper.shape(&self.labels.column_title);
        push_text(ops, self.font, self.title_side_x(&title, size), y, size, &title);

        let page = self.shaper.shape(&self.labels.column_page);
        push_text(ops, self.font, self.number_side_x(&page, size), y, size, &page);

        // Rule between headers and rows
        let rule_y = y - self.layout.line_spacing.pt() as f32 * 0.35;
        ops.push(Operation::new("w", vec![0.75f32.into()]));
        ops.push(Operation::new("m", vec![self.layout.left_edge().into(), rule_y.into()]));
        ops.push(Operation::new("l", vec![self.layout.right_edge().into(), rule_y.into()]));
        ops.push(Operation::new("S", vec![]));
    }

    fn draw_heading(&self, ops: &mut Vec<Operation>, text: &str, baseline: f32) {
        let size = self.layout.header_font_size;
        let shaped = self.shaper.shape(text);
        push_text(ops, self.font, self.title_side_x(&shaped, size), baseline, size, &shaped);
    }

    /// Draw one entry row; returns x and width of the page number
    fn draw_entry(
        &self,
        ops: &mut Vec<Operation>,
        label: &str,
        target_page: usize,
        baseline: f32,
    ) -> (f32, f32) {
        let size = self.layout.entry_font_size;
        let gap = self.layout.leader_gap.pt() as f32;

        let text = self.shaper.shape(label);
        let text_width = self.font.text_width(&text, size);
        let text_x = self.title_side_x(&text, size);
        push_text(ops, self.font, text_x, baseline, size, &text);

        let number = target_page.to_string();
        let number_width = self.font.text_width(&number, size);
        let number_x = self.number_side_x(&number, size);
        push_text(ops, self.font, number_x, baseline, size, &number);

        // Leaders fill the space between the two columns
        let (from, to) = match self.direction {
            TextDirection::LeftToRight => (text_x + text_width + gap, number_x - gap),
            TextDirection::RightToLeft => (number_x + number_width + gap, text_x - gap),
        };
        let dot_width = self.font.text_width(".", size);
        if dot_width > 0.0 && to > from {
            let count = ((to - from) / dot_width).floor() as usize;
            if count > 0 {
                let leader = ".".repeat(count);
                let leader_x = match self.direction {
                    TextDirection::LeftToRight => to - count as f32 * dot_width,
                    TextDirection::RightToLeft => from,
                };
                push_text(ops, self.font, leader_x, baseline, size, &leader);
            }
        }

        (number_x, number_width)
    }

    /// x of text in the title column
    fn title_side_x(&self, text: &str, size: f32) -> f32 {
        match self.direction {
            TextDirection::LeftToRight => self.layout.left_edge(),
            TextDirection::RightToLeft => self.layout.right_edge() - self.font.text_width(text, size),
        }
    }

    /// x of text in the page number column
    fn number_side_x(&self, text: &str, size: f32) -> f32 {
        match self.direction {
            TextDirection::LeftToRight => self.layout.right_edge() - self.font.text_width(text, size),
            TextDirection::RightToLeft => self.layout.left_edge(),
        }
    }
}

fn push_text(ops: &mut Vec<Operation>, font: &IndexFont, x: f32, y: f32, size: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![FONT_NAME.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![font.encode(text)]));
    ops.push(Operation::new("ET", vec![]));
}
