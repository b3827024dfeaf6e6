//! Index descriptions

use crate::catalog::DocumentId;

/// Kind of a generated index, in the order indexes appear in the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKind {
    Main,
    Artist,
    Custom,
    Subfolder,
    Separated,
}

/// One listed item pointing at a document
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub display_text: String,
    pub target: DocumentId,
    /// 1-based page inside the target document
    pub target_page_within_document: usize,
}

impl IndexEntry {
    pub fn new(display_text: impl Into<String>, target: DocumentId) -> Self {
        Self {
            display_text: display_text.into(),
            target,
            target_page_within_document: 1,
        }
    }
}

/// A heading row drawn before the entry at `before_entry`
#[derive(Debug, Clone, PartialEq)]
pub struct Subheading {
    pub before_entry: usize,
    pub text: String,
}

/// One row of an index in display order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexRow<'a> {
    Heading(&'a str),
    /// Entry with its position in `IndexSpec::entries`
    Entry(usize, &'a IndexEntry),
}

/// Everything needed to draw one index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub kind: IndexKind,
    pub title: String,
    pub entries: Vec<IndexEntry>,
    /// Heading rows; sorted by `before_entry`
    pub subheadings: Vec<Subheading>,
}

impl IndexSpec {
    pub fn new(kind: IndexKind, title: impl Into<String>, entries: Vec<IndexEntry>) -> Self {
        Self {
            kind,
            title: title.into(),
            entries,
            subheadings: Vec::new(),
        }
    }

    /// Rows occupied on the page: entries plus heading rows
    pub fn row_count(&self) -> usize {
        self.entries.len() + self.subheadings.len()
    }

    /// Rows in drawing order
    pub fn rows(&self) -> Vec<IndexRow<'_>> {
        let mut rows = Vec::with_capacity(self.row_count());
        let mut headings = self.subheadings.iter().peekable();

        for (i, entry) in self.entries.iter().enumerate() {
            while let Some(heading) = headings.next_if(|h| h.before_entry <= i) {
                rows.push(IndexRow::Heading(&heading.text));
            }
            rows.push(IndexRow::Entry(i, entry));
        }
        // Headings after the last entry still occupy a row
        rows.extend(headings.map(|h| IndexRow::Heading(h.text.as_str())));

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_interleave_headings() {
        let mut spec = IndexSpec::new(
            IndexKind::Artist,
            "By Artist",
            vec![
                IndexEntry::new("Alice - Song1", DocumentId(0)),
                IndexEntry::new("Song3", DocumentId(2)),
            ],
        );
        spec.subheadings.push(Subheading {
            before_entry: 1,
            text: "Other".to_string(),
        });

        assert_eq!(spec.row_count(), 3);
        let rows = spec.rows();
        assert!(matches!(rows[0], IndexRow::Entry(0, _)));
        assert_eq!(rows[1], IndexRow::Heading("Other"));
        assert!(matches!(rows[2], IndexRow::Entry(1, _)));
    }

    #[test]
    fn test_entry_defaults_to_first_page() {
        let entry = IndexEntry::new("A", DocumentId(3));
        assert_eq!(entry.target_page_within_document, 1);
    }
}
