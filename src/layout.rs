//! Page layout calculations for index pages

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from centimeters
    pub fn from_cm(cm: f64) -> Self {
        Length(cm * 10.0)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }

    /// MediaBox array for a page of this size
    pub fn media_box(&self) -> [f32; 4] {
        [0.0, 0.0, self.width.pt() as f32, self.height.pt() as f32]
    }
}

/// Geometry shared by index sizing, index drawing and link placement
///
/// All vertical offsets are measured down from the top edge of the page.
/// Every index page holds the same number of rows, so the first row sits at
/// `first_row_offset` on every page and each following row is one
/// `line_spacing` lower.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexLayout {
    pub page: PageDimensions,
    /// Left and right margin for text columns
    pub side_margin: Length,
    /// Baseline of the index title
    pub title_offset: Length,
    /// Baseline of the column headers
    pub header_offset: Length,
    /// Baseline of the first entry row
    pub first_row_offset: Length,
    /// Vertical space on a page not available to entry rows
    pub fixed_margins: Length,
    /// Distance between two entry rows
    pub line_spacing: Length,
    /// Gap between a text column and its dot leader
    pub leader_gap: Length,
    pub title_font_size: f32,
    pub header_font_size: f32,
    pub entry_font_size: f32,
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            page: PageDimensions::a4(),
            side_margin: Length::from_cm(2.0),
            title_offset: Length::from_cm(2.0),
            header_offset: Length::from_cm(3.5),
            first_row_offset: Length::from_cm(4.7),
            fixed_margins: Length::from_cm(5.5),
            line_spacing: Length::from_cm(1.0),
            leader_gap: Length::from_cm(0.3),
            title_font_size: 20.0,
            header_font_size: 16.0,
            entry_font_size: 14.0,
        }
    }
}

impl IndexLayout {
    /// Rows that fit on one page before flooring; may be non-finite for degenerate layouts
    pub fn rows_per_page_exact(&self) -> f64 {
        (self.page.height.pt() - self.fixed_margins.pt()) / self.line_spacing.pt()
    }

    pub fn page_width(&self) -> f32 {
        self.page.width.pt() as f32
    }

    pub fn page_height(&self) -> f32 {
        self.page.height.pt() as f32
    }

    /// Baseline y (PDF coordinates, bottom-left origin) of the title
    pub fn title_baseline(&self) -> f32 {
        (self.page.height.pt() - self.title_offset.pt()) as f32
    }

    /// Baseline y of the column headers
    pub fn header_baseline(&self) -> f32 {
        (self.page.height.pt() - self.header_offset.pt()) as f32
    }

    /// Baseline y of row `slot` (0-based position on its page)
    pub fn row_baseline(&self, slot: usize) -> f32 {
        let top = self.page.height.pt() - self.first_row_offset.pt();
        (top - slot as f64 * self.line_spacing.pt()) as f32
    }

    /// Left edge of the usable text area
    pub fn left_edge(&self) -> f32 {
        self.side_margin.pt() as f32
    }

    /// Right edge of the usable text area
    pub fn right_edge(&self) -> f32 {
        (self.page.width.pt() - self.side_margin.pt()) as f32
    }
}
