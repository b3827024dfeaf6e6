//! Index page budget

use crate::error::{Error, Result};
use crate::layout::IndexLayout;

/// How many pages an index needs for a given number of rows
///
/// Every index kind uses the same budget, and the renderer breaks pages after
/// exactly [`PageBudget::entries_per_page`] rows, so the estimate is also the
/// rendered page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    entries_per_page: usize,
}

impl PageBudget {
    /// `floor((page height - fixed margins) / line spacing)` rows per page
    pub fn new(layout: &IndexLayout) -> Result<Self> {
        let exact = layout.rows_per_page_exact();
        if !exact.is_finite() {
            return Err(Error::PageOffsetDivergence(format!(
                "rows per index page is not finite ({})",
                exact
            )));
        }

        let rows = exact.floor();
        if rows < 1.0 {
            return Err(Error::PageOffsetDivergence(format!(
                "index layout leaves room for {} rows per page",
                rows
            )));
        }

        Self::with_entries_per_page(rows as usize)
    }

    pub fn with_entries_per_page(entries_per_page: usize) -> Result<Self> {
        if entries_per_page == 0 {
            return Err(Error::PageOffsetDivergence(
                "index pages must hold at least one row".to_string(),
            ));
        }
        Ok(Self { entries_per_page })
    }

    pub fn entries_per_page(&self) -> usize {
        self.entries_per_page
    }

    /// Pages needed for `entry_count` rows; zero rows need zero pages
    pub fn estimate(&self, entry_count: usize) -> usize {
        entry_count.div_ceil(self.entries_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Length;

    #[test]
    fn test_estimate_is_ceiling_division() {
        let budget = PageBudget::with_entries_per_page(24).unwrap();
        assert_eq!(budget.estimate(0), 0);
        assert_eq!(budget.estimate(1), 1);
        assert_eq!(budget.estimate(24), 1);
        assert_eq!(budget.estimate(25), 2);
        assert_eq!(budget.estimate(48), 2);
        assert_eq!(budget.estimate(49), 3);
    }

    #[test]
    fn test_estimate_matches_formula_and_is_monotonic() {
        for per_page in [1usize, 7, 24, 40] {
            let budget = PageBudget::with_entries_per_page(per_page).unwrap();
            let mut previous = 0;
            for n in 0..=500usize {
                let pages = budget.estimate(n);
                let expected = (n as f64 / per_page as f64).ceil() as usize;
                assert_eq!(pages, expected, "n={} per_page={}", n, per_page);
                assert!(pages >= previous);
                previous = pages;
            }
        }
    }

    #[test]
    fn test_default_layout_budget() {
        let budget = PageBudget::new(&IndexLayout::default()).unwrap();
        assert_eq!(budget.entries_per_page(), 24);
    }

    #[test]
    fn test_zero_line_spacing_diverges() {
        let layout = IndexLayout {
            line_spacing: Length::from_mm(0.0),
            ..IndexLayout::default()
        };
        assert!(matches!(
            PageBudget::new(&layout),
            Err(Error::PageOffsetDivergence(_))
        ));
    }

    #[test]
    fn test_margins_larger_than_page_diverge() {
        let layout = IndexLayout {
            fixed_margins: Length::from_cm(40.0),
            ..IndexLayout::default()
        };
        assert!(PageBudget::new(&layout).is_err());
        assert!(PageBudget::with_entries_per_page(0).is_err());
    }
}
