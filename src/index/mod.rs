//! Index generation
//!
//! Building index descriptions from the catalog, sizing them, fixing every
//! start page and drawing the pages.

pub mod budget;
pub mod builder;
pub mod render;
pub mod resolver;
pub mod spec;

pub use budget::PageBudget;
pub use builder::build_specs;
pub use render::{IndexRenderer, RenderedIndex, RowPlacement};
pub use resolver::{resolve, AssemblyPlan, PageMap, ResolvedLayout, Segment, SegmentId};
pub use spec::{IndexEntry, IndexKind, IndexRow, IndexSpec, Subheading};
