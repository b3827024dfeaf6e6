//! PDF manipulation module

pub mod assemble;
pub mod font;
pub mod links;
pub mod metadata;
pub mod outline;
pub mod overlay;
pub mod text;
pub mod writer;

// Re-export commonly used items
pub use assemble::{assemble, merge_documents};
pub use font::IndexFont;
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
pub use text::{PassthroughShaper, TextShaper};
pub use writer::write_atomic;
