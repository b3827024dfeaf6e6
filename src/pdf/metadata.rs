//! PDF metadata: page counts and the document Info dictionary

use std::path::Path;
use chrono::{DateTime, Local};
use lopdf::{Dictionary, Document, Object, StringFormat};
use crate::error::{Error, Result};
use crate::pdf::text::pdf_text_string;

/// Read the Count field from the catalog's Pages dictionary
///
/// Broken producers sometimes write a wrong Count, so this is only used as a
/// cross-check against the walked page tree.
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc.catalog()?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(|p| p.as_reference())
        .map_err(|_| Error::General("No Pages reference in catalog".to_string()))?;

    let pages_dict = doc.get_dictionary(pages_id)?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(Error::General("Count is not a non-negative integer".to_string())),
        Err(_) => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

/// Count the pages of a loaded document
///
/// The walked page tree is authoritative because it is exactly what gets
/// appended during assembly.
pub fn document_page_count(doc: &Document, path: &Path) -> usize {
    let walked = doc.get_pages().len();

    match count_pages_from_catalog(doc) {
        Ok(declared) if declared != walked => {
            log::warn!(
                "{} declares {} pages but its page tree has {}",
                path.display(),
                declared,
                walked
            );
        }
        Ok(_) => {}
        Err(e) => log::debug!("{}: {}", path.display(), e),
    }

    walked
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    Ok(document_page_count(&doc, path))
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = document_page_count(&doc, path);

    let info = doc
        .trailer
        .get(b"Info")
        .and_then(|info| info.as_reference())
        .and_then(|id| doc.get_dictionary(id))
        .ok();

    let read = |key: &[u8]| -> Option<String> {
        let bytes = info?.get(key).ok()?.as_str().ok()?;
        decode_text_string(bytes)
    };

    Ok(PdfMetadata {
        page_count,
        title: read(b"Title"),
        author: read(b"Author"),
    })
}

/// Decode a PDF text string (UTF-16BE with BOM, or single-byte)
fn decode_text_string(bytes: &[u8]) -> Option<String> {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}

/// Format a timestamp as a PDF date string
pub fn pdf_date(time: &DateTime<Local>) -> String {
    let offset = time.format("%z").to_string();
    let (hours, minutes) = offset.split_at(offset.len().saturating_sub(2));
    format!("D:{}{}'{}'", time.format("%Y%m%d%H%M%S"), hours, minutes)
}

/// Write Title, Producer and CreationDate into the document Info dictionary
pub fn write_info(doc: &mut Document, title: &str, created: &DateTime<Local>) -> Result<()> {
    let mut info = Dictionary::new();
    info.set("Title", pdf_text_string(title));
    info.set(
        "Producer",
        Object::String(
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).into_bytes(),
            StringFormat::Literal,
        ),
    );
    info.set(
        "CreationDate",
        Object::String(pdf_date(created).into_bytes(), StringFormat::Literal),
    );

    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));

    Ok(())
}
