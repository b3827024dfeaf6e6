//! Writing the finished songbook

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use lopdf::Document;
use tempfile::NamedTempFile;
use crate::error::{Error, Result};

/// Compress `doc` and write it to `path`
///
/// The document is written to a temporary file next to `path` and renamed
/// into place once complete. On any failure the temporary file is removed and
/// `path` is left as it was.
pub fn write_atomic(doc: &mut Document, path: &Path) -> Result<u64> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let fail = |source: std::io::Error| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    doc.compress();

    let temp = tempfile::Builder::new()
        .prefix(".songbook-")
        .suffix(".pdf.tmp")
        .tempfile_in(&dir)
        .map_err(fail)?;

    let temp = write_to(doc, temp).map_err(fail)?;

    temp.persist(path).map_err(|e| fail(e.error))?;

    let size = fs::metadata(path).map(|m| m.len()).map_err(fail)?;
    log::info!("Wrote {} ({} bytes)", path.display(), size);

    Ok(size)
}

fn write_to(doc: &mut Document, temp: NamedTempFile) -> std::io::Result<NamedTempFile> {
    {
        let mut writer = BufWriter::new(temp.as_file());
        doc.save_to(&mut writer)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    Ok(temp)
}
