//! Report codec: lossless JSON interchange plus a one-way HTML render.
//!
//! `decode(encode(doc)) == doc` holds for every document. Field names are
//! camelCase, optional values are written as `null`, and floats are written
//! in their shortest round-tripping form.

mod html;

pub use html::{MESSAGE_CHAR_LIMIT, render, truncate_chars};

use crate::error::ReportError;
use crate::models::DiagnosticDocument;
use std::fs;
use std::path::Path;
use tracing::info;

/// Default cap on rendered event rows.
pub const DEFAULT_MAX_EVENT_ROWS: usize = 100;

/// Serializes a document to pretty-printed interchange JSON.
pub fn encode(doc: &DiagnosticDocument) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Parses interchange JSON. Missing fields take their empty defaults and
/// unknown fields are ignored.
pub fn decode(text: &str) -> Result<DiagnosticDocument, ReportError> {
    Ok(serde_json::from_str(text)?)
}

pub fn export_json(doc: &DiagnosticDocument, path: &Path) -> Result<(), ReportError> {
    let text = encode(doc)?;
    write_file(path, &text)?;
    info!(path = %path.display(), "JSON report written");
    Ok(())
}

pub fn export_html(
    doc: &DiagnosticDocument,
    lookback_days: u32,
    max_event_rows: usize,
    path: &Path,
) -> Result<(), ReportError> {
    let page = render(doc, lookback_days, max_event_rows)?;
    write_file(path, &page)?;
    info!(path = %path.display(), "HTML report written");
    Ok(())
}

pub fn import_json(path: &Path) -> Result<DiagnosticDocument, ReportError> {
    let text = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = decode(&text)?;
    info!(path = %path.display(), events = doc.events.len(), "JSON report imported");
    Ok(doc)
}

fn write_file(path: &Path, contents: &str) -> Result<(), ReportError> {
    let wrap = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, contents).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_non_json() {
        assert!(matches!(decode("<html>"), Err(ReportError::Serialization(_))));
    }

    #[test]
    fn export_creates_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/out/diagnostic.json");
        export_json(&DiagnosticDocument::default(), &path).unwrap();
        assert_eq!(import_json(&path).unwrap(), DiagnosticDocument::default());
    }

    #[test]
    fn import_of_missing_file_names_the_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.json");
        let err = import_json(&path).unwrap_err();
        assert!(matches!(err, ReportError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}
