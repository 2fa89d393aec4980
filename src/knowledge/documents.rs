//! Free-text knowledge sources.

use crate::error::{LuchError, Result};
use std::path::Path;
use tracing::debug;

/// Extract text from a document source.
///
/// PDFs go through `pdf-extract`; any other extension is read as UTF-8 text.
pub fn read_document_text(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if !is_pdf {
        return read_narrative_text(path);
    }

    let bytes = std::fs::read(path)?;
    debug!("Extracting text from PDF ({} bytes)", bytes.len());

    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        LuchError::Source(format!("failed to extract text from {}: {}", path.display(), e))
    })?;

    Ok(tidy_extracted_text(&text))
}

/// Read a plain text source.
pub fn read_narrative_text(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Collapse the runs of blank lines PDF extraction tends to leave behind.
fn tidy_extracted_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
