/// PDF text extraction using pdf-extract
use super::ExtractionError;
use std::path::Path;

/// Extract the text of every page, in page order.
///
/// Vertical gaps between text blocks come out as blank lines, so paragraphs
/// laid out apart on the page end up separated by `"\n\n"`.
pub(super) fn extract_pdf_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let corrupt = |message: String| ExtractionError::Corrupt {
        path: path.to_path_buf(),
        message,
    };

    // pdf-extract panics on some malformed font data
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
        .map_err(|_| corrupt("PDF parser panicked".to_string()))?
        .map_err(|e| corrupt(e.to_string()))?;

    tracing::debug!(
        "Extracted {} chars of PDF text from {}",
        text.len(),
        path.display()
    );

    Ok(strip_layout_breaks(&text).to_string())
}

/// Drop the line breaks emitted for the space above the first text block
/// and below the last one. Interior breaks are kept untouched.
fn strip_layout_breaks(text: &str) -> &str {
    text.trim_matches(|c: char| c == '\n' || c == '\r')
}
