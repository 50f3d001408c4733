//! Text extraction from input files
//!
//! Files are dispatched by extension: PDFs go through the binary-document
//! extractor, recognized source/text extensions are read verbatim, anything
//! else is ignored.

mod pdf;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt document {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Unsupported text encoding in {path}: {message}")]
    Encoding { path: PathBuf, message: String },

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// How a file's text is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Paged binary document (PDF)
    BinaryDocument,
    /// Plain text or source code, read as-is
    PlainSource,
}

impl DocumentKind {
    /// Classify a path by extension, `None` for files that should be skipped.
    ///
    /// `source_extensions` lists the extensions (without dot) treated as
    /// plain source. Matching is case-insensitive.
    pub fn from_path(path: &Path, source_extensions: &[String]) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("pdf") {
            return Some(Self::BinaryDocument);
        }
        source_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
            .then_some(Self::PlainSource)
    }
}

/// A file selected for ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

/// List the files in `dir` (non-recursive) that have a known kind.
///
/// Entries are sorted by file name so that document positions are stable
/// between runs over the same folder.
pub fn scan_directory(
    dir: &Path,
    source_extensions: &[String],
) -> Result<Vec<SourceFile>, ExtractionError> {
    let io_err = |source| ExtractionError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        match DocumentKind::from_path(&path, source_extensions) {
            Some(kind) => files.push(SourceFile { path, kind }),
            None => tracing::debug!("Ignoring unsupported file: {}", path.display()),
        }
    }

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}

/// Extract the full text of a file.
pub fn extract(path: &Path, kind: DocumentKind) -> Result<String, ExtractionError> {
    match kind {
        DocumentKind::BinaryDocument => pdf::extract_pdf_text(path),
        DocumentKind::PlainSource => extract_plain_source(path),
    }
}

/// Extract on the blocking pool; PDF parsing is CPU bound.
pub async fn extract_async(path: PathBuf, kind: DocumentKind) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract(&path, kind))
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
}

fn extract_plain_source(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    String::from_utf8(bytes).map_err(|e| ExtractionError::Encoding {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
