//! Paragraph chunking and chunk identifiers
//!
//! Text is split on blank lines (`"\n\n"`). Short fragments are not merged
//! and long paragraphs are not split further.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Paragraph separator
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Raw text extracted from one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Position of the file in the input batch
    pub source_index: usize,
    pub path: std::path::PathBuf,
    pub text: String,
}

/// Identifier of a chunk: the document it came from and its paragraph position.
///
/// Rendered as `"{document}_{position}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId {
    pub document: usize,
    pub position: usize,
}

impl ChunkId {
    pub fn new(document: usize, position: usize) -> Self {
        Self { document, position }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.document, self.position)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid chunk id '{0}': expected '<document>_<position>'")]
pub struct ParseChunkIdError(String);

impl FromStr for ChunkId {
    type Err = ParseChunkIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseChunkIdError(s.to_string());
        let (document, position) = s.split_once('_').ok_or_else(err)?;

        // usize::from_str accepts a leading '+', which would break the
        // one-string-per-id mapping
        let parse = |part: &str| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            part.parse::<usize>().map_err(|_| err())
        };

        Ok(Self {
            document: parse(document)?,
            position: parse(position)?,
        })
    }
}

/// A paragraph of a document, ready to be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
}

/// Split text on blank lines.
///
/// Always returns at least one element; `chunk("")` is `[""]`. Joining the
/// result with [`PARAGRAPH_BREAK`] gives back the input unchanged.
pub fn chunk(text: &str) -> Vec<String> {
    text.split(PARAGRAPH_BREAK).map(str::to_string).collect()
}

/// Chunk a document and assign ids.
///
/// Positions are assigned before blank chunks are dropped, so an id always
/// names the paragraph's real position in the document.
pub fn chunk_document(document: &Document) -> Vec<Chunk> {
    chunk(&document.text)
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(position, text)| Chunk {
            id: ChunkId::new(document.source_index, position),
            text,
        })
        .collect()
}
