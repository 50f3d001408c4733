//! docqa - question answering over a folder of documents
//!
//! Text is extracted from PDFs and source files, split into paragraph chunks,
//! embedded through a bounded worker pool and stored in an in-process HNSW
//! collection. Questions are answered by retrieving the nearest chunk and
//! handing it to a generation model as context.

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod pipeline;
pub mod query;
pub mod store;

pub use error::{DocqaError, Result};
