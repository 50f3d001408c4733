//! Shared fixtures for integration tests: keyword embedder, recording
//! generator and a small PDF writer.
#![allow(dead_code)]

use async_trait::async_trait;
use docqa::embedding::{EmbeddingError, EmbeddingProvider};
use docqa::generation::{GenerationError, GenerationProvider};
use docqa::store::{DuplicatePolicy, IndexParams, StoreAdapter};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const VOCABULARY: &[&str] = &["alpha", "beta", "gamma", "fact", "def"];

/// Embeds text as keyword presence over [`VOCABULARY`], plus a constant
/// component so no vector is all zeros.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| if lower.contains(word) { 1.0 } else { 0.0 })
            .collect();
        vector.push(0.1);
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Answers with the context it was given and records every prompt
#[derive(Default)]
pub struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let context = prompt
            .strip_prefix("Using this data: ")
            .and_then(|rest| rest.split(". Respond to this prompt: ").next())
            .unwrap_or_default();
        Ok(format!("Based on: {}", context))
    }

    fn model_name(&self) -> &str {
        "recording-test"
    }
}

pub fn test_store(policy: DuplicatePolicy) -> StoreAdapter {
    StoreAdapter::new(
        IndexParams {
            max_elements: 1_000,
            m: 16,
            ef_construction: 200,
            ef_search: 64,
        },
        policy,
    )
}

pub fn source_extensions() -> Vec<String> {
    vec!["py".to_string(), "txt".to_string()]
}

/// Write a PDF; each page holds its paragraphs as separate text blocks
/// spaced 100pt apart vertically.
pub fn write_pdf(path: &Path, pages: &[&[&str]]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for paragraphs in pages {
        let mut operations = Vec::new();
        for (i, paragraph) in paragraphs.iter().enumerate() {
            let y = 700 - 100 * i as i64;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(*paragraph)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
