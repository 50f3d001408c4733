/// Indexing integration: docs folder on disk → extraction → chunks → store
mod common;

use common::{source_extensions, test_store, write_pdf, KeywordEmbedder};
use docqa::embedding::EmbeddingPool;
use docqa::extract::{extract, DocumentKind};
use docqa::pipeline::{load_documents, Indexer, PipelineError};
use docqa::store::DuplicatePolicy;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn docs_folder() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a_facts.txt"), "Alpha fact.\n\nBeta fact.").unwrap();
    fs::write(
        temp.path().join("b_script.py"),
        "def alpha():\n    return 1\n\ndef beta():\n    return 2\n",
    )
    .unwrap();
    write_pdf(&temp.path().join("c_notes.pdf"), &[&["Gamma fact."]]);
    fs::write(temp.path().join("diagram.png"), [0x89, b'P', b'N', b'G']).unwrap();
    temp
}

#[tokio::test]
async fn test_index_and_retrieve_alpha_fact() {
    let docs = docs_folder();
    let provider = Arc::new(KeywordEmbedder::default());
    let pool = EmbeddingPool::new(provider.clone(), 4);
    let store = test_store(DuplicatePolicy::Overwrite);

    let documents = load_documents(docs.path(), &source_extensions()).await.unwrap();
    assert_eq!(documents.len(), 3);
    assert_eq!(
        documents.iter().map(|d| d.source_index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(documents[2].text, "Gamma fact.");

    let report = Indexer::new(&pool, &store, "docs")
        .index(&documents)
        .await
        .unwrap();

    assert_eq!(report.indexed_documents(), 3);
    assert_eq!(report.failed_documents(), 0);
    // two paragraphs + two functions + one PDF page
    assert_eq!(report.chunks_indexed(), 5);
    assert_eq!(provider.calls(), 5);

    let collection = report.collection;
    assert_eq!(collection.get_text("0_0").unwrap().as_deref(), Some("Alpha fact."));
    assert_eq!(collection.get_text("0_1").unwrap().as_deref(), Some("Beta fact."));
    assert!(collection.get_text("1_1").unwrap().unwrap().contains("def beta"));
    assert_eq!(collection.get_text("2_0").unwrap().as_deref(), Some("Gamma fact."));

    let question = pool.embed_query("What is the alpha fact?").await.unwrap();
    let hits = store.query(&collection, &question, 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "0_0");
    assert_eq!(hits[0].text, "Alpha fact.");
}

#[tokio::test]
async fn test_pdf_paragraphs_become_chunks() {
    let docs = TempDir::new().unwrap();
    write_pdf(&docs.path().join("paper.pdf"), &[&["Alpha fact.", "Beta fact."]]);

    let pool = EmbeddingPool::new(Arc::new(KeywordEmbedder::default()), 2);
    let store = test_store(DuplicatePolicy::Overwrite);

    let documents = load_documents(docs.path(), &[]).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].text, "Alpha fact.\n\nBeta fact.");

    let report = Indexer::new(&pool, &store, "docs")
        .index(&documents)
        .await
        .unwrap();

    assert_eq!(report.chunks_indexed(), 2);
    let collection = report.collection;
    assert_eq!(collection.get_text("0_0").unwrap().as_deref(), Some("Alpha fact."));
    assert_eq!(collection.get_text("0_1").unwrap().as_deref(), Some("Beta fact."));

    let question = pool.embed_query("What is the alpha fact?").await.unwrap();
    let hits = store.query(&collection, &question, 1).unwrap();
    assert_eq!(hits[0].id, "0_0");
    assert_eq!(hits[0].text, "Alpha fact.");
}

#[test]
fn test_pdf_pages_in_order() {
    let docs = TempDir::new().unwrap();
    let path = docs.path().join("pages.pdf");
    write_pdf(&path, &[&["Alpha fact."], &["Beta fact."], &["Gamma fact."]]);

    let text = extract(&path, DocumentKind::BinaryDocument).unwrap();
    let alpha = text.find("Alpha fact.").expect("page 1 text");
    let beta = text.find("Beta fact.").expect("page 2 text");
    let gamma = text.find("Gamma fact.").expect("page 3 text");
    assert!(alpha < beta && beta < gamma);
}

#[tokio::test]
async fn test_corrupt_file_skipped_and_ids_stable() {
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("a_broken.pdf"), b"%PDF-1.4 truncated").unwrap();
    fs::write(docs.path().join("b_facts.txt"), "Alpha fact.\n\nBeta fact.").unwrap();

    let pool = EmbeddingPool::new(Arc::new(KeywordEmbedder::default()), 2);
    let store = test_store(DuplicatePolicy::Overwrite);

    let documents = load_documents(docs.path(), &source_extensions()).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].source_index, 1);

    let report = Indexer::new(&pool, &store, "docs")
        .index(&documents)
        .await
        .unwrap();
    assert_eq!(report.collection.get_text("1_0").unwrap().as_deref(), Some("Alpha fact."));
    assert_eq!(report.collection.get_text("1_1").unwrap().as_deref(), Some("Beta fact."));
    assert!(report.collection.get_text("0_0").unwrap().is_none());
}

#[tokio::test]
async fn test_every_file_unreadable() {
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("a.pdf"), b"%PDF-1.4 truncated").unwrap();
    fs::write(docs.path().join("b.py"), [0x63, 0x61, 0x66, 0xe9, 0xff]).unwrap();

    let result = load_documents(docs.path(), &source_extensions()).await;
    assert!(matches!(
        result,
        Err(PipelineError::AllDocumentsFailed { count: 2 })
    ));
}

#[tokio::test]
async fn test_reindex_overwrites() {
    let docs = docs_folder();
    let pool = EmbeddingPool::new(Arc::new(KeywordEmbedder::default()), 3);
    let store = test_store(DuplicatePolicy::Overwrite);
    let documents = load_documents(docs.path(), &source_extensions()).await.unwrap();
    let indexer = Indexer::new(&pool, &store, "docs");

    let first = indexer.index(&documents).await.unwrap();
    let second = indexer.index(&documents).await.unwrap();

    assert!(first.collection.same_collection(&second.collection));
    assert_eq!(second.collection.len().unwrap(), first.chunks_indexed());
}

#[tokio::test]
async fn test_reindex_with_reject_policy_fails() {
    let docs = docs_folder();
    let pool = EmbeddingPool::new(Arc::new(KeywordEmbedder::default()), 3);
    let store = test_store(DuplicatePolicy::Reject);
    let documents = load_documents(docs.path(), &source_extensions()).await.unwrap();
    let indexer = Indexer::new(&pool, &store, "docs");

    indexer.index(&documents).await.unwrap();
    let result = indexer.index(&documents).await;
    assert!(matches!(
        result,
        Err(PipelineError::AllDocumentsFailed { count: 3 })
    ));
}

#[tokio::test]
async fn test_empty_folder() {
    let docs = TempDir::new().unwrap();
    let pool = EmbeddingPool::new(Arc::new(KeywordEmbedder::default()), 1);
    let store = test_store(DuplicatePolicy::Overwrite);

    let documents = load_documents(docs.path(), &source_extensions()).await.unwrap();
    assert!(documents.is_empty());

    let report = Indexer::new(&pool, &store, "docs")
        .index(&documents)
        .await
        .unwrap();
    assert_eq!(report.chunks_indexed(), 0);
    assert!(report.collection.is_empty().unwrap());
}

#[tokio::test]
async fn test_missing_folder() {
    let temp = TempDir::new().unwrap();
    let result = load_documents(&temp.path().join("nope"), &source_extensions()).await;
    assert!(matches!(result, Err(PipelineError::Scan(_))));
}
