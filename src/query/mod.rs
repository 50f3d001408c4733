//! Interactive question answering
//!
//! [`QueryEngine`] answers one question (embed → retrieve → generate).
//! [`QueryLoop`] drives it from a line-oriented console until the user types
//! the exit token or input ends.

use crate::embedding::{EmbeddingError, EmbeddingPool};
use crate::generation::{GenerationError, GenerationProvider, PromptTemplate};
use crate::store::{CollectionHandle, RetrievedChunk, StoreAdapter, StoreError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Retrieval failed: {0}")]
    Store(#[from] StoreError),

    #[error("Answer generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// A generated answer and the context it was based on
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context: Vec<RetrievedChunk>,
    pub embedding_time: Duration,
}

/// Answers single questions against one collection
pub struct QueryEngine<'a> {
    pool: &'a EmbeddingPool,
    store: &'a StoreAdapter,
    collection: CollectionHandle,
    generator: &'a dyn GenerationProvider,
    template: PromptTemplate,
    top_k: usize,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        pool: &'a EmbeddingPool,
        store: &'a StoreAdapter,
        collection: CollectionHandle,
        generator: &'a dyn GenerationProvider,
    ) -> Self {
        Self {
            pool,
            store,
            collection,
            generator,
            template: PromptTemplate,
            top_k: 1,
        }
    }

    /// Number of chunks retrieved per question (at least 1)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub async fn answer(&self, question: &str) -> Result<Answer, QueryError> {
        debug!("Querying the collection with prompt: {}", question);

        let start = Instant::now();
        let embedding = self.pool.embed_query(question).await?;
        let embedding_time = start.elapsed();
        debug!(
            "Embedding call took {:.2} seconds",
            embedding_time.as_secs_f64()
        );

        let context = self.store.query(&self.collection, &embedding, self.top_k)?;
        let context_text = context
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!("Generating response for prompt: {}", question);
        let prompt = self.template.render(&context_text, question);
        let text = self.generator.generate(&prompt).await?;

        Ok(Answer {
            text,
            context,
            embedding_time,
        })
    }
}

/// Console loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Terminated,
}

/// Counters for a finished session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub answered: usize,
    pub failed: usize,
}

pub struct QueryLoop<'a> {
    engine: QueryEngine<'a>,
    exit_token: String,
    state: LoopState,
}

impl<'a> QueryLoop<'a> {
    pub fn new(engine: QueryEngine<'a>, exit_token: &str) -> Self {
        Self {
            engine,
            exit_token: exit_token.to_string(),
            state: LoopState::AwaitingInput,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn is_exit(&self, line: &str) -> bool {
        line.trim().eq_ignore_ascii_case(&self.exit_token)
    }

    /// Read questions from `input` and write answers to `output`.
    ///
    /// A failed turn is reported on `output` and the loop keeps going. Only
    /// console IO errors end the session early.
    pub async fn run<R, W>(&mut self, mut input: R, mut output: W) -> std::io::Result<LoopSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut summary = LoopSummary::default();

        output
            .write_all(b"\nWelcome to the interactive Q&A system!\n")
            .await?;
        output
            .write_all(
                format!("Ask your questions, or type '{}' to quit.\n\n", self.exit_token).as_bytes(),
            )
            .await?;

        while self.state == LoopState::AwaitingInput {
            output.write_all(b"Your question: ").await?;
            output.flush().await?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                self.state = LoopState::Terminated;
                output.write_all(b"\n").await?;
                break;
            }

            if self.is_exit(&line) {
                self.state = LoopState::Terminated;
                output.write_all(b"Exiting the Q&A system.\n").await?;
                break;
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }

            match self.engine.answer(question).await {
                Ok(answer) => {
                    summary.answered += 1;
                    output
                        .write_all(format!("\nGenerated Answer:\n{}\n\n", answer.text).as_bytes())
                        .await?;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!("Query failed: {}", e);
                    output
                        .write_all(format!("\nError: {}\n\n", e).as_bytes())
                        .await?;
                }
            }
        }

        output.flush().await?;
        Ok(summary)
    }
}
