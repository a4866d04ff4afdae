//! Seams between the pipeline and the services it delegates to.
//!
//! Provider traits use `impl Future` returns so implementations can be plain
//! `async fn`s; the pipeline is generic over them rather than boxing.

use std::future::Future;
use std::sync::Arc;

use shared::types::Result;

use crate::models::{EmbeddingTask, ScoredChunk};

/// Turns text into vectors. Index-time and query-time calls must use the same model.
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in errors and logs.
    fn name(&self) -> &str;

    /// Model identifier, recorded in the index metadata.
    fn model(&self) -> &str;

    fn embed(
        &self,
        text: &str,
        task: EmbeddingTask,
    ) -> impl Future<Output = Result<Vec<f32>>> + Send;

    /// Embed several texts at once. Returns exactly one vector per input, in order.
    fn embed_batch(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// Stateless single-turn text completion.
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Nearest-neighbour search over stored chunk vectors.
pub trait VectorSearch: Send + Sync {
    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the stored vectors, `0` when empty.
    fn dimensions(&self) -> usize;

    /// The `top_k` entries most similar to `query`, best first.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;
}

impl<T: EmbeddingProvider> EmbeddingProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn embed(
        &self,
        text: &str,
        task: EmbeddingTask,
    ) -> impl Future<Output = Result<Vec<f32>>> + Send {
        (**self).embed(text, task)
    }

    fn embed_batch(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send {
        (**self).embed_batch(texts, task)
    }
}

impl<T: ChatProvider> ChatProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send {
        (**self).complete(prompt)
    }
}
