use domain::models::{Chunk, EmbeddingTask, IndexEntry};
use domain::ports::EmbeddingProvider;
use shared::types::{BotError, Result};
use tracing::{debug, info};

use crate::config::DEFAULT_EMBED_BATCH_SIZE;

/// Embeds document chunks in provider-sized batches.
pub struct Embedder<P> {
    provider: P,
    batch_size: usize,
}

impl<P: EmbeddingProvider> Embedder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Embed every non-blank chunk. Either all chunks get a vector or the call fails;
    /// all vectors share one dimensionality.
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<IndexEntry>> {
        let kept: Vec<&Chunk> = chunks.iter().filter(|chunk| !chunk.is_blank()).collect();
        if kept.len() < chunks.len() {
            debug!(skipped = chunks.len() - kept.len(), "skipping blank chunks");
        }

        let mut entries = Vec::with_capacity(kept.len());
        let mut dimensions: Option<usize> = None;

        for (batch_no, batch) in kept.chunks(self.batch_size).enumerate() {
            info!(
                batch = batch_no + 1,
                size = batch.len(),
                "generating embeddings"
            );
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self
                .provider
                .embed_batch(&texts, EmbeddingTask::RetrievalDocument)
                .await?;

            if vectors.len() != batch.len() {
                return Err(self.malformed(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (chunk, vector) in batch.iter().zip(vectors) {
                let expected = *dimensions.get_or_insert(vector.len());
                if vector.is_empty() || vector.len() != expected {
                    return Err(self.malformed(format!(
                        "chunk {} has a {}-dimensional vector, expected {}",
                        chunk.position,
                        vector.len(),
                        expected
                    )));
                }
                entries.push(IndexEntry {
                    position: chunk.position,
                    text: chunk.text.clone(),
                    vector,
                });
            }
        }
        Ok(entries)
    }

    fn malformed(&self, message: String) -> BotError {
        BotError::EmbeddingProvider {
            provider: self.provider.name().to_string(),
            message,
        }
    }
}
