use std::cmp::Ordering;

use domain::models::{IndexEntry, ScoredChunk};
use domain::ports::VectorSearch;
use shared::types::{BotError, Result};

/// Brute-force cosine search over an in-memory copy of the index.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl SearchEngine {
    /// All entries must share one dimensionality.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self> {
        let dimensions = entries.first().map_or(0, |e| e.vector.len());
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimensions) {
            return Err(BotError::Retrieval(format!(
                "entry {} has {} dimensions, expected {dimensions}",
                bad.position,
                bad.vector.len()
            )));
        }
        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Zero-length vectors score 0 against everything.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot_product / (norm_a * norm_b)
    }
}

impl VectorSearch for SearchEngine {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() {
            return Err(BotError::Retrieval("the vector index is empty".into()));
        }
        if query.len() != self.dimensions {
            return Err(BotError::Retrieval(format!(
                "query has {} dimensions but the index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut similarities: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (Self::cosine_similarity(query, &entry.vector), entry))
            .collect();

        similarities.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.position.cmp(&b.1.position))
        });
        Ok(similarities
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| ScoredChunk {
                position: entry.position,
                text: entry.text.clone(),
                score,
            })
            .collect())
    }
}
