use std::path::{Path, PathBuf};
use std::time::Duration;

use domain::models::IndexMetadata;
use domain::ports::EmbeddingProvider;
use domain::text_splitter::RecursiveTextSplitter;
use infrastructure::config::Config;
use infrastructure::embedder::Embedder;
use infrastructure::embedding_storage::{replace_index, EmbeddingStorage};
use infrastructure::source_loader::load_source;
use shared::telemetry::Telemetry;
use shared::types::Result;
use tracing::{debug, info};

/// Summary of one indexing run.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
    pub index_dir: PathBuf,
    pub chunk_count: usize,
    pub entry_count: usize,
    pub dimensions: usize,
    /// The previous index was built from identical source text.
    pub source_unchanged: bool,
    pub elapsed: Duration,
}

/// Offline pipeline: load the source, split it, embed every chunk, persist.
pub struct IndexService<P> {
    embedder: Embedder<P>,
    splitter: RecursiveTextSplitter,
}

impl<P: EmbeddingProvider> IndexService<P> {
    pub fn new(provider: P, config: &Config) -> Self {
        Self {
            embedder: Embedder::new(provider).with_batch_size(config.embed_batch_size),
            splitter: RecursiveTextSplitter::new(config.chunk_size, config.chunk_overlap),
        }
    }

    pub fn from_parts(embedder: Embedder<P>, splitter: RecursiveTextSplitter) -> Self {
        Self { embedder, splitter }
    }

    /// Rebuild the index at `index_dir` from `source_path`. Nothing on disk changes
    /// unless every chunk was embedded and written successfully.
    pub async fn build_index(&self, source_path: &Path, index_dir: &Path) -> Result<IndexReport> {
        let telemetry = Telemetry::new();

        let source = load_source(source_path)?;
        info!(path = %source.path.display(), bytes = source.text.len(), "loaded source document");

        let source_unchanged = previous_source_md5(index_dir).as_deref() == Some(source.md5.as_str());
        if source_unchanged {
            info!("source is unchanged since the last build; rebuilding anyway");
        }

        let chunks = self.splitter.split(&source.text);
        info!(
            chunks = chunks.len(),
            chunk_size = self.splitter.chunk_size(),
            chunk_overlap = self.splitter.chunk_overlap(),
            "split source into chunks"
        );

        let entries = self.embedder.embed_chunks(&chunks).await?;
        let dimensions = entries.first().map_or(0, |e| e.vector.len());
        info!(entries = entries.len(), dimensions, "embedded chunks");

        let metadata = IndexMetadata {
            embedding_model: self.embedder.provider().model().to_string(),
            dimensions,
            chunk_size: self.splitter.chunk_size(),
            chunk_overlap: self.splitter.chunk_overlap(),
            entry_count: entries.len(),
            source_md5: source.md5.clone(),
        };

        replace_index(index_dir, |staging| {
            let storage = EmbeddingStorage::create(staging)?;
            storage.insert_entries(&entries)?;
            storage.write_metadata(&metadata)
        })?;

        let report = IndexReport {
            index_dir: index_dir.to_path_buf(),
            chunk_count: chunks.len(),
            entry_count: entries.len(),
            dimensions,
            source_unchanged,
            elapsed: telemetry.elapsed(),
        };
        info!(
            dir = %index_dir.display(),
            elapsed_ms = telemetry.elapsed_ms(),
            "vector index written"
        );
        Ok(report)
    }
}

fn previous_source_md5(index_dir: &Path) -> Option<String> {
    let storage = EmbeddingStorage::open_read_only(index_dir).ok()?;
    match storage.read_metadata() {
        Ok(meta) => meta.map(|m| m.source_md5),
        Err(e) => {
            debug!(error = %e, "previous index metadata unreadable");
            None
        }
    }
}
