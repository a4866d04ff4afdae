/// A contiguous span of the source document, produced in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of the chunk in the document.
    pub position: usize,
    pub text: String,
    /// Byte offset of the first character in the source.
    pub start: usize,
    /// Byte offset one past the last character in the source.
    pub end: usize,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the chunk carries anything worth embedding.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A chunk paired with its embedding, as persisted in the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub position: usize,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub position: usize,
    pub text: String,
    pub score: f32,
}

/// The chunks retrieved for one query, best match first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievedContext {
    pub const SEPARATOR: &'static str = "\n\n";

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk texts joined by a blank line, as they appear in the prompt.
    pub fn to_prompt_text(&self) -> String {
        self.chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(Self::SEPARATOR)
    }
}

/// One question and the answer produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaExchange {
    pub query: String,
    pub answer: String,
}

/// Which side of retrieval a text is embedded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Chunks written into the index.
    RetrievalDocument,
    /// Questions searched against the index.
    RetrievalQuery,
}

/// Facts about how an index was built, stored next to its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub entry_count: usize,
    pub source_md5: String,
}
