//! Error taxonomy shared by every layer of the bot.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while building the index or answering a question.
#[derive(Debug, Error)]
pub enum BotError {
    /// A file or directory could not be read or written.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The embedding provider was unreachable, rejected the request, or
    /// returned something that is not a usable vector.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingProvider { provider: String, message: String },

    /// The chat-completion provider failed, timed out, or returned no text.
    #[error("Generation error ({provider}): {message}")]
    Generation { provider: String, message: String },

    /// The vector index is missing, empty, corrupt, or incompatible with the query.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The on-disk vector store rejected an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Settings could not be parsed or are inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
