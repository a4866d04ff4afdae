pub mod config;
pub mod embedder;
pub mod embedding_storage;
pub mod gemini_client;
pub mod search;
pub mod source_loader;
