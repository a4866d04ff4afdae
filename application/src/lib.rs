pub mod index_service;
pub mod prompt;
pub mod qa_service;
