use std::sync::Arc;

use application::index_service::IndexService;
use application::qa_service::Retriever;
use domain::text_splitter::RecursiveTextSplitter;
use infrastructure::embedder::Embedder;
use infrastructure::embedding_storage::EmbeddingStorage;
use shared::types::BotError;
use tempfile::tempdir;
use tests::{write_source, HashEmbedder, HASH_DIMENSIONS, UDAY_PROFILE};

fn indexer(embedder: &Arc<HashEmbedder>) -> IndexService<Arc<HashEmbedder>> {
    IndexService::from_parts(
        Embedder::new(Arc::clone(embedder)).with_batch_size(2),
        RecursiveTextSplitter::new(80, 10),
    )
}

#[tokio::test]
async fn one_entry_per_paragraph_in_batches() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), UDAY_PROFILE);
    let index_dir = dir.path().join("vector_db");
    let embedder = Arc::new(HashEmbedder::default());

    let report = indexer(&embedder).build_index(&source, &index_dir).await.unwrap();

    assert_eq!(report.chunk_count, 4);
    assert_eq!(report.entry_count, 4);
    assert_eq!(report.dimensions, HASH_DIMENSIONS);
    assert_eq!(embedder.batch_calls(), 2);

    let storage = EmbeddingStorage::open_read_only(&index_dir).unwrap();
    let meta = storage.read_metadata().unwrap().unwrap();
    assert_eq!(meta.embedding_model, "hash-embedder-v1");
    assert_eq!(meta.dimensions, HASH_DIMENSIONS);
    let entries = storage.load_entries().unwrap();
    assert!(entries[0].text.starts_with("Uday Raj is a software engineer"));
}

#[tokio::test]
async fn reindexing_gives_identical_retrieval() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), UDAY_PROFILE);
    let index_dir = dir.path().join("vector_db");
    let embedder = Arc::new(HashEmbedder::default());
    let queries = ["What did Uday build?", "Which music does he like?", "Where does he go hiking?"];

    let mut runs = Vec::new();
    for _ in 0..2 {
        indexer(&embedder).build_index(&source, &index_dir).await.unwrap();
        let retriever = Retriever::open(Arc::clone(&embedder), &index_dir, 4);
        let mut contexts = Vec::new();
        for query in queries {
            contexts.push(retriever.retrieve(query).await.unwrap());
        }
        runs.push(contexts);
    }

    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn failed_rebuild_keeps_the_previous_index() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), UDAY_PROFILE);
    let index_dir = dir.path().join("vector_db");
    let embedder = Arc::new(HashEmbedder::default());
    indexer(&embedder).build_index(&source, &index_dir).await.unwrap();

    write_source(dir.path(), "Completely different text.");
    embedder.set_failing(true);
    let err = indexer(&embedder)
        .build_index(&source, &index_dir)
        .await
        .unwrap_err();

    assert!(matches!(err, BotError::EmbeddingProvider { .. }));
    let entries = EmbeddingStorage::open_read_only(&index_dir)
        .unwrap()
        .load_entries()
        .unwrap();
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn empty_source_builds_an_empty_index() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "");
    let index_dir = dir.path().join("vector_db");
    let embedder = Arc::new(HashEmbedder::default());

    let report = indexer(&embedder).build_index(&source, &index_dir).await.unwrap();
    assert_eq!(report.entry_count, 0);
    assert_eq!(embedder.batch_calls(), 0);

    let retriever = Retriever::open(Arc::clone(&embedder), &index_dir, 4);
    assert!(matches!(
        retriever.retrieve("What did Uday build?").await,
        Err(BotError::Retrieval(_))
    ));
    assert!(retriever.retrieve_or_empty("What did Uday build?").await.is_empty());
}
