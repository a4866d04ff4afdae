use std::path::Path;
use std::sync::Arc;

use application::index_service::IndexService;
use application::prompt::PromptTemplate;
use application::qa_service::{AnswerGenerator, QaService, Retriever};
use domain::text_splitter::RecursiveTextSplitter;
use infrastructure::embedder::Embedder;
use shared::types::BotError;
use tempfile::tempdir;
use tests::{write_source, HashEmbedder, ScriptedChat, UDAY_PROFILE};

const CHATBOT_SENTENCE: &str = "Uday Raj is a software engineer who built a chatbot project.";

async fn build(dir: &Path, embedder: &Arc<HashEmbedder>) -> std::path::PathBuf {
    let source = write_source(dir, UDAY_PROFILE);
    let index_dir = dir.join("vector_db");
    IndexService::from_parts(
        Embedder::new(Arc::clone(embedder)),
        RecursiveTextSplitter::new(80, 10),
    )
    .build_index(&source, &index_dir)
    .await
    .unwrap();
    index_dir
}

fn qa(
    embedder: Arc<HashEmbedder>,
    index_dir: &Path,
    chat: &Arc<ScriptedChat>,
) -> QaService<Arc<HashEmbedder>, Arc<ScriptedChat>> {
    QaService::new(
        Retriever::open(embedder, index_dir, 4),
        AnswerGenerator::new(Arc::clone(chat), PromptTemplate::new("Uday Raj")),
    )
}

#[tokio::test]
async fn question_about_the_chatbot_is_answered_from_the_index() {
    let dir = tempdir().unwrap();
    let embedder = Arc::new(HashEmbedder::default());
    let index_dir = build(dir.path(), &embedder).await;
    let chat = Arc::new(ScriptedChat::default());
    let service = qa(Arc::clone(&embedder), &index_dir, &chat);

    let context = service
        .retriever()
        .retrieve("What did Uday build?")
        .await
        .unwrap();
    assert!(context.chunks[0].text.contains(CHATBOT_SENTENCE));

    let exchange = service.answer_question("What did Uday build?").await.unwrap();
    assert_eq!(exchange.query, "What did Uday build?");
    assert!(!exchange.answer.trim().is_empty());
    assert!(exchange.answer.contains("a chatbot project"));

    let prompt = &chat.prompts()[0];
    assert!(prompt.starts_with("Based on the following context about Uday Raj"));
    assert!(prompt.contains(&format!("Context: {CHATBOT_SENTENCE}")));
    assert_eq!(embedder.single_calls(), 2);
}

#[tokio::test]
async fn missing_index_answers_from_empty_context() {
    let dir = tempdir().unwrap();
    let chat = Arc::new(ScriptedChat::default());
    let service = qa(
        Arc::new(HashEmbedder::default()),
        &dir.path().join("does_not_exist"),
        &chat,
    );

    assert!(!service.retriever().is_available());
    let exchange = service.answer_question("What did Uday build?").await.unwrap();
    assert_eq!(exchange.answer, "I don't have any information about that.");
    assert!(chat.prompts()[0].contains("Context: \n\nQuestion: What did Uday build?"));
}

#[tokio::test]
async fn a_generation_failure_does_not_affect_the_next_question() {
    let dir = tempdir().unwrap();
    let embedder = Arc::new(HashEmbedder::default());
    let index_dir = build(dir.path(), &embedder).await;
    let chat = Arc::new(ScriptedChat::default());
    chat.push_failure("quota exceeded");
    let service = qa(embedder, &index_dir, &chat);

    let first = service.answer_question("What did Uday build?").await;
    assert!(matches!(first, Err(BotError::Generation { .. })));

    let second = service.answer_question("What did Uday build?").await.unwrap();
    assert!(second.answer.contains("a chatbot project"));
}

#[tokio::test]
async fn query_embedding_outage_degrades_to_empty_context() {
    let dir = tempdir().unwrap();
    let embedder = Arc::new(HashEmbedder::default());
    let index_dir = build(dir.path(), &embedder).await;
    let chat = Arc::new(ScriptedChat::default());
    let service = qa(Arc::clone(&embedder), &index_dir, &chat);

    embedder.set_failing(true);
    let exchange = service.answer_question("What did Uday build?").await.unwrap();

    assert_eq!(exchange.answer, "I don't have any information about that.");
}

#[tokio::test]
async fn index_from_another_model_still_loads() {
    let dir = tempdir().unwrap();
    let index_dir = build(dir.path(), &Arc::new(HashEmbedder::default())).await;
    let chat = Arc::new(ScriptedChat::default());
    let service = qa(Arc::new(HashEmbedder::with_model("hash-embedder-v2")), &index_dir, &chat);

    assert!(service.retriever().is_available());
    chat.push_answer("He built a chatbot project.");
    let exchange = service.answer_question("What did Uday build?").await.unwrap();
    assert_eq!(exchange.answer, "He built a chatbot project.");
}
