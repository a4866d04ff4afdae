use std::io::Cursor;
use std::sync::Arc;

use application::prompt::PromptTemplate;
use application::qa_service::{AnswerGenerator, QaService, Retriever};
use presentation::repl::Repl;
use tempfile::tempdir;
use tests::{HashEmbedder, ScriptedChat};

async fn session(input: &str, chat: &Arc<ScriptedChat>) -> String {
    let dir = tempdir().unwrap();
    let qa = QaService::new(
        Retriever::open(Arc::new(HashEmbedder::default()), &dir.path().join("vector_db"), 4),
        AnswerGenerator::new(Arc::clone(chat), PromptTemplate::new("Uday Raj")),
    );
    let mut out = Vec::new();
    Repl::new(&qa, "Uday Raj", "Uday")
        .run(Cursor::new(input.to_string()), &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn exit_words_end_the_session_without_another_prompt() {
    for word in ["exit", "EXIT", "quit", "QUIT", "  Quit  "] {
        let chat = Arc::new(ScriptedChat::default());
        let out = session(&format!("{word}\nWhat did Uday build?\n"), &chat).await;

        assert!(out.ends_with("Ask about Uday → 👋 Goodbye!\n"), "{word:?}: {out}");
        assert_eq!(out.matches("Ask about Uday → ").count(), 1);
        assert!(chat.prompts().is_empty());
    }
}

#[tokio::test]
async fn bot_without_an_index_keeps_prompting() {
    let chat = Arc::new(ScriptedChat::default());
    let out = session("What did Uday build?\nexit\n", &chat).await;

    assert!(out.contains("\n🤖 Uday Bot: I don't have any information about that.\n\n"));
    assert_eq!(out.matches("Ask about Uday → ").count(), 2);
}

#[tokio::test]
async fn failed_question_prints_an_error_and_continues() {
    let chat = Arc::new(ScriptedChat::default());
    chat.push_failure("deadline exceeded");
    chat.push_answer("He built a chatbot project.");
    let out = session("first\nsecond\nquit\n", &chat).await;

    assert!(out.contains("\n❌ Error: Generation error (scripted): deadline exceeded\n\n"));
    assert!(out.contains("\n🤖 Uday Bot: He built a chatbot project.\n\n"));
    assert!(out.ends_with("👋 Goodbye!\n"));
}
