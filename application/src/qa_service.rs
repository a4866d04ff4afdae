use std::path::Path;

use domain::models::{EmbeddingTask, QaExchange, RetrievedContext};
use domain::ports::{ChatProvider, EmbeddingProvider, VectorSearch};
use infrastructure::embedding_storage::EmbeddingStorage;
use infrastructure::search::SearchEngine;
use shared::telemetry::Telemetry;
use shared::types::{BotError, Result};
use shared::utils::preview;
use tracing::{debug, info, warn};

use crate::prompt::PromptTemplate;

enum IndexState {
    Ready(Box<dyn VectorSearch>),
    Unavailable(String),
}

/// Embeds a question and looks up the closest chunks in the index.
pub struct Retriever<E> {
    embedder: E,
    index: IndexState,
    top_k: usize,
}

impl<E: EmbeddingProvider> Retriever<E> {
    pub fn new(embedder: E, index: impl VectorSearch + 'static, top_k: usize) -> Self {
        Self {
            embedder,
            index: IndexState::Ready(Box::new(index)),
            top_k,
        }
    }

    /// A retriever whose every lookup fails with `reason`.
    pub fn unavailable(embedder: E, reason: impl Into<String>, top_k: usize) -> Self {
        Self {
            embedder,
            index: IndexState::Unavailable(reason.into()),
            top_k,
        }
    }

    /// Load the index at `index_dir` into memory. A missing or unreadable index does
    /// not fail here; queries then run against an empty context.
    pub fn open(embedder: E, index_dir: &Path, top_k: usize) -> Self {
        match load_index(index_dir, embedder.model()) {
            Ok(engine) => {
                info!(
                    entries = engine.len(),
                    dimensions = engine.dimensions(),
                    "vector index loaded"
                );
                Self::new(embedder, engine, top_k)
            }
            Err(e) => {
                warn!(error = %e, dir = %index_dir.display(), "vector index unavailable");
                Self::unavailable(embedder, e.to_string(), top_k)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.index, IndexState::Ready(_))
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext> {
        let index = match &self.index {
            IndexState::Ready(index) => index,
            IndexState::Unavailable(reason) => return Err(BotError::Retrieval(reason.clone())),
        };

        let vector = self
            .embedder
            .embed(query, EmbeddingTask::RetrievalQuery)
            .await
            .map_err(|e| BotError::Retrieval(format!("could not embed the question: {e}")))?;
        let chunks = index.search(&vector, self.top_k)?;
        debug!(
            hits = chunks.len(),
            best = chunks.first().map(|c| c.score),
            "retrieved context"
        );
        Ok(RetrievedContext { chunks })
    }

    /// Like [`Retriever::retrieve`] but any failure becomes an empty context.
    pub async fn retrieve_or_empty(&self, query: &str) -> RetrievedContext {
        match self.retrieve(query).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "retrieval failed; answering without context");
                RetrievedContext::empty()
            }
        }
    }
}

fn load_index(index_dir: &Path, query_model: &str) -> Result<SearchEngine> {
    let storage = EmbeddingStorage::open_read_only(index_dir)?;
    match storage.read_metadata()? {
        Some(meta) if meta.embedding_model != query_model => warn!(
            index_model = %meta.embedding_model,
            query_model,
            "index was built with a different embedding model"
        ),
        Some(_) => {}
        None => warn!("vector index has no metadata"),
    }
    SearchEngine::from_entries(storage.load_entries()?)
}

/// Turns a question plus retrieved context into the model's answer.
pub struct AnswerGenerator<C> {
    chat: C,
    template: PromptTemplate,
}

impl<C: ChatProvider> AnswerGenerator<C> {
    pub fn new(chat: C, template: PromptTemplate) -> Self {
        Self { chat, template }
    }

    /// The provider's text is returned as-is; a blank reply is a `Generation` error.
    pub async fn answer(&self, query: &str, context: &RetrievedContext) -> Result<String> {
        let prompt = self.template.render(&context.to_prompt_text(), query);
        let answer = self.chat.complete(&prompt).await?;
        if answer.trim().is_empty() {
            return Err(BotError::Generation {
                provider: self.chat.name().to_string(),
                message: "the model returned an empty answer".into(),
            });
        }
        Ok(answer)
    }
}

/// retrieve → answer, one question at a time.
pub struct QaService<E, C> {
    retriever: Retriever<E>,
    generator: AnswerGenerator<C>,
}

impl<E: EmbeddingProvider, C: ChatProvider> QaService<E, C> {
    pub fn new(retriever: Retriever<E>, generator: AnswerGenerator<C>) -> Self {
        debug!("pipeline: retrieve → answer");
        Self {
            retriever,
            generator,
        }
    }

    pub fn retriever(&self) -> &Retriever<E> {
        &self.retriever
    }

    pub async fn answer_question(&self, query: &str) -> Result<QaExchange> {
        let telemetry = Telemetry::new();
        debug!(query = %preview(query, 80), "answering question");

        let context = self.retriever.retrieve_or_empty(query).await;
        let answer = self.generator.answer(query, &context).await?;

        debug!(
            elapsed_ms = telemetry.elapsed_ms(),
            context_chunks = context.chunks.len(),
            "question answered"
        );
        Ok(QaExchange {
            query: query.to_string(),
            answer,
        })
    }
}
