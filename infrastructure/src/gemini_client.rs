//! Google Gemini REST client: embeddings and single-turn text generation.

use domain::models::EmbeddingTask;
use domain::ports::{ChatProvider, EmbeddingProvider};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::types::{BotError, Result};
use tracing::{debug, error};

use crate::config::Config;

const PROVIDER: &str = "Gemini";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    embedding_model: String,
    chat_model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.gemini_api_key)
            .map_err(|e| BotError::Config(format!("API key is not a valid header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            embedding_model: model_path(&config.embedding_model),
            chat_model: model_path(&config.chat_model),
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model, method)
    }

    /// POST `body` and decode the JSON reply; errors come back as plain messages so
    /// each caller can wrap them in its own error kind.
    async fn post_json<Req, Resp>(&self, url: &str, body: &Req) -> std::result::Result<Resp, String>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                format!("request timed out after {}s", self.timeout_secs)
            } else {
                format!("request failed: {e}")
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(format!("API returned {status}: {detail}"));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| format!("failed to parse response: {e}"))
    }

    fn embed_request<'a>(&'a self, text: &'a str, task: EmbeddingTask) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.embedding_model,
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
            task_type: task_type(task),
        }
    }
}

impl EmbeddingProvider for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), ?task, "embedding single text");

        let url = self.url(&self.embedding_model, "embedContent");
        let response: EmbedContentResponse = self
            .post_json(&url, &self.embed_request(text, task))
            .await
            .map_err(|message| {
                error!(provider = PROVIDER, %message, "embedding request failed");
                embedding_error(message)
            })?;

        if response.embedding.values.is_empty() {
            return Err(embedding_error("API returned an empty embedding"));
        }
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String], task: EmbeddingTask) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, batch_size = texts.len(), ?task, "embedding batch");

        let request = BatchEmbedContentsRequest {
            requests: texts
                .iter()
                .map(|text| self.embed_request(text, task))
                .collect(),
        };
        let url = self.url(&self.embedding_model, "batchEmbedContents");
        let response: BatchEmbedContentsResponse =
            self.post_json(&url, &request).await.map_err(|message| {
                error!(provider = PROVIDER, %message, "batch embedding request failed");
                embedding_error(message)
            })?;

        if response.embeddings.len() != texts.len() {
            return Err(embedding_error(format!(
                "API returned {} embeddings for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }
        if response.embeddings.iter().any(|e| e.values.is_empty()) {
            return Err(embedding_error("API returned an empty embedding"));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

impl ChatProvider for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.chat_model, prompt_len = prompt.len(), "generating answer");

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
        };
        let url = self.url(&self.chat_model, "generateContent");
        let response: GenerateContentResponse =
            self.post_json(&url, &request).await.map_err(|message| {
                error!(provider = PROVIDER, %message, "generation request failed");
                generation_error(message)
            })?;

        extract_answer(response)
    }
}

fn extract_answer(response: GenerateContentResponse) -> Result<String> {
    let blocked = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(generation_error(match blocked {
            Some(reason) => format!("prompt was blocked ({reason})"),
            None => "response contained no candidates".to_string(),
        }));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(generation_error(format!(
            "response contained no text (finish reason: {reason})"
        )));
    }
    Ok(text)
}

/// Gemini addresses models as `models/<name>`; accept either spelling.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn task_type(task: EmbeddingTask) -> &'static str {
    match task {
        EmbeddingTask::RetrievalDocument => "RETRIEVAL_DOCUMENT",
        EmbeddingTask::RetrievalQuery => "RETRIEVAL_QUERY",
    }
}

fn embedding_error(message: impl Into<String>) -> BotError {
    BotError::EmbeddingProvider {
        provider: PROVIDER.into(),
        message: message.into(),
    }
}

fn generation_error(message: impl Into<String>) -> BotError {
    BotError::Generation {
        provider: PROVIDER.into(),
        message: message.into(),
    }
}
