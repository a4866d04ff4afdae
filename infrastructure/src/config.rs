use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use shared::types::{BotError, Result};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/gemini-embedding-001";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_SOURCE_PATH: &str = "uday_info.txt";
pub const DEFAULT_INDEX_DIR: &str = "./vector_db";
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;
/// Upper bound accepted by `batchEmbedContents`.
pub const MAX_EMBED_BATCH_SIZE: usize = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub source_path: PathBuf,
    pub index_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embed_batch_size: usize,
    pub request_timeout: Duration,
    /// Full name used inside the prompt, e.g. "Uday Raj".
    pub subject_name: String,
    /// Short name used in the terminal prompt, e.g. "Uday".
    pub subject_short_name: String,
}

impl Config {
    /// Read `.env` from the working directory (if present), then the process environment.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::load`] but with an explicit settings file, which must exist.
    pub fn load_from(env_file: &Path) -> Result<Self> {
        dotenvy::from_path(env_file).map_err(|e| {
            BotError::Config(format!(
                "cannot read settings file {}: {e}",
                env_file.display()
            ))
        })?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let string_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let gemini_api_key = get("GOOGLE_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or_else(|| {
                BotError::Config(
                    "GOOGLE_API_KEY (or GEMINI_API_KEY) must be set in the environment or .env"
                        .to_string(),
                )
            })?;

        let config = Self {
            gemini_api_key,
            gemini_base_url: string_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            embedding_model: string_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            chat_model: string_or("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            source_path: PathBuf::from(string_or("SOURCE_PATH", DEFAULT_SOURCE_PATH)),
            index_dir: PathBuf::from(string_or("INDEX_DIR", DEFAULT_INDEX_DIR)),
            chunk_size: parse_or(get("CHUNK_SIZE"), "CHUNK_SIZE", 500)?,
            chunk_overlap: parse_or(get("CHUNK_OVERLAP"), "CHUNK_OVERLAP", 50)?,
            top_k: parse_or(get("TOP_K"), "TOP_K", DEFAULT_TOP_K)?,
            embed_batch_size: parse_or(
                get("EMBED_BATCH_SIZE"),
                "EMBED_BATCH_SIZE",
                DEFAULT_EMBED_BATCH_SIZE,
            )?,
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            subject_name: string_or("SUBJECT_NAME", "Uday Raj"),
            subject_short_name: string_or("SUBJECT_SHORT_NAME", "Uday"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the numeric settings are mutually consistent.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(BotError::Config("CHUNK_SIZE must be greater than zero".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(BotError::Config(format!(
                "CHUNK_OVERLAP ({}) must be less than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(BotError::Config("TOP_K must be greater than zero".into()));
        }
        if self.embed_batch_size == 0 || self.embed_batch_size > MAX_EMBED_BATCH_SIZE {
            return Err(BotError::Config(format!(
                "EMBED_BATCH_SIZE must be between 1 and {MAX_EMBED_BATCH_SIZE}, got {}",
                self.embed_batch_size
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(BotError::Config(
                "REQUEST_TIMEOUT_SECS must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|e| BotError::Config(format!("{key}={value:?} is not valid: {e}"))),
    }
}
