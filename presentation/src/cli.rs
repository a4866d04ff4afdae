use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::Result;
use application::index_service::IndexService;
use application::prompt::PromptTemplate;
use application::qa_service::{AnswerGenerator, QaService, Retriever};
use clap::Parser;
use colored::Colorize;
use infrastructure::config::Config;
use infrastructure::gemini_client::GeminiClient;
use tracing::info;

use crate::repl::Repl;

#[derive(Parser, Debug)]
#[command(name = "uday_bot")]
#[command(about = "Ask questions about Uday Raj, answered from a local vector index")]
pub struct BotArgs {
    /// Directory holding the vector index (overrides INDEX_DIR)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Settings file to load instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(name = "build_vector_db")]
#[command(about = "Split the source text, embed it and write the vector index")]
pub struct IndexerArgs {
    /// Plaintext source document (overrides SOURCE_PATH)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Output directory for the index (overrides INDEX_DIR)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Settings file to load instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

fn load_config(env_file: Option<&Path>) -> Result<Config> {
    let config = match env_file {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

pub async fn run_bot(args: BotArgs) -> Result<()> {
    let mut config = load_config(args.env_file.as_deref())?;
    if let Some(dir) = args.index_dir {
        config.index_dir = dir;
    }

    let client = GeminiClient::new(&config)?;
    let retriever = Retriever::open(client.clone(), &config.index_dir, config.top_k);
    let generator = AnswerGenerator::new(client, PromptTemplate::new(&config.subject_name));
    let qa = QaService::new(retriever, generator);

    let stdout = io::stdout();
    let repl = Repl::new(&qa, &config.subject_name, &config.subject_short_name)
        .styled(stdout.is_terminal());
    repl.run(io::stdin().lock(), &mut stdout.lock()).await
}

pub async fn run_indexer(args: IndexerArgs) -> Result<()> {
    let mut config = load_config(args.env_file.as_deref())?;
    if let Some(source) = args.source {
        config.source_path = source;
    }
    if let Some(dir) = args.index_dir {
        config.index_dir = dir;
    }

    let client = GeminiClient::new(&config)?;
    let service = IndexService::new(client, &config);
    let report = service
        .build_index(&config.source_path, &config.index_dir)
        .await?;
    info!(
        chunks = report.chunk_count,
        entries = report.entry_count,
        dimensions = report.dimensions,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "indexing finished"
    );

    let line = format!("✅ Vector DB created at {}", report.index_dir.display());
    if io::stdout().is_terminal() {
        println!("{}", line.green());
    } else {
        println!("{line}");
    }
    Ok(())
}
