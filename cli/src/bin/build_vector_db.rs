use clap::Parser;
use presentation::cli::{run_indexer, IndexerArgs};
use shared::telemetry::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing("info");
    let args = IndexerArgs::parse();
    if let Err(e) = run_indexer(args).await {
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}
