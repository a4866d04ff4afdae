use clap::Parser;
use presentation::cli::{run_bot, BotArgs};
use shared::telemetry::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing("warn");
    let args = BotArgs::parse();
    if let Err(e) = run_bot(args).await {
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}
