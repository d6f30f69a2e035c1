//! Binary entry point: logging setup and CLI dispatch.

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use huddle::cli::Cli;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_env("HUDDLE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    if let Err(err) = huddle::cli::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
