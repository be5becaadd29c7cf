// src/main.rs — Atelier entry point

use clap::Parser;

use atelier::cli::Cli;
use atelier::engine::DesignEngine;
use atelier::infra::config::Config;
use atelier::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG)
    logger::init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no atelier.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    let engine = DesignEngine::from_config(&config);
    atelier::cli::run(&engine, cli.command).await
}
