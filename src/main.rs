use anyhow::Result;
use clap::Parser;
use submission_review::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!("submission-review starting");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(()) => tracing::info!("All reviews written"),
        Err(e) => tracing::error!(error = %e, "Review run failed"),
    }
    result
}
