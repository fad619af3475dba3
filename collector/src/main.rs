use anyhow::Result;
use clap::Parser;
use collector::{
    args::{normalize_legacy_flags, Args},
    cli,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("collector=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse_from(normalize_legacy_flags(std::env::args_os()));
    cli::run(args).await?;

    Ok(())
}
