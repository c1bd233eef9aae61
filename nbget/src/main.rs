use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nbget::cli::Args;
use nbget::retriever::Retriever;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; RUST_LOG takes precedence over --verbose
    let default_filter = if args.verbose { "warn,nbget=info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut retriever = Retriever::from_args(&args)?;
    retriever.run().await?;

    Ok(())
}
