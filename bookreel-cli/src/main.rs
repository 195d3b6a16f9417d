use anyhow::{Result, anyhow};
use bookreel_cli::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    bookreel_telemetry::init_with_config(&cli.telemetry())
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let result = bookreel_cli::run(cli).await;
    bookreel_telemetry::shutdown_telemetry();
    result
}
