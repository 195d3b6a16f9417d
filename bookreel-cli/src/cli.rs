use bookreel_telemetry::{LogFormat, TelemetryConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "bookreel")]
#[command(about = "Voice assistant that recommends books and movies", long_about = None)]
pub struct Cli {
    /// Optional TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Export spans to this OTLP collector (gRPC)
    #[arg(long, global = true, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging and tracing setup for this invocation.
    pub fn telemetry(&self) -> TelemetryConfig {
        let mut config =
            TelemetryConfig::new("bookreel").with_default_level(self.command.log_level());
        if self.json_logs {
            config = config.with_format(LogFormat::Json);
        }
        if let Some(endpoint) = &self.otlp_endpoint {
            config = config.with_otlp_endpoint(endpoint.clone());
        }
        config
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the worker and serve every listed room
    Start {
        /// Room to join (repeatable)
        #[arg(short, long = "room", required = true, num_args = 1..)]
        rooms: Vec<String>,

        /// Upper bound on rooms served at once
        #[arg(long)]
        max_jobs: Option<usize>,
    },

    /// Serve a single room with debug logging
    Dev {
        /// Room to join
        #[arg(short, long)]
        room: String,
    },

    /// Talk to the agent by typing, without audio
    Console,
}

impl Commands {
    /// Default log level when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self {
            Commands::Start { .. } => "info",
            Commands::Dev { .. } => "debug",
            Commands::Console => "warn",
        }
    }
}
