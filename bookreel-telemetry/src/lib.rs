//! # bookreel telemetry
//!
//! Structured logging for the assistant, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust
//! use bookreel_telemetry::{init_telemetry, info};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry("bookreel")?;
//!     info!("worker starting");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Span, debug, error, info, instrument, trace, warn};

pub use spans::*;

pub use init::{LogFormat, TelemetryConfig, init_telemetry, init_with_config, shutdown_telemetry};
