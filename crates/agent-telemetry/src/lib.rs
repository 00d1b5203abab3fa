//! # Agent Telemetry
//!
//! Structured logging for the agent's key-authentication handler.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KEYAUTH_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `KEYAUTH_JSON_LOGS` | `false` | Emit JSON lines |
//! | `KEYAUTH_SERVICE_NAME` | `ssh-agent` | Service name field |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Logging initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("A global subscriber is already installed")]
    AlreadyInitialized,
}
