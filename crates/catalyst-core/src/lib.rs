//! Core types and utilities for the catalyst records console

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod resource;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, AuthConfig, Config, LoggingConfig};
pub use error::{Error, Result};
pub use resource::{FieldKind, FieldSpec, ResourceDescriptor};
pub use types::{AccessToken, Comment, FieldChanges, Record, RecordId, StatusHistoryEntry};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if logging.format == "json" {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(
            level = %logging.level,
            format = %logging.format,
            "Logging initialized"
        );
    }
}
