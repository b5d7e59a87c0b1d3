//! Marquee Core - Shared configuration and tracing
//!
//! Holds the settings every Marquee crate reads (HTTP behaviour, API keys,
//! provider endpoints) and the tracing subscriber setup used by the CLI.

pub mod config;
pub mod tracing_setup;

pub use config::{ApiKeyConfig, EndpointConfig, HttpConfig, MarqueeConfig};
pub use tracing_setup::{CliLogLevel, init_tracing};
