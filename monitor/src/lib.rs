//! Storage incentives monitor.
//!
//! Loads a decoded event log, replays it through [`monsi_engine::SchellingGame`] from a
//! checkpoint block and renders the resulting diagnostics as log lines.

pub mod config;
pub mod events;
pub mod render;
pub mod session;

pub use config::{Config, ConfigError, LogFormat, ValidatedConfig, STAKING_CONTRACT_BLOCK};
pub use session::{Session, SessionStats};
