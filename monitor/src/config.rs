use monsi_types::{GameConfig, Overlay, ParseError, ValidatedGameConfig};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::Level;

/// Block the mainnet staking contract was created in. Nothing happens before it.
pub const STAKING_CONTRACT_BLOCK: u64 = 25_527_075;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the monitor, read from YAML.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Overlays to highlight, as hex.
    #[serde(default)]
    pub highlight: Vec<String>,
    #[serde(default = "default_start_block")]
    pub start_block: u64,
    #[serde(default)]
    pub export_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            highlight: Vec::new(),
            start_block: default_start_block(),
            export_path: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid game configuration")]
    InvalidGame(#[from] monsi_types::ConfigError),
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("highlight overlay is invalid: {value}")]
    InvalidOverlay {
        value: String,
        #[source]
        source: ParseError,
    },
}

#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub game: ValidatedGameConfig,
    pub log_level: Level,
    pub log_format: LogFormat,
    pub highlight: Vec<Overlay>,
    pub start_block: u64,
    pub export_path: Option<PathBuf>,
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let game = self.game.validate()?;
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        let highlight = self
            .highlight
            .iter()
            .map(|value| {
                Overlay::from_hex(value).map_err(|source| ConfigError::InvalidOverlay {
                    value: value.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedConfig {
            game,
            log_level,
            log_format: self.log_format,
            highlight,
            start_block: self.start_block,
            export_path: self.export_path.map(PathBuf::from),
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_start_block() -> u64 {
    STAKING_CONTRACT_BLOCK
}
