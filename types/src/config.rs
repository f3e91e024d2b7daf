//! Game timing configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Blocks per round on the Swarm redistribution contract.
pub const DEFAULT_BLOCKS_PER_ROUND: u64 = 152;
/// Blocks in the commit phase on the Swarm redistribution contract.
pub const DEFAULT_COMMIT_PHASE_BLOCKS: u64 = DEFAULT_BLOCKS_PER_ROUND / 4;
/// Blocks in the reveal phase on the Swarm redistribution contract.
pub const DEFAULT_REVEAL_PHASE_BLOCKS: u64 = DEFAULT_BLOCKS_PER_ROUND / 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be > 0")]
    Zero { field: &'static str },
    #[error(
        "commit_phase_blocks + reveal_phase_blocks must be < blocks_per_round \
         (commit={commit}, reveal={reveal}, round={round})"
    )]
    NoClaimPhase { commit: u64, reveal: u64, round: u64 },
}

/// Phase of a round, derived from the block offset within the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Commit,
    Reveal,
    Claim,
}

impl Phase {
    /// Whether the round anchor may still be reported during this phase.
    pub fn accepts_anchor(&self) -> bool {
        matches!(self, Phase::Commit | Phase::Reveal)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Commit => f.write_str("commit"),
            Phase::Reveal => f.write_str("reveal"),
            Phase::Claim => f.write_str("claim"),
        }
    }
}

/// Round geometry in blocks, as read from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_blocks_per_round")]
    pub blocks_per_round: u64,
    #[serde(default = "default_commit_phase_blocks")]
    pub commit_phase_blocks: u64,
    #[serde(default = "default_reveal_phase_blocks")]
    pub reveal_phase_blocks: u64,
}

fn default_blocks_per_round() -> u64 {
    DEFAULT_BLOCKS_PER_ROUND
}

fn default_commit_phase_blocks() -> u64 {
    DEFAULT_COMMIT_PHASE_BLOCKS
}

fn default_reveal_phase_blocks() -> u64 {
    DEFAULT_REVEAL_PHASE_BLOCKS
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            blocks_per_round: DEFAULT_BLOCKS_PER_ROUND,
            commit_phase_blocks: DEFAULT_COMMIT_PHASE_BLOCKS,
            reveal_phase_blocks: DEFAULT_REVEAL_PHASE_BLOCKS,
        }
    }
}

impl GameConfig {
    pub fn new(blocks_per_round: u64, commit_phase_blocks: u64, reveal_phase_blocks: u64) -> Self {
        Self {
            blocks_per_round,
            commit_phase_blocks,
            reveal_phase_blocks,
        }
    }

    /// Check every length is positive and that some blocks remain for the claim phase.
    pub fn validate(self) -> Result<ValidatedGameConfig, ConfigError> {
        if self.blocks_per_round == 0 {
            return Err(ConfigError::Zero {
                field: "blocks_per_round",
            });
        }
        if self.commit_phase_blocks == 0 {
            return Err(ConfigError::Zero {
                field: "commit_phase_blocks",
            });
        }
        if self.reveal_phase_blocks == 0 {
            return Err(ConfigError::Zero {
                field: "reveal_phase_blocks",
            });
        }
        let commit_and_reveal = self
            .commit_phase_blocks
            .saturating_add(self.reveal_phase_blocks);
        if commit_and_reveal >= self.blocks_per_round {
            return Err(ConfigError::NoClaimPhase {
                commit: self.commit_phase_blocks,
                reveal: self.reveal_phase_blocks,
                round: self.blocks_per_round,
            });
        }
        Ok(ValidatedGameConfig(self))
    }
}

/// A [GameConfig] that passed [GameConfig::validate].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedGameConfig(GameConfig);

impl ValidatedGameConfig {
    pub fn blocks_per_round(&self) -> u64 {
        self.0.blocks_per_round
    }

    pub fn commit_phase_blocks(&self) -> u64 {
        self.0.commit_phase_blocks
    }

    pub fn reveal_phase_blocks(&self) -> u64 {
        self.0.reveal_phase_blocks
    }

    /// First offset of the claim phase.
    pub fn claim_phase_start(&self) -> u64 {
        self.0.commit_phase_blocks + self.0.reveal_phase_blocks
    }

    /// Length of a phase in blocks.
    pub fn phase_length(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Commit => self.0.commit_phase_blocks,
            Phase::Reveal => self.0.reveal_phase_blocks,
            Phase::Claim => self.0.blocks_per_round - self.claim_phase_start(),
        }
    }

    pub fn inner(&self) -> &GameConfig {
        &self.0
    }
}

impl Default for ValidatedGameConfig {
    fn default() -> Self {
        Self(GameConfig::default())
    }
}
