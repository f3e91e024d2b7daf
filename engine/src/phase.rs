//! Round and phase arithmetic.
//!
//! A round is a fixed window of `blocks_per_round` consecutive blocks. Within a round the
//! block offset selects the phase:
//!
//! 1. **Commit** - offsets `[0, commit_phase_blocks)`
//! 2. **Reveal** - offsets `[commit_phase_blocks, commit_phase_blocks + reveal_phase_blocks)`
//! 3. **Claim** - the remaining offsets
//!
//! Everything here is a pure function of the block number and the configuration.
//!
//! ## Usage
//!
//! ```rust
//! use monsi_engine::phase::PhaseCalculator;
//! use monsi_types::{GameConfig, Phase};
//!
//! let config = GameConfig::new(100, 25, 25).validate().unwrap();
//! let phases = PhaseCalculator::new(config);
//!
//! assert_eq!(phases.round_of(130), 1);
//! assert_eq!(phases.phase_of(130), Phase::Reveal);
//! assert_eq!(phases.round_label(130), "1(30)");
//! ```

use monsi_types::{Phase, ValidatedGameConfig};

/// Where a block sits within its phase and round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseProgress {
    pub round: u64,
    pub phase: Phase,
    /// Length of the current phase in blocks.
    pub length: u64,
    /// Blocks of the current phase elapsed, including this one.
    pub elapsed: u64,
    /// Blocks remaining in the round after this one.
    pub left_in_round: u64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PhaseCalculator {
    config: ValidatedGameConfig,
}

impl PhaseCalculator {
    pub fn new(config: ValidatedGameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatedGameConfig {
        &self.config
    }

    /// Round id of a block: `block / blocks_per_round`.
    pub fn round_of(&self, block: u64) -> u64 {
        block / self.config.blocks_per_round()
    }

    /// Offset of a block within its round.
    pub fn offset_of(&self, block: u64) -> u64 {
        block % self.config.blocks_per_round()
    }

    pub fn phase_of(&self, block: u64) -> Phase {
        let offset = self.offset_of(block);
        if offset < self.config.commit_phase_blocks() {
            Phase::Commit
        } else if offset < self.config.claim_phase_start() {
            Phase::Reveal
        } else {
            Phase::Claim
        }
    }

    /// First block of a round.
    pub fn round_start(&self, round: u64) -> u64 {
        round.saturating_mul(self.config.blocks_per_round())
    }

    fn phase_offset(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Commit => 0,
            Phase::Reveal => self.config.commit_phase_blocks(),
            Phase::Claim => self.config.claim_phase_start(),
        }
    }

    /// First block of `phase` in `round`.
    pub fn phase_start(&self, round: u64, phase: Phase) -> u64 {
        self.round_start(round)
            .saturating_add(self.phase_offset(phase))
    }

    pub fn progress(&self, block: u64) -> PhaseProgress {
        let offset = self.offset_of(block);
        let phase = self.phase_of(block);
        PhaseProgress {
            round: self.round_of(block),
            phase,
            length: self.config.phase_length(phase),
            elapsed: offset - self.phase_offset(phase) + 1,
            left_in_round: self.config.blocks_per_round() - offset - 1,
        }
    }

    /// Short label `"<round>(<offset>)"` used when reporting a block.
    pub fn round_label(&self, block: u64) -> String {
        format!("{}({})", self.round_of(block), self.offset_of(block))
    }
}
