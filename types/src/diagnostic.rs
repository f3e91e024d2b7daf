//! Structured diagnostics emitted by the game engine.
//!
//! The engine never formats or logs these itself. Anomalies are reported here and the
//! ledger keeps its last consistent state; presentation is left to the caller.

use crate::{Account, Action, Amount, Anchor, Overlay, RevealHash};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
}

/// Penalty kinds a claim can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    Freeze,
    Slash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A round entry was created.
    RoundStarted { round: u64, block: u64 },
    /// The cursor moved past a round that never saw a claim.
    RoundUnclaimed { round: u64, block: u64 },
    /// A different non-empty anchor was reported for a round that already has one.
    AnchorConflict {
        round: u64,
        kept: Anchor,
        rejected: Anchor,
    },
    /// A reveal disclosed a known hash with a different depth. The tally was left untouched.
    DepthMismatch {
        round: u64,
        overlay: Overlay,
        hash: RevealHash,
        recorded_depth: u8,
        revealed_depth: u8,
    },
    /// A second claim replaced the stored claim result of a round.
    ClaimOverwritten {
        round: u64,
        previous_winner: Overlay,
        replacement_winner: Overlay,
    },
    /// A claim penalised an overlay that was never observed. The instruction was skipped.
    UnknownOverlay {
        round: u64,
        overlay: Overlay,
        penalty: Penalty,
    },
    Frozen {
        overlay: Overlay,
        block: u64,
        thaw_block: u64,
        elapsed_blocks: u64,
    },
    /// A commit arrived while the overlay was still frozen; the freeze marker was cleared.
    FreezeLiftedEarly {
        overlay: Overlay,
        block: u64,
        thaw_block: u64,
    },
    StakeUpdated {
        overlay: Overlay,
        block: u64,
        #[serde(with = "crate::amount")]
        stake: Amount,
        change_count: u32,
    },
    Slashed {
        overlay: Overlay,
        block: u64,
        #[serde(with = "crate::amount")]
        requested: Amount,
        #[serde(with = "crate::amount")]
        removed: Amount,
        #[serde(with = "crate::amount")]
        stake: Amount,
        #[serde(with = "crate::amount")]
        total_slashed: Amount,
        change_count: u32,
    },
    /// An account was linked to an overlay for the first time.
    AccountLearned {
        overlay: Overlay,
        account: Account,
        highlighted: bool,
    },
    /// A locally tracked overlay acted.
    Highlighted {
        overlay: Overlay,
        action: Action,
        round: u64,
        block: u64,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::AnchorConflict { .. }
            | Diagnostic::DepthMismatch { .. }
            | Diagnostic::ClaimOverwritten { .. }
            | Diagnostic::UnknownOverlay { .. }
            | Diagnostic::FreezeLiftedEarly { .. }
            | Diagnostic::Frozen { .. }
            | Diagnostic::Slashed { .. } => Severity::Warn,
            Diagnostic::RoundStarted { .. }
            | Diagnostic::RoundUnclaimed { .. }
            | Diagnostic::StakeUpdated { .. }
            | Diagnostic::AccountLearned { .. }
            | Diagnostic::Highlighted { .. } => Severity::Info,
        }
    }

    /// Whether this diagnostic reports inconsistent chain data rather than normal activity.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            Diagnostic::AnchorConflict { .. }
                | Diagnostic::DepthMismatch { .. }
                | Diagnostic::ClaimOverwritten { .. }
                | Diagnostic::UnknownOverlay { .. }
                | Diagnostic::FreezeLiftedEarly { .. }
        )
    }
}
