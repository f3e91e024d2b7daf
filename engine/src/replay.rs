//! Event dispatch and replay.
//!
//! The engine keeps no durable state. After a restart the caller replays its event log
//! from a checkpoint block and ends up with the same ledger it had before.
//!
//! ## Usage
//!
//! ```rust
//! use monsi_engine::replay::{filter_from_block, replay};
//! use monsi_types::{ChainEvent, GameConfig};
//!
//! let config = GameConfig::default().validate().unwrap();
//! let events = vec![
//!     ChainEvent::BlockTick { block_no: 10, block_timestamp: 0, anchor: None },
//!     ChainEvent::BlockTick { block_no: 200, block_timestamp: 0, anchor: None },
//! ];
//!
//! let (game, _diagnostics) = replay(config, filter_from_block(&events, 100));
//! assert_eq!(game.current_round(), Some(1));
//! assert_eq!(game.round_count(), 1);
//! ```

use crate::game::SchellingGame;
use monsi_types::{BlockDetails, ChainEvent, Diagnostic, ValidatedGameConfig};

impl SchellingGame {
    /// Dispatch a decoded chain event to the matching engine operation.
    pub fn apply(&mut self, event: &ChainEvent) -> Vec<Diagnostic> {
        match event {
            ChainEvent::BlockTick {
                block_no,
                block_timestamp,
                anchor,
            } => self.new_block(BlockDetails::new(*block_no, *block_timestamp), *anchor),
            ChainEvent::Committed {
                overlay,
                owner,
                block_no,
            } => self.commit(*overlay, *owner, *block_no),
            ChainEvent::Revealed {
                overlay,
                owner,
                hash,
                depth,
                block_no,
            } => self.reveal(*overlay, *owner, *hash, *depth, *block_no),
            ChainEvent::Claimed {
                winner_overlay,
                owner,
                truth_hash,
                depth,
                amount,
                freezes,
                slashes,
                block_no,
            } => self.claim(
                *winner_overlay,
                *owner,
                *truth_hash,
                *depth,
                *amount,
                freezes,
                slashes,
                *block_no,
            ),
            ChainEvent::StakeUpdated {
                overlay,
                owner,
                amount,
                block_no,
            } => self.stake_updated(*overlay, *owner, *amount, *block_no),
            ChainEvent::StakeSlashed {
                overlay,
                amount,
                block_no,
            } => self.stake_slashed(*overlay, *amount, *block_no),
        }
    }
}

/// Build a fresh engine and apply `events` in order.
///
/// Returns the engine together with every diagnostic produced along the way.
pub fn replay<'a>(
    config: ValidatedGameConfig,
    events: impl IntoIterator<Item = &'a ChainEvent>,
) -> (SchellingGame, Vec<Diagnostic>) {
    let mut game = SchellingGame::new(config);
    let mut diagnostics = Vec::new();
    for event in events {
        diagnostics.extend(game.apply(event));
    }
    (game, diagnostics)
}

/// Events at or after `checkpoint`, in log order.
pub fn filter_from_block(events: &[ChainEvent], checkpoint: u64) -> Vec<&ChainEvent> {
    events
        .iter()
        .filter(|event| event.block_no() >= checkpoint)
        .collect()
}
