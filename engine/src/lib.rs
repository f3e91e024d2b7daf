//! Monsi game-state engine.
//!
//! This crate applies decoded chain events from the storage incentives game (commit,
//! reveal, claim, stake changes) to an in-memory ledger of players and rounds. The primary
//! entrypoint is [`SchellingGame`].
//!
//! ## Determinism requirements
//! - Do not read wall-clock time inside the engine.
//! - Avoid iteration order of hash-based collections influencing outputs.
//! - Events must be applied in non-decreasing block order.
//!
//! The engine holds no durable state. Recovery replays the event log from an externally
//! supplied checkpoint (see [`replay()`]) and must converge to the same ledger.
//!
//! ## Minimal pipeline (example)
//! ```rust
//! use monsi_engine::SchellingGame;
//! use monsi_types::{Account, BlockDetails, GameConfig, Overlay, RevealHash};
//!
//! let config = GameConfig::new(100, 25, 25).validate().unwrap();
//! let mut game = SchellingGame::new(config);
//!
//! let overlay = Overlay::new([0xaa; 32]);
//! let owner = Account::new([0x01; 20]);
//! game.commit(overlay, owner, 5);
//! game.reveal(overlay, owner, RevealHash::new([7; 32]), 3, 30);
//! let diagnostics = game.new_block(BlockDetails::new(101, 0), None);
//!
//! assert!(game.round(0).unwrap().is_unclaimed());
//! assert_eq!(game.current_round(), Some(1));
//! assert!(!diagnostics.is_empty());
//! ```

pub mod game;
pub mod phase;
pub mod players;
pub mod query;
pub mod replay;
pub mod rounds;

#[cfg(test)]
mod scenario_tests;

pub use game::SchellingGame;
pub use phase::{PhaseCalculator, PhaseProgress};
pub use players::{Player, PlayerLedger, RevealRecord};
pub use query::{
    player_history, ranked_hashes, round_status, LedgerSnapshot, PlayerRoundRecord, RoundStatus,
    RoundView,
};
pub use replay::{filter_from_block, replay};
pub use rounds::{Claim, HashTally, Round, RoundLedger};
