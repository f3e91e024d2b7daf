//! Common types used throughout monsi.
//!
//! Identifiers, game configuration, decoded chain events consumed by the engine and the
//! diagnostics it emits.

pub mod amount;
pub mod chain;
pub mod config;
pub mod diagnostic;
pub mod ids;

pub use chain::{Action, Amount, BlockDetails, ChainEvent, StakeFreeze, StakeSlash};
pub use config::{ConfigError, GameConfig, Phase, ValidatedGameConfig};
pub use diagnostic::{Diagnostic, Penalty, Severity};
pub use ids::{Account, Anchor, Overlay, ParseError, RevealHash};
