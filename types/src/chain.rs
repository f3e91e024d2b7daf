//! Decoded chain events consumed by the game engine.
//!
//! Events arrive already decoded from contract logs and ordered by block number.

use crate::{Account, Anchor, Overlay, RevealHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amounts (BZZ base units) exceed `u64`, so amounts are carried as `u128`.
pub type Amount = u128;

/// Block number and timestamp of an observed block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDetails {
    pub block_no: u64,
    #[serde(default)]
    pub block_timestamp: u64,
}

impl BlockDetails {
    pub fn new(block_no: u64, block_timestamp: u64) -> Self {
        Self {
            block_no,
            block_timestamp,
        }
    }
}

/// A freeze instruction carried by a claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeFreeze {
    pub overlay: Overlay,
    pub duration_blocks: u64,
}

/// A slash instruction carried by a claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeSlash {
    pub overlay: Overlay,
    #[serde(with = "crate::amount")]
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainEvent {
    BlockTick {
        block_no: u64,
        #[serde(default)]
        block_timestamp: u64,
        #[serde(default)]
        anchor: Option<Anchor>,
    },
    Committed {
        overlay: Overlay,
        owner: Account,
        block_no: u64,
    },
    Revealed {
        overlay: Overlay,
        owner: Account,
        hash: RevealHash,
        depth: u8,
        block_no: u64,
    },
    Claimed {
        winner_overlay: Overlay,
        owner: Account,
        truth_hash: RevealHash,
        depth: u8,
        #[serde(with = "crate::amount")]
        amount: Amount,
        #[serde(default)]
        freezes: Vec<StakeFreeze>,
        #[serde(default)]
        slashes: Vec<StakeSlash>,
        block_no: u64,
    },
    StakeUpdated {
        overlay: Overlay,
        owner: Account,
        #[serde(with = "crate::amount")]
        amount: Amount,
        block_no: u64,
    },
    StakeSlashed {
        overlay: Overlay,
        #[serde(with = "crate::amount")]
        amount: Amount,
        block_no: u64,
    },
}

impl ChainEvent {
    pub fn block_no(&self) -> u64 {
        match self {
            ChainEvent::BlockTick { block_no, .. }
            | ChainEvent::Committed { block_no, .. }
            | ChainEvent::Revealed { block_no, .. }
            | ChainEvent::Claimed { block_no, .. }
            | ChainEvent::StakeUpdated { block_no, .. }
            | ChainEvent::StakeSlashed { block_no, .. } => *block_no,
        }
    }

    /// Overlay the event is about, if any.
    pub fn overlay(&self) -> Option<&Overlay> {
        match self {
            ChainEvent::BlockTick { .. } => None,
            ChainEvent::Committed { overlay, .. }
            | ChainEvent::Revealed { overlay, .. }
            | ChainEvent::StakeUpdated { overlay, .. }
            | ChainEvent::StakeSlashed { overlay, .. } => Some(overlay),
            ChainEvent::Claimed { winner_overlay, .. } => Some(winner_overlay),
        }
    }
}

/// Last action recorded against a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Commit,
    Reveal,
    Claim,
    Freeze,
    Stake,
    Slash,
}

impl Action {
    /// Stable tag used in canonical encodings.
    pub fn tag(&self) -> u8 {
        match self {
            Action::Commit => 0,
            Action::Reveal => 1,
            Action::Claim => 2,
            Action::Freeze => 3,
            Action::Stake => 4,
            Action::Slash => 5,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Commit => "commit",
            Action::Reveal => "reveal",
            Action::Claim => "claim",
            Action::Freeze => "freeze",
            Action::Stake => "stake",
            Action::Slash => "slash",
        };
        f.write_str(name)
    }
}
