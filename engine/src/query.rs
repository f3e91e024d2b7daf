//! Read-only queries over the engine state for rendering and export.
//!
//! ## Query Types
//!
//! - [`RoundStatus`]: whether a round is still open, claimed or closed without a claim
//! - [`ranked_hashes`]: a round's hash tally ordered by reveal count
//! - [`PlayerRoundRecord`]: a player's reveal in one round and whether it won
//! - [`LedgerSnapshot`]: serializable export of every player and round

use crate::game::SchellingGame;
use crate::players::Player;
use crate::rounds::{HashTally, Round};
use commonware_utils::hex;
use monsi_types::{BlockDetails, Overlay, RevealHash};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Claimed,
    Unclaimed,
}

pub fn round_status(round: &Round) -> RoundStatus {
    if round.claim().is_some() {
        RoundStatus::Claimed
    } else if round.is_unclaimed() {
        RoundStatus::Unclaimed
    } else {
        RoundStatus::Open
    }
}

/// Tally entries ordered by count (descending), ties by hash.
pub fn ranked_hashes(round: &Round) -> Vec<(RevealHash, HashTally)> {
    let mut ranked: Vec<_> = round
        .hashes()
        .iter()
        .map(|(hash, tally)| (*hash, *tally))
        .collect();
    ranked.sort_by(|(ha, ta), (hb, tb)| tb.count.cmp(&ta.count).then(ha.cmp(hb)));
    ranked
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerRoundRecord {
    pub round: u64,
    pub hash: RevealHash,
    pub depth: u8,
    /// The player was the recorded winner of the round.
    pub won: bool,
}

/// Reveals of `overlay` in round order. Empty if the overlay is unknown.
pub fn player_history(game: &SchellingGame, overlay: &Overlay) -> Vec<PlayerRoundRecord> {
    let Some(player) = game.player(overlay) else {
        return Vec::new();
    };
    player
        .reveals()
        .iter()
        .map(|(round, record)| PlayerRoundRecord {
            round: *round,
            hash: record.hash,
            depth: record.depth,
            won: game
                .round(*round)
                .and_then(Round::claim)
                .is_some_and(|claim| claim.winner == *overlay),
        })
        .collect()
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundView<'a> {
    pub status: RoundStatus,
    #[serde(flatten)]
    pub round: &'a Round,
}

/// Ordered export of the whole ledger.
#[derive(Clone, Debug, Serialize)]
pub struct LedgerSnapshot<'a> {
    pub current_round: Option<u64>,
    pub last_block: Option<BlockDetails>,
    /// Hex SHA-256 of the canonical ledger encoding.
    pub digest: String,
    pub players: Vec<&'a Player>,
    pub rounds: Vec<RoundView<'a>>,
}

impl<'a> LedgerSnapshot<'a> {
    pub fn capture(game: &'a SchellingGame) -> Self {
        Self {
            current_round: game.current_round(),
            last_block: game.last_block().copied(),
            digest: hex(game.digest().as_ref()),
            players: game.players().collect(),
            rounds: game
                .rounds()
                .map(|round| RoundView {
                    status: round_status(round),
                    round,
                })
                .collect(),
        }
    }
}
