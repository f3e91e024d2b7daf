//! Round ledger: per-round participation, hash tally and claim outcome.
//!
//! Rounds reference players by overlay only; player state is resolved through the
//! [PlayerLedger] passed in by the engine.

use crate::players::PlayerLedger;
use bytes::BufMut;
use commonware_codec::{EncodeSize, Write};
use monsi_types::{
    Amount, Anchor, Diagnostic, Overlay, Penalty, RevealHash, StakeFreeze, StakeSlash,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tally entry for one revealed hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HashTally {
    pub depth: u8,
    pub count: u32,
    /// Set when any locally tracked overlay revealed this hash.
    pub highlighted: bool,
}

/// Result of a round's claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub winner: Overlay,
    pub truth: RevealHash,
    pub depth: u8,
    #[serde(with = "monsi_types::amount")]
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Round {
    id: u64,
    anchor: Option<Anchor>,
    last_block: u64,
    commits: u32,
    reveals: u32,
    freezes: u32,
    slashes: u32,
    players: Vec<Overlay>,
    hashes: BTreeMap<RevealHash, HashTally>,
    claim: Option<Claim>,
    unclaimed: bool,
}

impl Round {
    pub fn new(id: u64, block: u64) -> Self {
        Self {
            id,
            anchor: None,
            last_block: block,
            commits: 0,
            reveals: 0,
            freezes: 0,
            slashes: 0,
            players: Vec::new(),
            hashes: BTreeMap::new(),
            claim: None,
            unclaimed: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub fn last_block(&self) -> u64 {
        self.last_block
    }

    pub fn commits(&self) -> u32 {
        self.commits
    }

    pub fn reveals(&self) -> u32 {
        self.reveals
    }

    pub fn freezes(&self) -> u32 {
        self.freezes
    }

    pub fn slashes(&self) -> u32 {
        self.slashes
    }

    /// Committing overlays in commit order.
    pub fn players(&self) -> &[Overlay] {
        &self.players
    }

    pub fn hashes(&self) -> &BTreeMap<RevealHash, HashTally> {
        &self.hashes
    }

    pub fn claim(&self) -> Option<&Claim> {
        self.claim.as_ref()
    }

    pub fn is_unclaimed(&self) -> bool {
        self.unclaimed
    }

    pub fn touch(&mut self, block: u64) {
        self.last_block = block;
    }

    /// Record the round anchor. The first non-empty anchor is kept; a later different
    /// value is reported and discarded.
    pub fn set_anchor(&mut self, anchor: Option<Anchor>) -> Option<Diagnostic> {
        let anchor = anchor.filter(|anchor| !anchor.is_zero())?;
        match self.anchor {
            None => {
                self.anchor = Some(anchor);
                None
            }
            Some(kept) if kept != anchor => Some(Diagnostic::AnchorConflict {
                round: self.id,
                kept,
                rejected: anchor,
            }),
            Some(_) => None,
        }
    }

    pub fn record_commit(&mut self, overlay: Overlay) {
        self.commits = self.commits.saturating_add(1);
        self.players.push(overlay);
    }

    /// Count a reveal into the hash tally. A known hash revealed with a different depth
    /// leaves its tally entry untouched and is reported.
    pub fn record_reveal(
        &mut self,
        overlay: Overlay,
        hash: RevealHash,
        depth: u8,
        highlighted: bool,
    ) -> Option<Diagnostic> {
        self.reveals = self.reveals.saturating_add(1);
        match self.hashes.get_mut(&hash) {
            None => {
                self.hashes.insert(
                    hash,
                    HashTally {
                        depth,
                        count: 1,
                        highlighted,
                    },
                );
                None
            }
            Some(tally) if tally.depth != depth => Some(Diagnostic::DepthMismatch {
                round: self.id,
                overlay,
                hash,
                recorded_depth: tally.depth,
                revealed_depth: depth,
            }),
            Some(tally) => {
                tally.count = tally.count.saturating_add(1);
                tally.highlighted |= highlighted;
                None
            }
        }
    }

    /// Store the claim result, reporting when it replaces an earlier one.
    pub fn set_claim(&mut self, claim: Claim) -> Option<Diagnostic> {
        let previous = self.claim.replace(claim)?;
        Some(Diagnostic::ClaimOverwritten {
            round: self.id,
            previous_winner: previous.winner,
            replacement_winner: claim.winner,
        })
    }

    /// Mark the round as closed without a claim. Returns true only the first time.
    pub fn mark_unclaimed(&mut self, block: u64) -> bool {
        if self.claim.is_some() || self.unclaimed {
            return false;
        }
        self.last_block = block;
        self.unclaimed = true;
        true
    }

    /// Hash with the most reveals; ties resolve to the smallest hash.
    pub fn leading_hash(&self) -> Option<(&RevealHash, &HashTally)> {
        self.hashes
            .iter()
            .max_by(|(ha, ta), (hb, tb)| ta.count.cmp(&tb.count).then(hb.cmp(ha)))
    }
}

impl Write for HashTally {
    fn write(&self, writer: &mut impl BufMut) {
        self.depth.write(writer);
        self.count.write(writer);
        self.highlighted.write(writer);
    }
}

impl EncodeSize for HashTally {
    fn encode_size(&self) -> usize {
        self.depth.encode_size() + self.count.encode_size() + self.highlighted.encode_size()
    }
}

impl Write for Claim {
    fn write(&self, writer: &mut impl BufMut) {
        self.winner.write(writer);
        self.truth.write(writer);
        self.depth.write(writer);
        self.amount.write(writer);
    }
}

impl EncodeSize for Claim {
    fn encode_size(&self) -> usize {
        self.winner.encode_size()
            + self.truth.encode_size()
            + self.depth.encode_size()
            + self.amount.encode_size()
    }
}

impl Write for Round {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.anchor.write(writer);
        self.last_block.write(writer);
        self.commits.write(writer);
        self.reveals.write(writer);
        self.freezes.write(writer);
        self.slashes.write(writer);
        (self.players.len() as u32).write(writer);
        for overlay in &self.players {
            overlay.write(writer);
        }
        (self.hashes.len() as u32).write(writer);
        for (hash, tally) in &self.hashes {
            hash.write(writer);
            tally.write(writer);
        }
        self.claim.write(writer);
        self.unclaimed.write(writer);
    }
}

impl EncodeSize for Round {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.anchor.encode_size()
            + self.last_block.encode_size()
            + self.commits.encode_size()
            + self.reveals.encode_size()
            + self.freezes.encode_size()
            + self.slashes.encode_size()
            + (self.players.len() as u32).encode_size()
            + self
                .players
                .iter()
                .map(|overlay| overlay.encode_size())
                .sum::<usize>()
            + (self.hashes.len() as u32).encode_size()
            + self
                .hashes
                .iter()
                .map(|(hash, tally)| hash.encode_size() + tally.encode_size())
                .sum::<usize>()
            + self.claim.encode_size()
            + self.unclaimed.encode_size()
    }
}

/// Keyed store of rounds, ordered by round id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundLedger {
    rounds: BTreeMap<u64, Round>,
}

impl RoundLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return round `id`, creating it if needed. Creating a round resets every player's
    /// active flag since nobody has played it yet.
    pub fn get_or_create(
        &mut self,
        id: u64,
        block: u64,
        players: &mut PlayerLedger,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> &mut Round {
        self.rounds.entry(id).or_insert_with(|| {
            players.reset_activity();
            diagnostics.push(Diagnostic::RoundStarted { round: id, block });
            Round::new(id, block)
        })
    }

    /// Record a claim for round `id` and apply its penalties.
    ///
    /// Freeze and slash instructions for overlays the player ledger has never seen are
    /// skipped and reported. Does nothing if the round does not exist.
    #[allow(clippy::too_many_arguments)]
    pub fn record_claim(
        &mut self,
        id: u64,
        block: u64,
        claim: Claim,
        freezes: &[StakeFreeze],
        slashes: &[StakeSlash],
        players: &mut PlayerLedger,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let Some(round) = self.rounds.get_mut(&id) else {
            return;
        };

        for freeze in freezes {
            match players.get_mut(&freeze.overlay) {
                Some(player) => {
                    let thaw_block = block.saturating_add(freeze.duration_blocks);
                    diagnostics.push(player.freeze(block, thaw_block));
                }
                None => diagnostics.push(Diagnostic::UnknownOverlay {
                    round: id,
                    overlay: freeze.overlay,
                    penalty: Penalty::Freeze,
                }),
            }
        }

        for slash in slashes {
            match players.get_mut(&slash.overlay) {
                Some(player) => diagnostics.push(player.slash(block, slash.amount)),
                None => diagnostics.push(Diagnostic::UnknownOverlay {
                    round: id,
                    overlay: slash.overlay,
                    penalty: Penalty::Slash,
                }),
            }
        }

        diagnostics.extend(round.set_claim(claim));
        round.freezes = freezes.len() as u32;
        round.slashes = slashes.len() as u32;
    }

    pub fn get(&self, id: u64) -> Option<&Round> {
        self.rounds.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Round> {
        self.rounds.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Rounds in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::Encode;

    fn overlay(n: u8) -> Overlay {
        Overlay::new([n; 32])
    }

    fn hash(n: u8) -> RevealHash {
        RevealHash::new([n; 32])
    }

    fn claim(winner: u8) -> Claim {
        Claim {
            winner: overlay(winner),
            truth: hash(1),
            depth: 3,
            amount: 1_000,
        }
    }

    #[test]
    fn test_anchor_set_once() {
        let mut round = Round::new(0, 0);
        let first = Anchor::new([1; 32]);
        let second = Anchor::new([2; 32]);

        assert_eq!(round.set_anchor(None), None);
        assert_eq!(round.set_anchor(Some(Anchor::default())), None);
        assert_eq!(round.anchor(), None);

        assert_eq!(round.set_anchor(Some(first)), None);
        assert_eq!(round.set_anchor(Some(first)), None);
        assert_eq!(
            round.set_anchor(Some(second)),
            Some(Diagnostic::AnchorConflict {
                round: 0,
                kept: first,
                rejected: second
            })
        );
        assert_eq!(round.anchor(), Some(&first));

        // An empty anchor never clears or conflicts.
        assert_eq!(round.set_anchor(Some(Anchor::default())), None);
        assert_eq!(round.anchor(), Some(&first));
    }

    #[test]
    fn test_commit_appends_participants() {
        let mut round = Round::new(0, 0);
        round.record_commit(overlay(2));
        round.record_commit(overlay(1));
        assert_eq!(round.commits(), 2);
        assert_eq!(round.players(), &[overlay(2), overlay(1)]);
    }

    #[test]
    fn test_reveal_tally_merges_matching_depth() {
        let mut round = Round::new(0, 0);
        assert_eq!(round.record_reveal(overlay(1), hash(7), 3, false), None);
        assert_eq!(round.record_reveal(overlay(2), hash(7), 3, true), None);
        let tally = round.hashes()[&hash(7)];
        assert_eq!(tally.count, 2);
        assert_eq!(tally.depth, 3);
        assert!(tally.highlighted);
        assert_eq!(round.reveals(), 2);
    }

    #[test]
    fn test_reveal_depth_mismatch_leaves_tally() {
        let mut round = Round::new(4, 400);
        round.record_reveal(overlay(1), hash(7), 3, false);
        round.record_reveal(overlay(2), hash(7), 3, false);
        let diagnostic = round.record_reveal(overlay(3), hash(7), 5, true);
        assert_eq!(
            diagnostic,
            Some(Diagnostic::DepthMismatch {
                round: 4,
                overlay: overlay(3),
                hash: hash(7),
                recorded_depth: 3,
                revealed_depth: 5
            })
        );
        let tally = round.hashes()[&hash(7)];
        assert_eq!(tally.count, 2);
        assert_eq!(tally.depth, 3);
        assert!(!tally.highlighted);
        // The reveal itself is still counted.
        assert_eq!(round.reveals(), 3);
    }

    #[test]
    fn test_claim_overwrite_reported() {
        let mut round = Round::new(2, 200);
        assert_eq!(round.set_claim(claim(1)), None);
        assert_eq!(
            round.set_claim(claim(2)),
            Some(Diagnostic::ClaimOverwritten {
                round: 2,
                previous_winner: overlay(1),
                replacement_winner: overlay(2)
            })
        );
        assert_eq!(round.claim().map(|c| c.winner), Some(overlay(2)));
    }

    #[test]
    fn test_mark_unclaimed_once() {
        let mut round = Round::new(0, 0);
        assert!(round.mark_unclaimed(99));
        assert!(round.is_unclaimed());
        assert_eq!(round.last_block(), 99);
        assert!(!round.mark_unclaimed(150));
        assert_eq!(round.last_block(), 99);

        let mut claimed = Round::new(1, 100);
        claimed.set_claim(claim(1));
        assert!(!claimed.mark_unclaimed(199));
        assert!(!claimed.is_unclaimed());
    }

    #[test]
    fn test_leading_hash() {
        let mut round = Round::new(0, 0);
        assert!(round.leading_hash().is_none());
        round.record_reveal(overlay(1), hash(9), 2, false);
        round.record_reveal(overlay(2), hash(3), 2, false);
        assert_eq!(round.leading_hash().map(|(h, _)| *h), Some(hash(3)));
        round.record_reveal(overlay(3), hash(9), 2, false);
        assert_eq!(round.leading_hash().map(|(h, _)| *h), Some(hash(9)));
    }

    #[test]
    fn test_get_or_create_resets_activity() {
        let mut players = PlayerLedger::new();
        players.get_or_create(overlay(1), None, None).0.commit(5);
        let mut rounds = RoundLedger::new();
        let mut diagnostics = Vec::new();

        rounds.get_or_create(1, 100, &mut players, &mut diagnostics);
        assert!(!players.get(&overlay(1)).unwrap().is_playing());
        assert_eq!(
            diagnostics,
            vec![Diagnostic::RoundStarted {
                round: 1,
                block: 100
            }]
        );

        // Existing rounds are returned untouched.
        players.get_mut(&overlay(1)).unwrap().commit(101);
        rounds.get_or_create(1, 101, &mut players, &mut diagnostics);
        assert!(players.get(&overlay(1)).unwrap().is_playing());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(rounds.len(), 1);
    }

    #[test]
    fn test_record_claim_fans_out_penalties() {
        let mut players = PlayerLedger::new();
        players.get_or_create(overlay(2), None, None).0.update_stake(1, 60);
        players.get_or_create(overlay(3), None, None);
        let mut rounds = RoundLedger::new();
        let mut diagnostics = Vec::new();
        rounds.get_or_create(0, 60, &mut players, &mut diagnostics);
        diagnostics.clear();

        rounds.record_claim(
            0,
            60,
            claim(1),
            &[
                StakeFreeze {
                    overlay: overlay(3),
                    duration_blocks: 152,
                },
                StakeFreeze {
                    overlay: overlay(9),
                    duration_blocks: 152,
                },
            ],
            &[StakeSlash {
                overlay: overlay(2),
                amount: 100,
            }],
            &mut players,
            &mut diagnostics,
        );

        let round = rounds.get(0).unwrap();
        assert_eq!(round.freezes(), 2);
        assert_eq!(round.slashes(), 1);
        assert_eq!(round.claim(), Some(&claim(1)));

        assert_eq!(players.get(&overlay(3)).unwrap().frozen_thaw_block(), Some(212));
        assert_eq!(players.get(&overlay(2)).unwrap().stake(), Some(0));
        assert_eq!(players.get(&overlay(2)).unwrap().stake_slashed(), 60);
        assert!(!players.contains(&overlay(9)));

        assert!(diagnostics.contains(&Diagnostic::UnknownOverlay {
            round: 0,
            overlay: overlay(9),
            penalty: Penalty::Freeze
        }));
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_record_claim_missing_round_is_noop() {
        let mut players = PlayerLedger::new();
        let mut rounds = RoundLedger::new();
        let mut diagnostics = Vec::new();
        rounds.record_claim(7, 700, claim(1), &[], &[], &mut players, &mut diagnostics);
        assert!(rounds.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_encoding_size_matches() {
        let mut round = Round::new(3, 300);
        round.set_anchor(Some(Anchor::new([4; 32])));
        round.record_commit(overlay(1));
        round.record_reveal(overlay(1), hash(2), 4, false);
        round.set_claim(claim(1));
        assert_eq!(round.encode().len(), round.encode_size());
    }
}
