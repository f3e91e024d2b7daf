//! Game engine: applies ordered chain events to the player and round ledgers.
//!
//! [SchellingGame] owns both ledgers, the round cursor and the set of locally tracked
//! identities. Events must be applied in non-decreasing block order; the engine does not
//! defend against reordering beyond a debug assertion.
//!
//! Every operation returns the diagnostics it produced. The engine never formats them.

use crate::phase::{PhaseCalculator, PhaseProgress};
use crate::players::{Player, PlayerLedger};
use crate::rounds::{Claim, Round, RoundLedger};
use commonware_codec::Encode;
use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Hasher,
};
use monsi_types::{
    Account, Action, Amount, Anchor, BlockDetails, Diagnostic, Overlay, RevealHash, StakeFreeze,
    StakeSlash, ValidatedGameConfig,
};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct SchellingGame {
    phases: PhaseCalculator,
    players: PlayerLedger,
    rounds: RoundLedger,
    current_round: Option<u64>,
    /// Last block announced through [SchellingGame::new_block].
    last_block: Option<BlockDetails>,
    /// Highest block number of any applied event.
    last_seen_block: Option<u64>,
    my_overlays: BTreeSet<Overlay>,
    my_accounts: BTreeSet<Account>,
}

impl SchellingGame {
    pub fn new(config: ValidatedGameConfig) -> Self {
        Self {
            phases: PhaseCalculator::new(config),
            ..Self::default()
        }
    }

    fn observe(&mut self, block: u64) {
        debug_assert!(
            self.last_seen_block.map_or(true, |last| block >= last),
            "block {block} delivered after {:?}",
            self.last_seen_block
        );
        self.last_seen_block = Some(block);
    }

    /// Move the cursor to the round containing `block`, closing the previous round if the
    /// id changed. Returns the round id.
    fn advance(&mut self, block: u64, diagnostics: &mut Vec<Diagnostic>) -> u64 {
        let id = self.phases.round_of(block);
        if let Some(current) = self.current_round.filter(|current| *current != id) {
            let closed_at = self.last_seen_block.unwrap_or(block);
            self.close_round(current, closed_at, diagnostics);
        }
        self.observe(block);
        if self.current_round != Some(id) {
            debug!(
                round = id,
                block,
                label = %self.phases.round_label(block),
                "round cursor advanced"
            );
            self.current_round = Some(id);
        }
        self.rounds
            .get_or_create(id, block, &mut self.players, diagnostics);
        id
    }

    fn close_round(&mut self, id: u64, block: u64, diagnostics: &mut Vec<Diagnostic>) {
        let Some(round) = self.rounds.get_mut(id) else {
            return;
        };
        for overlay in round.players() {
            if let Some(player) = self.players.get_mut(overlay) {
                player.not_playing();
            }
        }
        if round.mark_unclaimed(block) {
            debug!(round = id, block, "round closed without claim");
            diagnostics.push(Diagnostic::RoundUnclaimed { round: id, block });
        }
    }

    /// Round `id` after [SchellingGame::advance] created it.
    fn round_entry(&mut self, id: u64, block: u64, diagnostics: &mut Vec<Diagnostic>) -> &mut Round {
        let round = self
            .rounds
            .get_or_create(id, block, &mut self.players, diagnostics);
        round.touch(block);
        round
    }

    fn player_entry(
        &mut self,
        overlay: Overlay,
        account: Option<Account>,
        block: u64,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> &mut Player {
        let highlighted = self.my_overlays.contains(&overlay);
        let (player, learned) = self.players.get_or_create(overlay, account, Some(block));
        if learned {
            if let Some(account) = player.account().copied() {
                if highlighted {
                    self.my_accounts.insert(account);
                }
                diagnostics.push(Diagnostic::AccountLearned {
                    overlay,
                    account,
                    highlighted,
                });
            }
        }
        player
    }

    fn highlight(
        &self,
        overlay: Overlay,
        action: Action,
        round: u64,
        block: u64,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if self.my_overlays.contains(&overlay) {
            diagnostics.push(Diagnostic::Highlighted {
                overlay,
                action,
                round,
                block,
            });
        }
    }

    /// Announce a new block. Anchors are only recorded during the commit and reveal phases.
    pub fn new_block(&mut self, details: BlockDetails, anchor: Option<Anchor>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let block = details.block_no;
        let id = self.advance(block, &mut diagnostics);
        self.last_block = Some(details);

        let accepts_anchor = self.phases.phase_of(block).accepts_anchor();
        let round = self.round_entry(id, block, &mut diagnostics);
        if accepts_anchor {
            diagnostics.extend(round.set_anchor(anchor));
        }
        diagnostics
    }

    pub fn commit(&mut self, overlay: Overlay, owner: Account, block: u64) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let id = self.advance(block, &mut diagnostics);

        let player = self.player_entry(overlay, Some(owner), block, &mut diagnostics);
        let lifted = player.commit(block);
        diagnostics.extend(lifted);

        self.round_entry(id, block, &mut diagnostics)
            .record_commit(overlay);
        self.highlight(overlay, Action::Commit, id, block, &mut diagnostics);
        diagnostics
    }

    pub fn reveal(
        &mut self,
        overlay: Overlay,
        owner: Account,
        hash: RevealHash,
        depth: u8,
        block: u64,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let id = self.advance(block, &mut diagnostics);

        self.player_entry(overlay, Some(owner), block, &mut diagnostics)
            .reveal(block, id, hash, depth);

        let highlighted = self.my_overlays.contains(&overlay);
        let mismatch = self
            .round_entry(id, block, &mut diagnostics)
            .record_reveal(overlay, hash, depth, highlighted);
        diagnostics.extend(mismatch);
        self.highlight(overlay, Action::Reveal, id, block, &mut diagnostics);
        diagnostics
    }

    /// Apply a claim: credit the winner, store the result on the round and fan out the
    /// freeze and slash instructions.
    #[allow(clippy::too_many_arguments)]
    pub fn claim(
        &mut self,
        winner: Overlay,
        owner: Account,
        truth: RevealHash,
        depth: u8,
        amount: Amount,
        freezes: &[StakeFreeze],
        slashes: &[StakeSlash],
        block: u64,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let id = self.advance(block, &mut diagnostics);

        self.player_entry(winner, Some(owner), block, &mut diagnostics)
            .claim(block, amount);

        let claim = Claim {
            winner,
            truth,
            depth,
            amount,
        };
        self.rounds.record_claim(
            id,
            block,
            claim,
            freezes,
            slashes,
            &mut self.players,
            &mut diagnostics,
        );
        self.round_entry(id, block, &mut diagnostics);

        self.highlight(winner, Action::Claim, id, block, &mut diagnostics);
        for freeze in freezes {
            self.highlight(freeze.overlay, Action::Freeze, id, block, &mut diagnostics);
        }
        for slash in slashes {
            self.highlight(slash.overlay, Action::Slash, id, block, &mut diagnostics);
        }
        diagnostics
    }

    /// Replace the stake snapshot of `overlay`.
    pub fn stake_updated(
        &mut self,
        overlay: Overlay,
        owner: Account,
        amount: Amount,
        block: u64,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let id = self.advance(block, &mut diagnostics);

        let updated = self
            .player_entry(overlay, Some(owner), block, &mut diagnostics)
            .update_stake(block, amount);
        diagnostics.push(updated);

        self.round_entry(id, block, &mut diagnostics);
        self.highlight(overlay, Action::Stake, id, block, &mut diagnostics);
        diagnostics
    }

    pub fn stake_slashed(&mut self, overlay: Overlay, amount: Amount, block: u64) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let id = self.advance(block, &mut diagnostics);

        let slashed = self
            .player_entry(overlay, None, block, &mut diagnostics)
            .slash(block, amount);
        diagnostics.push(slashed);

        self.round_entry(id, block, &mut diagnostics);
        self.highlight(overlay, Action::Slash, id, block, &mut diagnostics);
        diagnostics
    }

    /// Track `overlay` locally. Its player entry is created immediately so it is visible
    /// before any on-chain activity. Returns false if it was already tracked.
    pub fn highlight_overlay(&mut self, overlay: Overlay) -> bool {
        let inserted = self.my_overlays.insert(overlay);
        let (player, _) = self.players.get_or_create(overlay, None, None);
        if let Some(account) = player.account() {
            self.my_accounts.insert(*account);
        }
        inserted
    }

    pub fn is_my_overlay(&self, overlay: &Overlay) -> bool {
        self.my_overlays.contains(overlay)
    }

    pub fn is_my_account(&self, account: &Account) -> bool {
        self.my_accounts.contains(account)
    }

    pub fn my_overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.my_overlays.iter()
    }

    pub fn my_accounts(&self) -> impl Iterator<Item = &Account> {
        self.my_accounts.iter()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn player(&self, overlay: &Overlay) -> Option<&Player> {
        self.players.get(overlay)
    }

    pub fn round(&self, id: u64) -> Option<&Round> {
        self.rounds.get(id)
    }

    /// Players in overlay order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.players.overlays()
    }

    /// Rounds in id order.
    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.iter()
    }

    pub fn current_round(&self) -> Option<u64> {
        self.current_round
    }

    pub fn last_block(&self) -> Option<&BlockDetails> {
        self.last_block.as_ref()
    }

    pub fn last_seen_block(&self) -> Option<u64> {
        self.last_seen_block
    }

    pub fn phases(&self) -> &PhaseCalculator {
        &self.phases
    }

    pub fn round_label(&self, block: u64) -> String {
        self.phases.round_label(block)
    }

    pub fn phase_progress(&self, block: u64) -> PhaseProgress {
        self.phases.progress(block)
    }

    /// SHA-256 over the canonical encoding of every player, every round and the cursor.
    ///
    /// Two engines that applied the same event log have the same digest.
    pub fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        for player in self.players.iter() {
            hasher.update(player.encode().as_ref());
        }
        for round in self.rounds.iter() {
            hasher.update(round.encode().as_ref());
        }
        hasher.update(self.current_round.encode().as_ref());
        hasher.finalize()
    }
}
