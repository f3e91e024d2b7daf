//! Player ledger: per-overlay stake, winnings and activity.
//!
//! Players are created on the first action that references their overlay and are never
//! removed. Every mutation records the block and action for audit display and, where the
//! change is worth surfacing, returns a [Diagnostic].

use bytes::BufMut;
use commonware_codec::{EncodeSize, Write};
use monsi_types::{Account, Action, Amount, Diagnostic, Overlay, RevealHash};
use serde::Serialize;
use std::collections::BTreeMap;

/// Hash and depth a player disclosed in a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RevealRecord {
    pub hash: RevealHash,
    pub depth: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Player {
    overlay: Overlay,
    account: Option<Account>,
    /// Cumulative winnings.
    #[serde(with = "monsi_types::amount")]
    amount: Amount,
    /// Absent until the first stake event.
    #[serde(with = "monsi_types::amount::option")]
    stake: Option<Amount>,
    #[serde(with = "monsi_types::amount")]
    stake_slashed: Amount,
    stake_change_count: u32,
    is_playing: bool,
    last_block: Option<u64>,
    last_action: Option<Action>,
    reveals: BTreeMap<u64, RevealRecord>,
    frozen_thaw_block: Option<u64>,
    play_count: u32,
    win_count: u32,
    freeze_count: u32,
    slash_count: u32,
}

impl Player {
    pub fn new(overlay: Overlay, account: Option<Account>, block: Option<u64>) -> Self {
        Self {
            overlay,
            account,
            amount: 0,
            stake: None,
            stake_slashed: 0,
            stake_change_count: 0,
            is_playing: false,
            last_block: block,
            last_action: None,
            reveals: BTreeMap::new(),
            frozen_thaw_block: None,
            play_count: 0,
            win_count: 0,
            freeze_count: 0,
            slash_count: 0,
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    /// Cumulative amount won through claims.
    pub fn amount_won(&self) -> Amount {
        self.amount
    }

    pub fn stake(&self) -> Option<Amount> {
        self.stake
    }

    pub fn stake_slashed(&self) -> Amount {
        self.stake_slashed
    }

    pub fn stake_change_count(&self) -> u32 {
        self.stake_change_count
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    pub fn reveals(&self) -> &BTreeMap<u64, RevealRecord> {
        &self.reveals
    }

    pub fn reveal_in(&self, round: u64) -> Option<&RevealRecord> {
        self.reveals.get(&round)
    }

    pub fn frozen_thaw_block(&self) -> Option<u64> {
        self.frozen_thaw_block
    }

    /// Whether the player is frozen at `block`.
    pub fn is_frozen_at(&self, block: u64) -> bool {
        self.frozen_thaw_block.is_some_and(|thaw| block < thaw)
    }

    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn win_count(&self) -> u32 {
        self.win_count
    }

    pub fn freeze_count(&self) -> u32 {
        self.freeze_count
    }

    pub fn slash_count(&self) -> u32 {
        self.slash_count
    }

    /// Link an account if none is known yet. Returns true when the account was learned.
    pub fn learn_account(&mut self, account: Account) -> bool {
        if self.account.is_some() {
            return false;
        }
        self.account = Some(account);
        true
    }

    pub fn not_playing(&mut self) {
        self.is_playing = false;
    }

    fn touch(&mut self, block: u64, action: Action) {
        self.last_block = Some(block);
        self.last_action = Some(action);
    }

    /// Record a commit. Any freeze marker is cleared; clearing it before the thaw block
    /// is reported.
    pub fn commit(&mut self, block: u64) -> Option<Diagnostic> {
        self.touch(block, Action::Commit);
        self.is_playing = true;
        self.play_count = self.play_count.saturating_add(1);

        let thaw_block = self.frozen_thaw_block.take()?;
        (block < thaw_block).then_some(Diagnostic::FreezeLiftedEarly {
            overlay: self.overlay,
            block,
            thaw_block,
        })
    }

    pub fn reveal(&mut self, block: u64, round: u64, hash: RevealHash, depth: u8) {
        self.touch(block, Action::Reveal);
        self.is_playing = true;
        self.reveals.insert(round, RevealRecord { hash, depth });
    }

    pub fn claim(&mut self, block: u64, amount: Amount) {
        self.touch(block, Action::Claim);
        self.is_playing = true;
        self.amount = self.amount.saturating_add(amount);
        self.win_count = self.win_count.saturating_add(1);
    }

    pub fn freeze(&mut self, block: u64, thaw_block: u64) -> Diagnostic {
        self.touch(block, Action::Freeze);
        self.frozen_thaw_block = Some(thaw_block);
        self.freeze_count = self.freeze_count.saturating_add(1);
        Diagnostic::Frozen {
            overlay: self.overlay,
            block,
            thaw_block,
            elapsed_blocks: thaw_block.saturating_sub(block),
        }
    }

    /// Replace the stake snapshot. Winnings are untouched.
    pub fn update_stake(&mut self, block: u64, amount: Amount) -> Diagnostic {
        self.touch(block, Action::Stake);
        self.stake = Some(amount);
        self.stake_change_count = self.stake_change_count.saturating_add(1);
        Diagnostic::StakeUpdated {
            overlay: self.overlay,
            block,
            stake: amount,
            change_count: self.stake_change_count,
        }
    }

    /// Remove up to `amount` from the stake. The stake saturates at zero and only the
    /// amount actually removed counts towards the slashed total.
    pub fn slash(&mut self, block: u64, amount: Amount) -> Diagnostic {
        self.touch(block, Action::Slash);
        let stake = self.stake.unwrap_or(0);
        let removed = stake.min(amount);
        self.stake = Some(stake - removed);
        self.stake_slashed = self.stake_slashed.saturating_add(removed);
        self.slash_count = self.slash_count.saturating_add(1);
        self.stake_change_count = self.stake_change_count.saturating_add(1);
        Diagnostic::Slashed {
            overlay: self.overlay,
            block,
            requested: amount,
            removed,
            stake: stake - removed,
            total_slashed: self.stake_slashed,
            change_count: self.stake_change_count,
        }
    }
}

impl Write for RevealRecord {
    fn write(&self, writer: &mut impl BufMut) {
        self.hash.write(writer);
        self.depth.write(writer);
    }
}

impl EncodeSize for RevealRecord {
    fn encode_size(&self) -> usize {
        self.hash.encode_size() + self.depth.encode_size()
    }
}

impl Write for Player {
    fn write(&self, writer: &mut impl BufMut) {
        self.overlay.write(writer);
        self.account.write(writer);
        self.amount.write(writer);
        self.stake.write(writer);
        self.stake_slashed.write(writer);
        self.stake_change_count.write(writer);
        self.is_playing.write(writer);
        self.last_block.write(writer);
        self.last_action.map(|action| action.tag()).write(writer);
        (self.reveals.len() as u32).write(writer);
        for (round, record) in &self.reveals {
            round.write(writer);
            record.write(writer);
        }
        self.frozen_thaw_block.write(writer);
        self.play_count.write(writer);
        self.win_count.write(writer);
        self.freeze_count.write(writer);
        self.slash_count.write(writer);
    }
}

impl EncodeSize for Player {
    fn encode_size(&self) -> usize {
        self.overlay.encode_size()
            + self.account.encode_size()
            + self.amount.encode_size()
            + self.stake.encode_size()
            + self.stake_slashed.encode_size()
            + self.stake_change_count.encode_size()
            + self.is_playing.encode_size()
            + self.last_block.encode_size()
            + self.last_action.map(|action| action.tag()).encode_size()
            + (self.reveals.len() as u32).encode_size()
            + self
                .reveals
                .iter()
                .map(|(round, record)| round.encode_size() + record.encode_size())
                .sum::<usize>()
            + self.frozen_thaw_block.encode_size()
            + self.play_count.encode_size()
            + self.win_count.encode_size()
            + self.freeze_count.encode_size()
            + self.slash_count.encode_size()
    }
}

/// Keyed store of players, ordered by overlay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerLedger {
    players: BTreeMap<Overlay, Player>,
}

impl PlayerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the player for `overlay`, creating it if needed.
    ///
    /// A supplied account is learned if the player has none. The returned flag is true
    /// when an account became known during this call.
    pub fn get_or_create(
        &mut self,
        overlay: Overlay,
        account: Option<Account>,
        block: Option<u64>,
    ) -> (&mut Player, bool) {
        let mut learned = false;
        let player = self.players.entry(overlay).or_insert_with(|| {
            learned = account.is_some();
            Player::new(overlay, account, block)
        });
        if let Some(account) = account {
            learned |= player.learn_account(account);
        }
        (player, learned)
    }

    pub fn get(&self, overlay: &Overlay) -> Option<&Player> {
        self.players.get(overlay)
    }

    pub fn get_mut(&mut self, overlay: &Overlay) -> Option<&mut Player> {
        self.players.get_mut(overlay)
    }

    pub fn contains(&self, overlay: &Overlay) -> bool {
        self.players.contains_key(overlay)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in overlay order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.players.keys()
    }

    /// Clear the active flag of every player.
    pub fn reset_activity(&mut self) {
        for player in self.players.values_mut() {
            player.not_playing();
        }
    }
}
