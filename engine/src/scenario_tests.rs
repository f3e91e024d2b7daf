//! End-to-end game scenarios applied through the engine.
//!
//! Uses a 100 block round with 25 block commit and reveal phases so boundaries are easy
//! to read.

#[cfg(test)]
mod tests {
    use crate::game::SchellingGame;
    use crate::query::{round_status, RoundStatus};
    use monsi_types::{
        Account, BlockDetails, Diagnostic, GameConfig, Overlay, Phase, RevealHash, StakeFreeze,
        StakeSlash,
    };

    const OVERLAY_A: Overlay = Overlay::new([0xaa; 32]);
    const OVERLAY_B: Overlay = Overlay::new([0xbb; 32]);
    const OWNER: Account = Account::new([0x0f; 20]);

    fn game() -> SchellingGame {
        SchellingGame::new(GameConfig::new(100, 25, 25).validate().unwrap())
    }

    fn hash(n: u8) -> RevealHash {
        RevealHash::new([n; 32])
    }

    #[test]
    fn test_phases_of_first_round() {
        let game = game();
        let phases = game.phases();
        assert_eq!(phases.phase_of(5), Phase::Commit);
        assert_eq!(phases.phase_of(30), Phase::Reveal);
        assert_eq!(phases.phase_of(60), Phase::Claim);
        assert!([5, 30, 60].iter().all(|b| phases.round_of(*b) == 0));
    }

    #[test]
    fn test_commit_creates_active_player() {
        let mut game = game();
        game.commit(OVERLAY_A, OWNER, 5);
        let player = game.player(&OVERLAY_A).unwrap();
        assert_eq!(player.play_count(), 1);
        assert!(player.is_playing());
        assert_eq!(player.account(), Some(&OWNER));
        assert_eq!(game.round(0).unwrap().players(), &[OVERLAY_A]);
    }

    #[test]
    fn test_reveal_tallies_hash() {
        let mut game = game();
        game.commit(OVERLAY_A, OWNER, 5);
        game.reveal(OVERLAY_A, OWNER, hash(1), 3, 30);
        let tally = game.round(0).unwrap().hashes()[&hash(1)];
        assert_eq!(tally.count, 1);
        assert_eq!(tally.depth, 3);
        assert!(!tally.highlighted);
    }

    #[test]
    fn test_slash_beyond_stake() {
        let mut game = game();
        game.stake_updated(OVERLAY_A, OWNER, 60, 2);
        game.stake_slashed(OVERLAY_A, 100, 70);
        let player = game.player(&OVERLAY_A).unwrap();
        assert_eq!(player.stake(), Some(0));
        assert_eq!(player.stake_slashed(), 60);
    }

    #[test]
    fn test_unclaimed_round_on_new_block() {
        let mut game = game();
        game.commit(OVERLAY_A, OWNER, 5);
        let diagnostics = game.new_block(BlockDetails::new(101, 0), None);
        assert!(game.round(0).unwrap().is_unclaimed());
        assert_eq!(game.current_round(), Some(1));
        assert!(diagnostics.contains(&Diagnostic::RoundUnclaimed { round: 0, block: 5 }));
    }

    #[test]
    fn test_full_round_counts_once() {
        let mut game = game();
        game.commit(OVERLAY_A, OWNER, 5);
        game.reveal(OVERLAY_A, OWNER, hash(1), 3, 30);
        game.claim(OVERLAY_A, OWNER, hash(1), 3, 500, &[], &[], 60);

        let player = game.player(&OVERLAY_A).unwrap();
        assert_eq!(player.play_count(), 1);
        assert_eq!(player.reveals().len(), 1);
        assert_eq!(player.win_count(), 1);
        assert_eq!(player.amount_won(), 500);
        assert_eq!(round_status(game.round(0).unwrap()), RoundStatus::Claimed);
    }

    #[test]
    fn test_depth_mismatch_keeps_tally() {
        let mut game = game();
        let c = Overlay::new([0xcc; 32]);
        game.reveal(OVERLAY_A, OWNER, hash(1), 3, 30);
        game.reveal(OVERLAY_B, OWNER, hash(1), 3, 31);
        let diagnostics = game.reveal(c, OWNER, hash(1), 4, 32);

        let tally = game.round(0).unwrap().hashes()[&hash(1)];
        assert_eq!(tally.count, 2);
        assert_eq!(tally.depth, 3);
        assert!(diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::DepthMismatch {
                recorded_depth: 3,
                revealed_depth: 4,
                ..
            }
        )));
        // The player still records its own reveal.
        assert_eq!(game.player(&c).unwrap().reveal_in(0).map(|r| r.depth), Some(4));
    }

    #[test]
    fn test_unclaimed_marked_exactly_once() {
        let mut game = game();
        let mut unclaimed = 0;
        for block in [5, 50, 101, 150, 160, 199] {
            unclaimed += game
                .new_block(BlockDetails::new(block, 0), None)
                .iter()
                .filter(|d| matches!(d, Diagnostic::RoundUnclaimed { round: 0, .. }))
                .count();
        }
        assert_eq!(unclaimed, 1);
        assert!(game.round(0).unwrap().is_unclaimed());
        assert_eq!(game.round(0).unwrap().last_block(), 50);
        assert!(!game.round(1).unwrap().is_unclaimed());
    }

    #[test]
    fn test_claimed_round_not_marked_unclaimed() {
        let mut game = game();
        game.claim(OVERLAY_A, OWNER, hash(1), 3, 10, &[], &[], 60);
        let diagnostics = game.new_block(BlockDetails::new(100, 0), None);
        assert!(!game.round(0).unwrap().is_unclaimed());
        assert!(!diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::RoundUnclaimed { .. })));
    }

    #[test]
    fn test_highlight_idempotent() {
        let mut game = game();
        assert!(game.highlight_overlay(OVERLAY_A));
        assert!(!game.highlight_overlay(OVERLAY_A));
        assert_eq!(game.my_overlays().count(), 1);
        assert_eq!(game.player_count(), 1);
        assert!(game.is_my_overlay(&OVERLAY_A));
    }

    #[test]
    fn test_highlighted_reveal_marks_tally() {
        let mut game = game();
        game.highlight_overlay(OVERLAY_B);
        game.reveal(OVERLAY_A, OWNER, hash(1), 3, 30);
        game.reveal(OVERLAY_B, OWNER, hash(1), 3, 31);
        assert!(game.round(0).unwrap().hashes()[&hash(1)].highlighted);
    }

    #[test]
    fn test_second_claim_overwrites() {
        let mut game = game();
        game.claim(OVERLAY_A, OWNER, hash(1), 3, 10, &[], &[], 60);
        let diagnostics = game.claim(OVERLAY_B, OWNER, hash(2), 3, 20, &[], &[], 70);
        assert!(diagnostics.contains(&Diagnostic::ClaimOverwritten {
            round: 0,
            previous_winner: OVERLAY_A,
            replacement_winner: OVERLAY_B
        }));
        assert_eq!(
            game.round(0).unwrap().claim().map(|c| c.winner),
            Some(OVERLAY_B)
        );
        // Both payouts happened on chain.
        assert_eq!(game.player(&OVERLAY_A).unwrap().amount_won(), 10);
        assert_eq!(game.player(&OVERLAY_B).unwrap().amount_won(), 20);
    }

    #[test]
    fn test_freeze_then_early_commit() {
        let mut game = game();
        game.commit(OVERLAY_B, OWNER, 5);
        game.claim(
            OVERLAY_A,
            OWNER,
            hash(1),
            3,
            10,
            &[StakeFreeze {
                overlay: OVERLAY_B,
                duration_blocks: 200,
            }],
            &[],
            60,
        );
        assert_eq!(game.player(&OVERLAY_B).unwrap().frozen_thaw_block(), Some(260));

        let diagnostics = game.commit(OVERLAY_B, OWNER, 105);
        assert!(diagnostics.contains(&Diagnostic::FreezeLiftedEarly {
            overlay: OVERLAY_B,
            block: 105,
            thaw_block: 260
        }));
        assert_eq!(game.player(&OVERLAY_B).unwrap().frozen_thaw_block(), None);
    }

    #[test]
    fn test_unknown_penalty_targets_skipped() {
        let mut game = game();
        let stranger = Overlay::new([0x11; 32]);
        let diagnostics = game.claim(
            OVERLAY_A,
            OWNER,
            hash(1),
            3,
            10,
            &[],
            &[StakeSlash {
                overlay: stranger,
                amount: 5,
            }],
            60,
        );
        assert!(game.player(&stranger).is_none());
        assert_eq!(game.player_count(), 1);
        assert!(diagnostics.iter().any(|d| d.is_anomaly()));
    }
}
