//! Renders engine diagnostics and ledger summaries as log lines.

use monsi_engine::{ranked_hashes, round_status, SchellingGame};
use monsi_types::{Amount, Diagnostic, Penalty, Severity};
use tracing::{debug, info, warn, Level};

/// BZZ has 16 decimals.
const BZZ_DECIMALS: u32 = 16;

/// Format base units as BZZ, trimming trailing zeros of the fraction.
pub fn format_bzz(amount: Amount) -> String {
    let unit = 10u128.pow(BZZ_DECIMALS);
    let whole = amount / unit;
    let fraction = amount % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0width$}", width = BZZ_DECIMALS as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

pub fn kind(diagnostic: &Diagnostic) -> &'static str {
    match diagnostic {
        Diagnostic::RoundStarted { .. } => "round_started",
        Diagnostic::RoundUnclaimed { .. } => "round_unclaimed",
        Diagnostic::AnchorConflict { .. } => "anchor_conflict",
        Diagnostic::DepthMismatch { .. } => "depth_mismatch",
        Diagnostic::ClaimOverwritten { .. } => "claim_overwritten",
        Diagnostic::UnknownOverlay { .. } => "unknown_overlay",
        Diagnostic::Frozen { .. } => "frozen",
        Diagnostic::FreezeLiftedEarly { .. } => "freeze_lifted_early",
        Diagnostic::StakeUpdated { .. } => "stake_updated",
        Diagnostic::Slashed { .. } => "slashed",
        Diagnostic::AccountLearned { .. } => "account_learned",
        Diagnostic::Highlighted { .. } => "highlighted",
    }
}

/// Level a diagnostic is logged at. Accounts learned for overlays nobody tracks are noise.
pub fn level_of(diagnostic: &Diagnostic) -> Level {
    match (diagnostic.severity(), diagnostic) {
        (_, Diagnostic::AccountLearned {
            highlighted: false, ..
        }) => Level::DEBUG,
        (Severity::Warn, _) => Level::WARN,
        (Severity::Info, _) => Level::INFO,
    }
}

pub fn describe(game: &SchellingGame, diagnostic: &Diagnostic) -> String {
    let label = |block: u64| game.round_label(block);
    match diagnostic {
        Diagnostic::RoundStarted { round, block } => {
            format!("round {round} started at {}", label(*block))
        }
        Diagnostic::RoundUnclaimed { round, block } => {
            format!("round {round} ended unclaimed, last activity at {}", label(*block))
        }
        Diagnostic::AnchorConflict {
            round,
            kept,
            rejected,
        } => format!("round {round} anchor {rejected} ignored, keeping {kept}"),
        Diagnostic::DepthMismatch {
            round,
            overlay,
            hash,
            recorded_depth,
            revealed_depth,
        } => format!(
            "{overlay} revealed {hash} at depth {revealed_depth} in round {round}, tally has depth {recorded_depth}"
        ),
        Diagnostic::ClaimOverwritten {
            round,
            previous_winner,
            replacement_winner,
        } => format!(
            "round {round} claimed again: {replacement_winner} replaces {previous_winner}"
        ),
        Diagnostic::UnknownOverlay {
            round,
            overlay,
            penalty,
        } => {
            let penalty = match penalty {
                Penalty::Freeze => "freeze",
                Penalty::Slash => "slash",
            };
            format!("claim in round {round} tried to {penalty} unknown overlay {overlay}")
        }
        Diagnostic::Frozen {
            overlay,
            block,
            thaw_block,
            elapsed_blocks,
        } => format!(
            "{overlay} frozen at {} for {elapsed_blocks} blocks until {}",
            label(*block),
            label(*thaw_block)
        ),
        Diagnostic::FreezeLiftedEarly {
            overlay,
            block,
            thaw_block,
        } => format!(
            "{overlay} committed at {} while frozen until {}",
            label(*block),
            label(*thaw_block)
        ),
        Diagnostic::StakeUpdated {
            overlay,
            block,
            stake,
            change_count,
        } => format!(
            "{overlay} stake {} BZZ at {} (change {change_count})",
            format_bzz(*stake),
            label(*block)
        ),
        Diagnostic::Slashed {
            overlay,
            block,
            requested,
            removed,
            stake,
            total_slashed,
            ..
        } => format!(
            "{overlay} slashed {} of {} BZZ at {}, stake {} BZZ, total slashed {} BZZ",
            format_bzz(*removed),
            format_bzz(*requested),
            label(*block),
            format_bzz(*stake),
            format_bzz(*total_slashed)
        ),
        Diagnostic::AccountLearned {
            overlay, account, ..
        } => format!("{overlay} belongs to {account}"),
        Diagnostic::Highlighted {
            overlay,
            action,
            block,
            ..
        } => format!("{overlay} {action} at {}", label(*block)),
    }
}

pub fn render(game: &SchellingGame, diagnostic: &Diagnostic) {
    let kind = kind(diagnostic);
    let message = describe(game, diagnostic);
    let level = level_of(diagnostic);
    if level == Level::WARN {
        warn!(kind, anomaly = diagnostic.is_anomaly(), "{message}");
    } else if level == Level::INFO {
        info!(kind, "{message}");
    } else {
        debug!(kind, "{message}");
    }
}

/// Log one line per round and per highlighted overlay.
pub fn render_summary(game: &SchellingGame) {
    for round in game.rounds() {
        let leader = ranked_hashes(round).into_iter().next();
        info!(
            round = round.id(),
            status = ?round_status(round),
            commits = round.commits(),
            reveals = round.reveals(),
            freezes = round.freezes(),
            slashes = round.slashes(),
            leading_hash = ?leader.map(|(hash, _)| hash.to_string()),
            leading_count = leader.map(|(_, tally)| tally.count),
            winner = ?round.claim().map(|claim| claim.winner.to_string()),
            "round summary"
        );
    }
    for overlay in game.my_overlays() {
        let Some(player) = game.player(overlay) else {
            continue;
        };
        info!(
            overlay = %overlay,
            account = ?player.account().map(|account| account.to_string()),
            stake = ?player.stake().map(format_bzz),
            won = %format_bzz(player.amount_won()),
            slashed = %format_bzz(player.stake_slashed()),
            plays = player.play_count(),
            wins = player.win_count(),
            freezes = player.freeze_count(),
            "highlighted overlay"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monsi_types::{Account, GameConfig, Overlay};

    fn game() -> SchellingGame {
        SchellingGame::new(GameConfig::new(100, 25, 25).validate().unwrap())
    }

    #[test]
    fn test_format_bzz() {
        assert_eq!(format_bzz(0), "0");
        assert_eq!(format_bzz(10_000_000_000_000_000), "1");
        assert_eq!(format_bzz(15_000_000_000_000_000), "1.5");
        assert_eq!(format_bzz(1), "0.0000000000000001");
        assert_eq!(format_bzz(123_400_000_000_000_000_000), "12340");
    }

    #[test]
    fn test_levels() {
        let learned = |highlighted| Diagnostic::AccountLearned {
            overlay: Overlay::default(),
            account: Account::default(),
            highlighted,
        };
        assert_eq!(level_of(&learned(false)), Level::DEBUG);
        assert_eq!(level_of(&learned(true)), Level::INFO);
        assert_eq!(
            level_of(&Diagnostic::FreezeLiftedEarly {
                overlay: Overlay::default(),
                block: 1,
                thaw_block: 2
            }),
            Level::WARN
        );
    }

    #[test]
    fn test_describe_uses_round_labels() {
        let game = game();
        let message = describe(
            &game,
            &Diagnostic::Frozen {
                overlay: Overlay::new([1; 32]),
                block: 160,
                thaw_block: 312,
                elapsed_blocks: 152,
            },
        );
        assert!(message.contains("1(60)"));
        assert!(message.contains("3(12)"));
        assert!(message.contains("152 blocks"));
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let diagnostic = Diagnostic::RoundUnclaimed { round: 1, block: 2 };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"], kind(&diagnostic));
    }

    #[test]
    fn test_render_without_subscriber() {
        let mut game = game();
        game.highlight_overlay(Overlay::new([1; 32]));
        for diagnostic in game.commit(Overlay::new([1; 32]), Account::new([1; 20]), 5) {
            render(&game, &diagnostic);
        }
        render_summary(&game);
    }
}
