//! A monitoring session: one engine, one checkpoint, one pass over the event log.

use crate::{config::ValidatedConfig, render};
use anyhow::{Context, Result};
use monsi_engine::{filter_from_block, LedgerSnapshot, SchellingGame};
use monsi_types::{ChainEvent, Overlay};
use std::path::Path;
use tracing::info;

/// Counters reported at the end of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub events_applied: usize,
    pub events_skipped: usize,
    pub diagnostics: usize,
    pub anomalies: usize,
}

pub struct Session {
    game: SchellingGame,
    checkpoint: u64,
    stats: SessionStats,
}

impl Session {
    pub fn new(config: &ValidatedConfig, checkpoint: u64) -> Self {
        let mut game = SchellingGame::new(config.game);
        for overlay in &config.highlight {
            game.highlight_overlay(*overlay);
        }
        Self {
            game,
            checkpoint,
            stats: SessionStats::default(),
        }
    }

    /// Highlight additional overlays. Returns how many were not already tracked.
    pub fn highlight(&mut self, overlays: impl IntoIterator<Item = Overlay>) -> usize {
        overlays
            .into_iter()
            .filter(|overlay| self.game.highlight_overlay(*overlay))
            .count()
    }

    /// Apply every event at or after the checkpoint, rendering diagnostics as they occur.
    pub fn process(&mut self, events: &[ChainEvent]) -> SessionStats {
        let kept = filter_from_block(events, self.checkpoint);
        self.stats.events_skipped += events.len() - kept.len();
        for event in kept {
            let diagnostics = self.game.apply(event);
            self.stats.events_applied += 1;
            self.stats.diagnostics += diagnostics.len();
            for diagnostic in &diagnostics {
                if diagnostic.is_anomaly() {
                    self.stats.anomalies += 1;
                }
                render::render(&self.game, diagnostic);
            }
        }
        self.stats
    }

    pub fn game(&self) -> &SchellingGame {
        &self.game
    }

    pub fn checkpoint(&self) -> u64 {
        self.checkpoint
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Block to resume from next time: one past the last applied block.
    pub fn next_checkpoint(&self) -> u64 {
        self.game
            .last_seen_block()
            .map_or(self.checkpoint, |block| block.saturating_add(1))
    }

    /// Write the ledger snapshot as pretty JSON.
    pub fn export(&self, path: &Path) -> Result<()> {
        let snapshot = LedgerSnapshot::capture(&self.game);
        let json =
            serde_json::to_string_pretty(&snapshot).context("Could not serialize snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Could not write snapshot to {}", path.display()))?;
        info!(path = %path.display(), digest = %snapshot.digest, "exported snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::parse_events;
    use monsi_types::GameConfig;

    const OVERLAY: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";
    const OWNER: &str = "0x0202020202020202020202020202020202020202";

    fn config(start_block: u64) -> ValidatedConfig {
        Config {
            game: GameConfig::new(100, 25, 25),
            highlight: vec![OVERLAY.to_string()],
            start_block,
            ..Config::default()
        }
        .validate()
        .unwrap()
    }

    fn log() -> Vec<ChainEvent> {
        let lines = [
            r#"{"type":"block_tick","block_no":1}"#.to_string(),
            format!(r#"{{"type":"committed","overlay":"{OVERLAY}","owner":"{OWNER}","block_no":5}}"#),
            r#"{"type":"block_tick","block_no":101}"#.to_string(),
            format!(r#"{{"type":"stake_updated","overlay":"{OVERLAY}","owner":"{OWNER}","amount":"100000000000000000","block_no":102}}"#),
        ];
        parse_events(&lines.join("\n")).unwrap()
    }

    #[test]
    fn test_highlight_from_config() {
        let session = Session::new(&config(0), 0);
        let overlay = Overlay::from_hex(OVERLAY).unwrap();
        assert!(session.game().is_my_overlay(&overlay));
        assert_eq!(session.game().player_count(), 1);
    }

    #[test]
    fn test_process_from_checkpoint() {
        let mut session = Session::new(&config(0), 100);
        let stats = session.process(&log());
        assert_eq!(stats.events_applied, 2);
        assert_eq!(stats.events_skipped, 2);
        assert_eq!(stats.anomalies, 0);
        assert_eq!(session.game().round_count(), 1);
        assert_eq!(session.next_checkpoint(), 103);
    }

    #[test]
    fn test_process_full_log() {
        let mut session = Session::new(&config(0), 0);
        let stats = session.process(&log());
        assert_eq!(stats.events_applied, 4);
        assert!(session.game().round(0).unwrap().is_unclaimed());
        let overlay = Overlay::from_hex(OVERLAY).unwrap();
        let owner = monsi_types::Account::from_hex(OWNER).unwrap();
        assert!(session.game().is_my_account(&owner));
        assert_eq!(
            session.game().player(&overlay).unwrap().stake(),
            Some(100_000_000_000_000_000)
        );
    }

    #[test]
    fn test_extra_highlights_counted() {
        let mut session = Session::new(&config(0), 0);
        let known = Overlay::from_hex(OVERLAY).unwrap();
        let added = session.highlight([known, Overlay::new([9; 32]), Overlay::new([9; 32])]);
        assert_eq!(added, 1);
    }

    #[test]
    fn test_export_writes_snapshot() {
        let mut session = Session::new(&config(0), 0);
        session.process(&log());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        session.export(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["current_round"], 1);
        assert_eq!(written["rounds"][0]["status"], "unclaimed");
        assert_eq!(written["players"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_next_checkpoint_without_events() {
        let session = Session::new(&config(0), 500);
        assert_eq!(session.next_checkpoint(), 500);
        assert_eq!(session.checkpoint(), 500);
    }
}
