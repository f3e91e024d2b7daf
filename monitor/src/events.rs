//! JSON-lines event log loading.
//!
//! One decoded [ChainEvent] per line. Blank lines and lines starting with `#` are skipped.

use anyhow::{bail, Context, Result};
use monsi_types::ChainEvent;
use std::path::Path;

pub fn parse_events(input: &str) -> Result<Vec<ChainEvent>> {
    let mut events = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: ChainEvent = serde_json::from_str(line)
            .with_context(|| format!("Could not parse event on line {}", index + 1))?;
        events.push(event);
    }
    ensure_ordered(&events)?;
    Ok(events)
}

pub fn load_events(path: &Path) -> Result<Vec<ChainEvent>> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read event log {}", path.display()))?;
    parse_events(&input).with_context(|| format!("Invalid event log {}", path.display()))
}

/// The engine requires non-decreasing block numbers.
fn ensure_ordered(events: &[ChainEvent]) -> Result<()> {
    for (index, pair) in events.windows(2).enumerate() {
        let (previous, next) = (pair[0].block_no(), pair[1].block_no());
        if next < previous {
            bail!(
                "event {} at block {next} is out of order (previous block {previous})",
                index + 2
            );
        }
    }
    Ok(())
}
