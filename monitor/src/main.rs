use anyhow::{Context, Result};
use clap::Parser;
use monsi_monitor::{events, render, Config, LogFormat, Session, ValidatedConfig};
use monsi_types::Overlay;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Monitor storage incentives for Swarm")]
struct Args {
    /// YAML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-lines file of decoded chain events, in block order.
    #[arg(long)]
    events: PathBuf,

    /// Resume from this block instead of the configured start block.
    #[arg(long)]
    from_block: Option<u64>,

    /// Write a JSON ledger snapshot here when done.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Validate config and event log and exit without replaying.
    #[arg(long)]
    dry_run: bool,

    /// Overlay addresses to highlight.
    #[arg(value_parser = Overlay::from_hex)]
    overlays: Vec<Overlay>,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let config = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config file {}", path.display()))?;
    serde_yaml::from_str(&config).context("Could not parse config file")
}

fn init_tracing(level: Level, format: LogFormat) {
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_max_level(level).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_max_level(level)
            .init(),
    }
}

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    let args = Args::parse();

    let config: ValidatedConfig = load_config(args.config.as_deref())?
        .validate()
        .context("Invalid config")?;
    let events = events::load_events(&args.events)?;
    let checkpoint = args.from_block.unwrap_or(config.start_block);

    if args.dry_run {
        println!("{config:#?}");
        println!(
            "{} events, {} at or after block {checkpoint}",
            events.len(),
            events.iter().filter(|e| e.block_no() >= checkpoint).count()
        );
        println!("config ok");
        return Ok(());
    }

    init_tracing(config.log_level, config.log_format);

    let phases = monsi_engine::PhaseCalculator::new(config.game);
    info!(
        checkpoint,
        round = phases.round_of(checkpoint),
        label = %phases.round_label(checkpoint),
        events = events.len(),
        "starting replay"
    );

    let mut session = Session::new(&config, checkpoint);
    session.highlight(args.overlays);
    let stats = session.process(&events);
    render::render_summary(session.game());

    info!(
        applied = stats.events_applied,
        skipped = stats.events_skipped,
        diagnostics = stats.diagnostics,
        anomalies = stats.anomalies,
        players = session.game().player_count(),
        rounds = session.game().round_count(),
        next_checkpoint = session.next_checkpoint(),
        "replay finished"
    );

    if let Some(path) = args.export.or(config.export_path) {
        session.export(&path)?;
    }
    Ok(())
}
