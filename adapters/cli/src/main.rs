#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays scripted input against the rules engine.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use circles_cli::{Replay, ReplayEvent, ScriptedNetwork, Script, SummaryBackend};
use circles_core::wire::GameSnapshot;
use circles_world::query;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::Directive, EnvFilter};

/// Replays a TOML input script and prints requests and render directives as
/// JSON lines.
#[derive(Debug, Parser)]
#[command(name = "circles-replay", version)]
struct Args {
    /// Initial game state as JSON.
    #[arg(long, value_name = "PATH")]
    snapshot: PathBuf,
    /// Replay script as TOML.
    #[arg(long, value_name = "PATH")]
    script: PathBuf,
    /// Default tracing directive; `RUST_LOG` is honoured as well.
    #[arg(long, value_name = "DIRECTIVE", default_value = "info")]
    log_filter: String,
    /// Print the final board after the replay.
    #[arg(long)]
    summary: bool,
}

/// Entry point for the replay command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_filter)?;

    let snapshot = read_snapshot(&args.snapshot)?;
    let script = Script::load(&args.script)?;
    let network = ScriptedNetwork::new(script.responses().map(Path::to_path_buf));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut events = Vec::new();
    let mut replay = Replay::start(&snapshot, network, &mut events)?;
    emit(&mut out, &mut events)?;

    for (index, step) in script.steps().iter().enumerate() {
        replay
            .step(step, &mut events)
            .with_context(|| format!("replay step #{} failed", index + 1))?;
        emit(&mut out, &mut events)?;
    }

    if args.summary {
        let hexes = query::grid(replay.state()).coords().collect();
        let mut backend = SummaryBackend::new(&mut out, hexes);
        replay.present(&mut backend)?;
    }

    info!(
        steps = script.steps().len(),
        requests = replay.network().submitted().len(),
        "replay finished"
    );
    Ok(())
}

fn init_tracing(filter: &str) -> Result<()> {
    let directive: Directive = filter
        .parse()
        .with_context(|| format!("invalid log filter `{filter}`"))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<GameSnapshot> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot at {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse snapshot at {}", path.display()))
}

fn emit(out: &mut impl Write, events: &mut Vec<ReplayEvent>) -> Result<()> {
    for event in events.drain(..) {
        serde_json::to_writer(&mut *out, &event)?;
        writeln!(out)?;
    }
    Ok(())
}
