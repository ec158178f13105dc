#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Team Defence simulation headlessly.

mod autoplay;
mod demo;
mod loader;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use team_defence_core::{Event, RoundStartError, SimulationConfig};
use team_defence_simulation::Simulation;
use team_defence_world::query;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::autoplay::Autoplay;

/// Runs a Team Defence session without a window and prints a JSON summary.
#[derive(Parser, Debug)]
#[command(name = "team-defence")]
struct Args {
    /// Map definition in JSON; the built-in demo map is used when omitted
    #[arg(long)]
    map: Option<PathBuf>,

    /// Wave catalog in JSON; the built-in demo catalog is used when omitted
    #[arg(long)]
    waves: Option<PathBuf>,

    /// Simulation settings in TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of frames to simulate
    #[arg(long, default_value_t = 60_000)]
    frames: u64,

    /// Simulated milliseconds per frame
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Let a seeded bot build and upgrade towers
    #[arg(long)]
    autoplay: bool,

    /// Seed for the autoplay bot
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Outcome printed once the session ends.
#[derive(Debug, Default, Serialize)]
struct Summary {
    frames: u64,
    rounds_completed: u32,
    kills: u32,
    leaks: u32,
    money: i64,
    health: i64,
    towers: usize,
    game_over: bool,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemyKilled { .. } => self.kills += 1,
                Event::EnemyLeaked { .. } => self.leaks += 1,
                Event::RoundCompleted { round, bonus } => {
                    self.rounds_completed += 1;
                    info!(round = round.get(), bonus, "round cleared");
                }
                _ => {}
            }
        }
    }
}

/// Entry point for the Team Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("team_defence=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => loader::load_config(path).context("loading simulation settings")?,
        None => SimulationConfig::default(),
    };
    let map = match &args.map {
        Some(path) => loader::load_map(path).context("loading map")?,
        None => demo::map(),
    };
    let catalog = match &args.waves {
        Some(path) => loader::load_catalog(path).context("loading wave catalog")?,
        None => demo::catalog(),
    };

    let (columns, rows) = (map.columns, map.rows);
    let rounds = catalog.len();
    let mut simulation =
        Simulation::new(config, map, catalog).context("building the simulation")?;
    let mut bot = args
        .autoplay
        .then(|| Autoplay::new(args.seed, columns, rows));
    info!(rounds, columns, rows, autoplay = args.autoplay, "session starting");

    let dt = Duration::from_millis(args.frame_ms);
    let mut summary = Summary::default();
    for frame in 0..args.frames {
        if simulation.ledger().active_rounds == 0 {
            match simulation.start_next_round() {
                Ok(round) => info!(round = round.get(), frame, "round started"),
                Err(RoundStartError::CatalogExhausted(_)) => {
                    info!(frame, "every round has been played");
                    break;
                }
                Err(reason) => warn!(%reason, "round could not start"),
            }
        }
        if let Some(bot) = bot.as_mut() {
            bot.act(&mut simulation);
        }

        summary.record(simulation.step(dt));
        summary.frames = frame + 1;
        if simulation.is_game_over() {
            break;
        }
    }

    let ledger = simulation.ledger();
    summary.money = ledger.money;
    summary.health = ledger.health;
    summary.towers = query::tower_view(simulation.world()).into_vec().len();
    summary.game_over = simulation.is_game_over();

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serializing summary")?
    );
    Ok(())
}
