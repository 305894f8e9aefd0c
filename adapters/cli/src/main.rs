#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Lane Defence matches.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lane_defence_core::{BuildingKind, Command, Event, PlayerIndex, SessionId, UnitKind};
use lane_defence_server::{Driver, ServerConfig};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const SIMULATION_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "lane-defence", about = "Headless Lane Defence simulation")]
struct Cli {
    /// Optional TOML file overriding the server defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Plays a scripted match and prints the final snapshot as JSON.
    Simulate(SimulateArgs),
    /// Lists every building and unit kind.
    Catalog,
}

#[derive(Debug, clap::Args)]
struct SimulateArgs {
    /// Match seconds to simulate after the countdown.
    #[arg(long, default_value_t = 120)]
    seconds: u64,

    /// Gold granted to both players, overriding the config.
    #[arg(long)]
    starting_gold: Option<u32>,

    /// Building placed when the match starts, as `PLAYER:KIND:CELL` (e.g. `0:barracks:7`).
    #[arg(long = "build", value_parser = parse_build_order)]
    builds: Vec<BuildOrder>,

    /// Prints the snapshot on a single line.
    #[arg(long)]
    compact: bool,
}

#[derive(Clone, Copy, Debug)]
struct BuildOrder {
    player: PlayerIndex,
    kind: BuildingKind,
    cell: u16,
}

fn parse_build_order(value: &str) -> Result<BuildOrder, String> {
    let mut parts = value.splitn(3, ':');
    let (Some(player), Some(kind), Some(cell)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected PLAYER:KIND:CELL, got `{value}`"));
    };

    let player = player
        .parse::<u8>()
        .map_err(|error| error.to_string())
        .and_then(|seat| PlayerIndex::try_from(seat).map_err(|error| error.to_string()))?;
    let kind = kind
        .parse::<BuildingKind>()
        .map_err(|error| error.to_string())?;
    let cell = cell.parse::<u16>().map_err(|error| error.to_string())?;

    Ok(BuildOrder { player, kind, cell })
}

/// Entry point for the Lane Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };

    match cli.command {
        Mode::Simulate(args) => simulate(config, &args),
        Mode::Catalog => {
            print_catalog();
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn simulate(mut config: ServerConfig, args: &SimulateArgs) -> Result<()> {
    if let Some(gold) = args.starting_gold {
        config.starting_gold = gold;
    }
    config.validate().context("invalid simulation config")?;

    let mut driver = Driver::new(SessionId::new("sim0001"), &config);
    for username in ["west", "east"] {
        report(&driver.submit(Command::Join {
            username: username.to_owned(),
        }));
    }
    report(&driver.advance(config.scheduler().start_delay()));

    for order in &args.builds {
        report(&driver.submit(Command::PlaceBuilding {
            player: order.player,
            cell: order.cell,
            kind: order.kind,
        }));
    }

    let end = Duration::from_secs(args.seconds);
    let mut elapsed = Duration::ZERO;
    while elapsed < end && !driver.snapshot().game_over {
        let step = SIMULATION_STEP.min(end - elapsed);
        report(&driver.advance(step));
        elapsed += step;
    }

    let snapshot = driver.snapshot();
    info!(
        rounds = snapshot.round,
        units = snapshot.units.len(),
        game_over = snapshot.game_over,
        "simulation finished"
    );

    let rendered = if args.compact {
        serde_json::to_string(&snapshot)
    } else {
        serde_json::to_string_pretty(&snapshot)
    }
    .context("failed to serialise snapshot")?;
    println!("{rendered}");
    Ok(())
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::MatchStarted => info!("match started"),
            Event::PlacementRejected {
                player,
                cell,
                kind,
                reason,
            } => warn!(%player, cell, %kind, %reason, "placement rejected"),
            Event::BuildingPlaced {
                kind, cell, owner, ..
            } => info!(player = %owner, %kind, %cell, "building placed"),
            Event::BuildingDestroyed {
                kind, cell, owner, ..
            } => info!(player = %owner, %kind, %cell, "building destroyed"),
            Event::UnitSpawned {
                kind, cell, owner, ..
            } => debug!(player = %owner, %kind, %cell, "unit spawned"),
            Event::BaseDamaged { player, health, .. } => {
                debug!(%player, health, "base damaged");
            }
            Event::GameOver { winner } => info!(%winner, "game over"),
            _ => {}
        }
    }
}

fn print_catalog() {
    println!(
        "{:<16}{:<16}{:>6}{:>8}  behaviour",
        "building", "name", "price", "health"
    );
    for kind in BuildingKind::ALL {
        let spec = kind.spec();
        let mut behaviour = Vec::new();
        if let Some(spawn) = spec.spawn {
            behaviour.push(format!(
                "spawns {} every {} ms",
                spawn.unit.id(),
                spawn.interval.as_millis()
            ));
        }
        if spec.gold_per_tick > 0 {
            behaviour.push(format!("+{} gold per tick", spec.gold_per_tick));
        }
        if let Some(repair) = spec.repair {
            behaviour.push(format!("repairs base by {}", repair.amount));
        }
        if behaviour.is_empty() {
            behaviour.push("none".to_owned());
        }
        println!(
            "{:<16}{:<16}{:>6}{:>8}  {}",
            kind.id(),
            spec.name,
            spec.price,
            spec.max_health,
            behaviour.join(", ")
        );
    }

    println!();
    println!("{:<16}{:<16}{:>6}{:>8}", "unit", "name", "damage", "health");
    for kind in UnitKind::ALL {
        println!(
            "{:<16}{:<16}{:>6}{:>8}",
            kind.id(),
            kind.spec().name,
            kind.damage(),
            kind.max_health()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_orders_parse_from_colon_triples() {
        let order = parse_build_order("1:mageTower:200").expect("valid order");
        assert_eq!(order.player, PlayerIndex::Second);
        assert_eq!(order.kind, BuildingKind::MageTower);
        assert_eq!(order.cell, 200);
    }

    #[test]
    fn malformed_build_orders_are_rejected() {
        for value in ["barracks:7", "2:barracks:7", "0:moat:7", "0:farm:x"] {
            assert!(parse_build_order(value).is_err(), "{value} should fail");
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
