#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the horde director headlessly.

mod arena;
mod simulate;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use horde_director_catalog::{query, Catalog};
use horde_director_system_waves::DirectorConfig;

use crate::simulate::SimulationOptions;

/// Highest wave listed by the `catalog` subcommand.
const ROSTER_PREVIEW_WAVES: u32 = 20;

#[derive(Debug, Parser)]
#[command(
    name = "horde-director",
    version,
    about = "Headless driver for the adaptive wave director",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs a seeded simulation against a scripted arena.
    Simulate(SimulateArgs),
    /// Validates a catalog manifest and lists the roster per wave.
    Catalog(CatalogArgs),
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Number of waves to complete before stopping.
    #[arg(long, default_value_t = 10)]
    waves: u32,
    /// Seed for every random draw, decimal or 0x-prefixed hex.
    #[arg(long, value_parser = parse_u64, default_value = "0")]
    seed: u64,
    /// Catalog manifest to load instead of the bundled roster.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Director configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated milliseconds per tick.
    #[arg(long = "tick-ms", default_value_t = 50)]
    tick_ms: u64,
    /// Player skill between 0 (helpless) and 1 (dominant).
    #[arg(long, value_parser = parse_skill, default_value_t = 0.5)]
    skill: f32,
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Catalog manifest to inspect instead of the bundled roster.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn parse_u64(value: &str) -> Result<u64, String> {
    let trimmed = value.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).map_err(|err| err.to_string())
    } else {
        trimmed.parse::<u64>().map_err(|err| err.to_string())
    }
}

fn parse_skill(value: &str) -> Result<f32, String> {
    let skill: f32 = value.trim().parse().map_err(|err| format!("{err}"))?;
    if (0.0..=1.0).contains(&skill) {
        Ok(skill)
    } else {
        Err(format!("skill must lie within [0, 1], got {skill}"))
    }
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog> {
    let catalog = match path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => Catalog::standard().context("bundled catalog is invalid")?,
    };
    for warning in catalog.configuration_warnings() {
        log::warn!("catalog: {warning}");
    }
    Ok(catalog)
}

fn load_config(path: Option<&PathBuf>) -> Result<DirectorConfig> {
    match path {
        Some(path) => DirectorConfig::from_path(path)
            .with_context(|| format!("failed to load director config {}", path.display())),
        None => Ok(DirectorConfig::default()),
    }
}

fn list_catalog(catalog: &Catalog) {
    println!("{} enemy types:", catalog.enemies().len());
    for enemy in catalog.enemies() {
        let window = match enemy.max_wave {
            Some(max) => format!("waves {}-{max}", enemy.min_wave),
            None => format!("waves {}+", enemy.min_wave),
        };
        println!(
            "  #{:<3} {:<16} cost {:>3}  weight {:>5.1}  {window}",
            enemy.id.get(),
            enemy.name,
            enemy.spawn_cost,
            enemy.spawn_weight
        );
    }

    println!("{} special waves:", catalog.special_waves().len());
    for special in catalog.special_waves() {
        let phases: Vec<&str> = special.phases.iter().map(|phase| phase.name.as_str()).collect();
        println!(
            "  #{:<3} {:<24} from wave {:>2}  weight {:>4.1}  phases [{}]",
            special.id.get(),
            special.name,
            special.min_wave_to_appear,
            special.selection_weight,
            phases.join(", ")
        );
    }

    println!("default pool by wave:");
    for wave in 1..=ROSTER_PREVIEW_WAVES {
        let names: Vec<&str> = catalog
            .default_pool()
            .iter()
            .filter_map(|id| catalog.enemy(*id))
            .filter(|enemy| query::is_eligible(enemy, wave))
            .map(|enemy| enemy.name.as_str())
            .collect();
        let specials = catalog.available_special_waves(wave).count();
        println!(
            "  wave {wave:>2}: {} (+{specials} special)",
            names.join(", ")
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Simulate(args) => {
            let catalog = load_catalog(args.catalog.as_ref())?;
            let config = load_config(args.config.as_ref())?;
            let options = SimulationOptions {
                waves: args.waves,
                seed: args.seed,
                tick: Duration::from_millis(args.tick_ms),
                skill: args.skill,
            };
            simulate::run(config, catalog, options)
        }
        Command::Catalog(args) => {
            let catalog = load_catalog(args.catalog.as_ref())?;
            list_catalog(&catalog);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn seeds_accept_hex_and_decimal() {
        assert_eq!(parse_u64("42"), Ok(42));
        assert_eq!(parse_u64("0x2A"), Ok(42));
        assert!(parse_u64("forty-two").is_err());
    }

    #[test]
    fn skill_is_bounded() {
        assert_eq!(parse_skill("0.25"), Ok(0.25));
        assert!(parse_skill("1.5").is_err());
        assert!(parse_skill("-0.1").is_err());
    }

    #[test]
    fn simulate_arguments_parse() {
        let cli = Cli::try_parse_from([
            "horde-director",
            "simulate",
            "--waves",
            "3",
            "--seed",
            "0xff",
            "--tick-ms",
            "20",
            "--skill",
            "0.9",
        ])
        .expect("arguments are valid");
        match cli.command {
            Command::Simulate(args) => {
                assert_eq!(args.waves, 3);
                assert_eq!(args.seed, 255);
                assert_eq!(args.tick_ms, 20);
                assert_eq!(args.skill, 0.9);
                assert!(args.catalog.is_none());
            }
            Command::Catalog(_) => panic!("parsed the wrong subcommand"),
        }
    }
}
