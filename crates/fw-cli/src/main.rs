//! CLI frontend for Fusewarden: offline administration and headless scenarios.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use fw_core::Vec3;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "fw",
    about = "Fusewarden: timed devices and region presence for a game server",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one administrative command against a config file
    Admin {
        /// Config file (created with defaults if missing)
        #[arg(short, long, default_value = "fusewarden.json")]
        config: PathBuf,

        /// Position of the acting player, as X,Y,Z (needed by set-center)
        #[arg(long, value_parser = parse_position)]
        at: Option<Vec3>,

        /// Command words, e.g. `set-radius 128` or `whitelist add Steve`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Run a headless arming and region scenario
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "400")]
        ticks: u64,

        /// RNG seed for deterministic runs
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Per-axis orientation jitter applied to the arming player each tick
        #[arg(long, default_value = "0.0")]
        jitter: f64,

        /// Arming duration in ticks
        #[arg(long, default_value = "100")]
        arming: u64,

        /// Fuse duration in ticks
        #[arg(long, default_value = "200")]
        fuse: u64,

        /// Random walkers spawned near the region edge
        #[arg(short, long, default_value = "4")]
        walkers: usize,

        /// Show all events (not just summary)
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_position(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected X,Y,Z, got '{s}'"));
    };
    let coord = |v: &str| {
        v.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| format!("'{v}' is not a coordinate"))
    };
    Ok(Vec3::new(coord(x)?, coord(y)?, coord(z)?))
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Admin { config, at, words } => commands::admin::run(&config, at, &words),
        Commands::Simulate {
            ticks,
            seed,
            jitter,
            arming,
            fuse,
            walkers,
            verbose,
        } => commands::simulate::run(&commands::simulate::Scenario {
            ticks,
            seed,
            jitter,
            arming,
            fuse,
            walkers,
            verbose,
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_parses_three_coordinates() {
        assert_eq!(parse_position("1.5, 64,-3").unwrap(), Vec3::new(1.5, 64.0, -3.0));
        assert!(parse_position("1,2").is_err());
        assert!(parse_position("a,b,c").is_err());
        assert!(parse_position("1,NaN,3").is_err());
    }
}
