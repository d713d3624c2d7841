//! Runs a small host/symbiont population on the logic-task world and logs
//! what happens each update.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use symbiont_vm::{Config, LogicTasks, Population, World};

#[derive(Parser, Debug)]
#[command(name = "symbiont_vm")]
#[command(about = "Evolve SGP host and symbiont genomes on the logic tasks")]
struct Cli {
    /// JSON world configuration; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of updates to run
    #[arg(long, default_value = "100")]
    updates: u64,

    /// Maximum number of organisms
    #[arg(long, default_value = "64")]
    population: usize,

    /// Seed each ancestor host with an ancestor symbiont
    #[arg(long)]
    symbionts: bool,

    /// Write the first surviving genome here when the run ends
    #[arg(long)]
    dump_genome: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symbiont_vm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    info!(?config, "world configured");

    let world = Arc::new(World::new(config, LogicTasks::default()));
    let hosts = if cli.symbionts {
        cli.population / 2
    } else {
        cli.population
    }
    .max(1);
    let mut population = match Population::seed(world, hosts, cli.symbionts, cli.population) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to seed population: {}", e);
            std::process::exit(1);
        }
    };

    let mut last = None;
    for _ in 0..cli.updates {
        last = Some(population.update());
    }

    if let Some(report) = last {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to encode report: {}", e),
        }
    }

    if let Some(path) = &cli.dump_genome {
        let Some(member) = population.members().first() else {
            error!("Population died out; no genome to write");
            std::process::exit(1);
        };
        if let Err(e) = member.cpu.program().save_to_file(path) {
            error!("Failed to write genome {}: {}", path.display(), e);
            std::process::exit(1);
        }
        info!("Genome written to {}", path.display());
    }
}
