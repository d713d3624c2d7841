//! Prints a genome as labelled assembly.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use symbiont_vm::genome::ancestor_program;
use symbiont_vm::{Config, Cpu, Critter, LogicTasks, Program, World};

#[derive(Parser, Debug)]
#[command(name = "symbiont-disasm")]
#[command(about = "Disassemble a saved genome (or the built-in ancestor)")]
struct Cli {
    /// Genome JSON written by `symbiont_vm --dump-genome`
    genome: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symbiont_vm=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let program = match &cli.genome {
        Some(path) => Program::load_from_file(path),
        None => ancestor_program(),
    };
    let program = match program {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to load genome: {}", e);
            std::process::exit(1);
        }
    };

    let world = Arc::new(World::new(Config::default(), LogicTasks::default()));
    let cpu = Cpu::with_program(Arc::new(Critter::host_with_points(0.0)), world, program);
    print!("{}", cpu.disassemble());
}
