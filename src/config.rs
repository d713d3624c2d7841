use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{CpuError, Result};

/// World-level knobs read by the CPU while it executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base mutation size; the CPU scales it per genome bit.
    pub mutation_size: f64,
    /// Points a host must exceed (and pays) to reproduce.
    pub host_repro_res: f64,
    /// Points a symbiont must exceed (and pays) to transmit horizontally.
    pub sym_horiz_trans_res: f64,
    /// Enables the Donate and Steal instructions.
    pub donation_steal_inst: bool,
    /// Fraction of a donation that never reaches the host.
    pub donate_penalty: f64,
    /// Fraction of a theft that never reaches the symbiont.
    pub steal_penalty: f64,
    /// Refill I/O registers with random values instead of a constant 1.
    pub random_io_input: bool,
    /// Seed ancestors with a random genome instead of the hand-written one.
    pub random_ancestor: bool,
    /// Length of randomly generated genomes.
    pub program_length: usize,
    pub cycles_per_update: usize,
    /// Resources the harness drops into each organism's active internal
    /// reservoir at the start of every update.
    pub resources_per_update: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mutation_size: 0.002,
            host_repro_res: 100.0,
            sym_horiz_trans_res: 100.0,
            donation_steal_inst: false,
            donate_penalty: 0.0,
            steal_penalty: 0.0,
            random_io_input: true,
            random_ancestor: false,
            program_length: 100,
            cycles_per_update: 30,
            resources_per_update: 1,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(self.mutation_size >= 0.0) {
            return Err(CpuError::InvalidConfig(format!(
                "mutation_size must be non-negative, got {}",
                self.mutation_size
            )));
        }
        for (name, value) in [
            ("host_repro_res", self.host_repro_res),
            ("sym_horiz_trans_res", self.sym_horiz_trans_res),
        ] {
            if !(value >= 0.0) {
                return Err(CpuError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("donate_penalty", self.donate_penalty),
            ("steal_penalty", self.steal_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CpuError::InvalidConfig(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self.program_length == 0 {
            return Err(CpuError::InvalidConfig(
                "program_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Loads and validates a config. Missing fields take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }
}
