//! Thin reference scheduler: steps a population of CPUs in parallel and
//! turns queued reproduction into mutated offspring.

use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::economy;
use crate::error::Result;
use crate::organism::{Critter, Organism};
use crate::vm::Cpu;
use crate::world::{MonitorSnapshot, World};

pub struct Member {
    pub critter: Arc<Critter>,
    pub cpu: Cpu,
}

impl Member {
    fn new(critter: Arc<Critter>, cpu: Cpu) -> Self {
        Self { critter, cpu }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub update: u64,
    pub births: usize,
    pub population: usize,
    pub hosts: usize,
    pub mean_points: f64,
    pub sym_earned: MonitorSnapshot,
    pub sym_donated: MonitorSnapshot,
    pub sym_stolen: MonitorSnapshot,
}

pub struct Population {
    world: Arc<World>,
    members: Vec<Member>,
    capacity: usize,
    update: u64,
}

impl Population {
    pub fn new(world: Arc<World>, capacity: usize) -> Self {
        Self {
            world,
            members: Vec::new(),
            capacity: capacity.max(1),
            update: 0,
        }
    }

    /// Seeds `hosts` ancestor hosts, each optionally carrying an ancestor
    /// symbiont that shares its task-completion tracker.
    pub fn seed(world: Arc<World>, hosts: usize, with_symbionts: bool, capacity: usize) -> Result<Self> {
        let mut population = Self::new(world, capacity);
        for _ in 0..hosts {
            if population.is_full() {
                break;
            }
            let host = Arc::new(Critter::host_with_points(0.0));
            let host_cpu = Cpu::new_ancestor(host.clone(), Arc::clone(&population.world))?;
            let tracker = host_cpu.completion_tracker();
            population.members.push(Member::new(Arc::clone(&host), host_cpu));

            if with_symbionts && !population.is_full() {
                let host_dyn: Arc<dyn Organism> = host;
                let sym = Arc::new(Critter::symbiont_in(&host_dyn, 0.0));
                let mut sym_cpu = Cpu::new_ancestor(sym.clone(), Arc::clone(&population.world))?;
                sym_cpu.share_completion(tracker);
                population.members.push(Member::new(sym, sym_cpu));
            }
        }
        info!(members = population.members.len(), "population seeded");
        Ok(population)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Runs one update: every CPU gets `cycles_per_update` cycles at its
    /// slot, then queued parents produce offspring.
    pub fn update(&mut self) -> UpdateReport {
        let config = self.world.config().clone();
        // Anything left over belongs to a previous, unprocessed update.
        self.world.reproduction_queue().drain();
        for member in &mut self.members {
            member.cpu.clear_reproduction();
        }

        self.members
            .par_iter_mut()
            .enumerate()
            .for_each(|(slot, member)| {
                for _ in 0..config.resources_per_update {
                    member.cpu.state.deposit_active(economy::next_input(&config));
                }
                member.cpu.run_step(Some(slot), config.cycles_per_update);
            });

        let births = self.process_reproduction();
        self.update += 1;

        let report = self.report(births);
        info!(
            update = report.update,
            births = report.births,
            population = report.population,
            mean_points = report.mean_points,
            "update complete"
        );
        report
    }

    fn process_reproduction(&mut self) -> usize {
        let pending = self.world.reproduction_queue().drain();

        // Copy every parent genome before any slot is overwritten.
        let offspring: Vec<_> = pending
            .iter()
            .filter_map(|(_, location)| self.members.get(*location))
            .map(|parent| {
                (
                    parent.critter.offspring(),
                    parent.cpu.program().clone(),
                    parent.cpu.completion_tracker(),
                )
            })
            .collect();

        for member in &mut self.members {
            member.cpu.clear_reproduction();
        }

        let mut rng = rand::thread_rng();
        let births = offspring.len();
        for (critter, program, tracker) in offspring {
            let critter = Arc::new(critter);
            let mut cpu = Cpu::with_program(critter.clone(), Arc::clone(&self.world), program);
            if !critter.is_host() {
                cpu.share_completion(tracker);
            }
            cpu.mutate();
            let child = Member::new(critter, cpu);

            if self.is_full() {
                let slot = rng.gen_range(0..self.members.len());
                debug!(slot, "offspring replaces resident");
                self.members[slot] = child;
            } else {
                self.members.push(child);
            }
        }
        births
    }

    fn report(&self, births: usize) -> UpdateReport {
        let hosts = self.members.iter().filter(|m| m.critter.is_host()).count();
        let total: f64 = self.members.iter().map(|m| m.critter.points()).sum();
        let mean_points = if self.members.is_empty() {
            0.0
        } else {
            total / self.members.len() as f64
        };
        UpdateReport {
            update: self.update,
            births,
            population: self.members.len(),
            hosts,
            mean_points,
            sym_earned: self.world.sym_earned().take(),
            sym_donated: self.world.sym_donated().take(),
            sym_stolen: self.world.sym_stolen().take(),
        }
    }
}
