#![allow(dead_code)]

use std::sync::Arc;

use symbiont_vm::{Config, Cpu, Critter, Instruction, LogicTasks, Organism, Program, World};

/// A world whose I/O always hands back 1.
pub fn quiet_config() -> Config {
    Config {
        random_io_input: false,
        ..Config::default()
    }
}

pub fn world(config: Config) -> Arc<World> {
    Arc::new(World::new(config, LogicTasks::default()))
}

pub fn host(points: f64) -> Arc<dyn Organism> {
    Arc::new(Critter::host_with_points(points))
}

pub fn host_cpu(world: &Arc<World>, points: f64, insts: Vec<Instruction>) -> Cpu {
    let program = Program::new(insts).expect("test program is valid");
    Cpu::with_program(host(points), Arc::clone(world), program)
}

/// A symbiont CPU living in `host`, paired with the host CPU's tracker.
pub fn symbiont_cpu(world: &Arc<World>, host: &Arc<dyn Organism>, host_cpu: &Cpu, points: f64, insts: Vec<Instruction>) -> Cpu {
    let program = Program::new(insts).expect("test program is valid");
    let sym: Arc<dyn Organism> = Arc::new(Critter::symbiont_in(host, points));
    let mut cpu = Cpu::with_program(sym, Arc::clone(world), program);
    cpu.share_completion(host_cpu.completion_tracker());
    cpu
}
