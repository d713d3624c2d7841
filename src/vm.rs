use std::sync::Arc;
use tracing::debug;

use crate::disasm;
use crate::error::Result;
use crate::genome;
use crate::isa::{self, Flow, Registers};
use crate::matching::{TagMatcher, build_jump_cache};
use crate::organism::Organism;
use crate::program::{NUM_REGISTERS, Program, Tag};
use crate::regulation::Regulation;
use crate::state::{CompletionTracker, CpuState};
use crate::world::World;

/// Tag a freshly launched core seeks out.
pub const START_TAG: Tag = Tag(0);

pub const MAX_CORES: usize = 16;

/// Per-bit mutation probability is `mutation_size * MUTATION_RATE_SCALE`.
pub const MUTATION_RATE_SCALE: f64 = 15.0;

/// One thread of control over the genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Core {
    pub registers: Registers,
    pc: usize,
}

impl Core {
    fn at(pc: usize) -> Self {
        Self {
            registers: [0; NUM_REGISTERS],
            pc,
        }
    }

    pub fn program_counter(&self) -> usize {
        self.pc
    }
}

/// The virtual CPU and genome of one organism.
pub struct Cpu {
    cores: Vec<Core>,
    active: usize,
    program: Program,
    regulation: Regulation,
    matcher: TagMatcher,
    pub state: CpuState,
}

impl Cpu {
    /// CPU for an ancestor, seeded according to `random_ancestor`.
    pub fn new_ancestor(organism: Arc<dyn Organism>, world: Arc<World>) -> Result<Self> {
        let program = genome::start_program(world.config(), &mut rand::thread_rng())?;
        Ok(Self::with_program(organism, world, program))
    }

    /// CPU running a copy of an existing genome, typically a parent's.
    pub fn with_program(organism: Arc<dyn Organism>, world: Arc<World>, program: Program) -> Self {
        let mut cpu = Self {
            cores: Vec::new(),
            active: 0,
            program,
            regulation: Regulation::new(),
            matcher: TagMatcher::default(),
            state: CpuState::new(organism, world),
        };
        cpu.initialize_state();
        debug!(
            organism = %cpu.state.organism.id(),
            len = cpu.program.len(),
            anchors = cpu.matcher.num_anchors(),
            "cpu created"
        );
        cpu
    }

    /// Rebuilds the jump cache and tracker sizes. Must run after every
    /// change to the program or its regulation.
    fn initialize_state(&mut self) {
        self.refresh_jump_cache();
        if self.cores.is_empty() {
            self.launch_core(START_TAG);
        }
        let num_tasks = self.state.world.task_set().num_tasks();
        self.state.reset_trackers(num_tasks);
    }

    fn refresh_jump_cache(&mut self) {
        self.matcher = TagMatcher::from_program(&self.program, &self.regulation);
        self.state.jump_table = build_jump_cache(&self.program, &self.matcher);
    }

    /// Starts a core at the anchor best matching `tag`, or at the top of the
    /// program if nothing matches. Fails once [`MAX_CORES`] are running.
    pub fn launch_core(&mut self, tag: Tag) -> bool {
        if self.cores.len() >= MAX_CORES {
            return false;
        }
        let pc = self.matcher.resolve(tag).unwrap_or(0);
        self.cores.push(Core::at(pc));
        true
    }

    pub fn has_active_core(&self) -> bool {
        !self.cores.is_empty()
    }

    /// Executes `n_cycles` instructions, rotating between cores each cycle.
    ///
    /// `location` is the organism's slot this step; `None` runs it without
    /// allowing reproduction.
    pub fn run_step(&mut self, location: Option<usize>, n_cycles: usize) {
        if self.cores.is_empty() {
            self.launch_core(START_TAG);
        }
        self.state.location = location;

        let len = self.program.len();
        for _ in 0..n_cycles {
            let core = &mut self.cores[self.active];
            let inst = &self.program[core.pc];
            core.pc = match isa::execute(inst, core.pc, &mut core.registers, &mut self.state) {
                Flow::Next => (core.pc + 1) % len,
                Flow::Jump(target) => target % len,
            };
            self.active = (self.active + 1) % self.cores.len();
        }
    }

    /// Applies point mutations to the genome, then rebuilds the execution
    /// state around it. Returns the number of bits flipped.
    pub fn mutate(&mut self) -> usize {
        let rate = self.state.world.config().mutation_size * MUTATION_RATE_SCALE;
        let flipped = self
            .program
            .apply_point_mutations(rate, &mut rand::thread_rng());

        let shared = Arc::clone(&self.state.shared_completed);
        self.state = CpuState::new(Arc::clone(&self.state.organism), Arc::clone(&self.state.world));
        self.state.shared_completed = shared;
        self.regulation.clear();
        self.initialize_state();
        debug!(organism = %self.state.organism.id(), flipped, rate, "genome mutated");
        flipped
    }

    /// Returns the CPU to its freshly constructed condition, keeping the genome.
    pub fn reset(&mut self) {
        self.cores.clear();
        self.active = 0;
        self.regulation.clear();
        self.state = CpuState::new(Arc::clone(&self.state.organism), Arc::clone(&self.state.world));
        self.initialize_state();
        debug!(organism = %self.state.organism.id(), "cpu reset");
    }

    /// Re-opens the reproduction gate once the world has handled this
    /// step's queue.
    pub fn clear_reproduction(&mut self) {
        self.state.in_progress_repro = None;
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn matcher(&self) -> &TagMatcher {
        &self.matcher
    }

    pub fn jump_table(&self) -> &[usize] {
        &self.state.jump_table
    }

    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Register file of the first core.
    pub fn registers(&self) -> Option<&Registers> {
        self.cores.first().map(|c| &c.registers)
    }

    pub fn registers_mut(&mut self) -> Option<&mut Registers> {
        self.cores.first_mut().map(|c| &mut c.registers)
    }

    /// Biases matching toward (negative `delta`) or away from (positive)
    /// the anchor with ordinal `anchor`, and re-resolves every jump.
    pub fn regulate(&mut self, anchor: usize, delta: f64) {
        self.regulation.adjust(anchor, delta);
        self.refresh_jump_cache();
    }

    pub fn decay_regulation(&mut self, factor: f64) {
        self.regulation.decay(factor);
        self.refresh_jump_cache();
    }

    pub fn regulation(&self) -> &Regulation {
        &self.regulation
    }

    pub fn completion_tracker(&self) -> CompletionTracker {
        Arc::clone(&self.state.shared_completed)
    }

    /// Pairs this CPU's shared task tracker with a partner's.
    pub fn share_completion(&mut self, tracker: CompletionTracker) {
        self.state.shared_completed = tracker;
        let num_tasks = self.state.world.task_set().num_tasks();
        self.state.reset_trackers(num_tasks);
    }

    pub fn disassemble(&self) -> String {
        disasm::render(&self.program, &self.matcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::organism::Critter;
    use crate::program::{Instruction, Op};
    use crate::tasks::LogicTasks;
    use crate::world::TaskSet;

    fn world() -> Arc<World> {
        let config = Config {
            random_io_input: false,
            ..Config::default()
        };
        Arc::new(World::new(config, LogicTasks::default()))
    }

    fn cpu(insts: Vec<Instruction>) -> Cpu {
        let organism: Arc<dyn Organism> = Arc::new(Critter::host_with_points(0.0));
        Cpu::with_program(organism, world(), Program::new(insts).unwrap())
    }

    #[test]
    fn launches_at_the_start_anchor() {
        let c = cpu(vec![
            Instruction::system(Op::Nop),
            Instruction::anchor(START_TAG),
            Instruction::system(Op::Nop),
        ]);
        assert_eq!(c.cores().len(), 1);
        assert_eq!(c.cores()[0].program_counter(), 1);
    }

    #[test]
    fn program_counter_wraps() {
        let mut c = cpu(vec![
            Instruction::simple(Op::Increment, [0, 0, 0]),
            Instruction::system(Op::Nop),
        ]);
        c.run_step(None, 5);
        assert_eq!(c.registers().unwrap()[0], 3);
        assert_eq!(c.cores()[0].program_counter(), 1);
    }

    #[test]
    fn taken_jump_loops_back_to_anchor() {
        // r1 counts anchor visits; r0 != r2 keeps the jump taken.
        let mut c = cpu(vec![
            Instruction::anchor(Tag(0xAA)),
            Instruction::simple(Op::Increment, [1, 0, 0]),
            Instruction::jump(Op::JumpIfNEq, 0, 2, Tag(0xAB)),
            Instruction::simple(Op::Increment, [3, 0, 0]),
        ]);
        c.registers_mut().unwrap()[2] = 1;
        c.run_step(None, 3 * 4);
        let regs = c.registers().unwrap();
        assert_eq!(regs[1], 4);
        assert_eq!(regs[3], 0);
        assert_eq!(c.cores()[0].program_counter(), 0);
    }

    #[test]
    fn cores_take_turns() {
        let mut c = cpu(vec![
            Instruction::simple(Op::Increment, [0, 0, 0]),
            Instruction::simple(Op::Increment, [1, 0, 0]),
        ]);
        assert!(c.launch_core(Tag(5)));
        c.run_step(None, 4);
        // each core ran two instructions from the top
        for core in c.cores() {
            assert_eq!(core.registers[0], 1);
            assert_eq!(core.registers[1], 1);
        }
    }

    #[test]
    fn core_limit_is_enforced() {
        let mut c = cpu(vec![Instruction::system(Op::Nop)]);
        while c.launch_core(START_TAG) {}
        assert_eq!(c.cores().len(), MAX_CORES);
    }

    #[test]
    fn reset_restores_fresh_state() {
        let mut c = cpu(vec![
            Instruction::simple(Op::Push, [0, 0, 0]),
            Instruction::simple(Op::SharedIO, [0, 0, 0]),
        ]);
        c.launch_core(START_TAG);
        c.regulate(0, 3.0);
        c.run_step(Some(0), 6);
        assert!(!c.state.stack.is_empty());

        c.reset();
        assert_eq!(c.cores().len(), 1);
        assert_eq!(c.registers(), Some(&[0; NUM_REGISTERS]));
        assert!(c.state.stack.is_empty());
        assert!(c.state.input_buf.is_empty());
        assert!(c.regulation().is_empty());
        assert_eq!(c.state.location, None);
        assert_eq!(c.state.self_completed.len(), LogicTasks::default().num_tasks());
    }

    #[test]
    fn mutation_keeps_cache_in_step() {
        let config = Config {
            mutation_size: 0.05,
            ..Config::default()
        };
        let w = Arc::new(World::new(config, LogicTasks::default()));
        let organism: Arc<dyn Organism> = Arc::new(Critter::host_with_points(0.0));
        let mut c = Cpu::new_ancestor(organism, w).unwrap();
        let tracker = c.completion_tracker();
        for _ in 0..5 {
            c.mutate();
            assert_eq!(c.jump_table().len(), c.program().len());
            for (idx, inst) in c.program().iter().enumerate() {
                if inst.op.is_jump() {
                    let expected = c.matcher().resolve(inst.tag).unwrap_or(idx + 1);
                    assert_eq!(c.jump_table()[idx], expected);
                }
            }
        }
        assert!(Arc::ptr_eq(&tracker, &c.completion_tracker()));
    }

    #[test]
    fn regulation_reroutes_jumps() {
        let mut c = cpu(vec![
            Instruction::anchor(Tag(0b00)),
            Instruction::anchor(Tag(0b11)),
            Instruction::jump(Op::JumpIfLess, 0, 1, Tag(0b01)),
        ]);
        assert_eq!(c.jump_table()[2], 0);
        c.regulate(0, 2.0);
        assert_eq!(c.jump_table()[2], 1);
        c.decay_regulation(0.0);
        assert_eq!(c.jump_table()[2], 0);
    }

    #[test]
    fn paired_cpus_share_completion() {
        let w = world();
        let host: Arc<dyn Organism> = Arc::new(Critter::host_with_points(0.0));
        let sym: Arc<dyn Organism> = Arc::new(Critter::symbiont_in(&host, 0.0));
        let program = Program::new(vec![Instruction::system(Op::Nop)]).unwrap();
        let host_cpu = Cpu::with_program(host, Arc::clone(&w), program.clone());
        let mut sym_cpu = Cpu::with_program(sym, w, program);
        sym_cpu.share_completion(host_cpu.completion_tracker());
        sym_cpu.state.shared_completed.lock().unwrap()[0] = true;
        assert!(host_cpu.state.shared_completed()[0]);
    }
}
