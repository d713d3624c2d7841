use rand::Rng;

use crate::config::Config;
use crate::error::Result;
use crate::program::{Instruction, NUM_REGISTERS, Op, Program, Tag};
use crate::vm::START_TAG;

/// A genome drawn uniformly over opcodes, operands and tags.
pub fn random_program<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Result<Program> {
    let mut insts = Vec::with_capacity(len);
    for _ in 0..len {
        let op = Op::ALL[rng.gen_range(0..Op::COUNT)];
        let args = [0; 3].map(|_: u8| rng.gen_range(0..NUM_REGISTERS as u8));
        let tag = Tag(rng.gen_range(0..=u32::MAX));
        insts.push(Instruction::new(op, args, tag));
    }
    Program::new(insts)
}

/// Hand-written ancestor that solves NOT on shared I/O, tries to reproduce,
/// and loops back to its start anchor forever.
pub fn ancestor_program() -> Result<Program> {
    let insts = vec![
        Instruction::anchor(START_TAG),
        // r0 <- input
        Instruction::simple(Op::SharedIO, [0, 0, 0]),
        // r1 = !(r0 & r0)
        Instruction::simple(Op::Nand, [1, 0, 0]),
        Instruction::simple(Op::SharedIO, [1, 0, 0]),
        Instruction::system(Op::Reproduce),
        // r2 only returns to r3's zero after 2^32 laps.
        Instruction::simple(Op::Increment, [2, 0, 0]),
        Instruction::jump(Op::JumpIfNEq, 2, 3, START_TAG),
    ];
    Program::new(insts)
}

/// The genome a world seeds its ancestors with.
pub fn start_program<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Program> {
    if config.random_ancestor {
        random_program(config.program_length, rng)
    } else {
        ancestor_program()
    }
}
