use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::ops::Index;
use std::path::Path;

use crate::error::{CpuError, Result};

/// Registers per core.
pub const NUM_REGISTERS: usize = 8;

/// Genomes longer than this are rejected at construction.
pub const MAX_PROGRAM_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Op {
    Nop = 0,
    ShiftLeft = 1,
    ShiftRight = 2,
    Increment = 3,
    Decrement = 4,
    Push = 5,
    Pop = 6,
    SwapStack = 7,
    Swap = 8,
    Add = 9,
    Subtract = 10,
    Nand = 11,
    Reproduce = 12,
    PrivateIO = 13,
    SharedIO = 14,
    Donate = 15,
    Steal = 16,
    ReuptakePublic = 17,
    ReuptakePrivate = 18,
    InternalPrivate = 19,
    InternalShared = 20,
    JumpIfNEq = 21,
    JumpIfLess = 22,
    Anchor = 23,
}

impl Op {
    pub const ALL: [Op; 24] = [
        Op::Nop,
        Op::ShiftLeft,
        Op::ShiftRight,
        Op::Increment,
        Op::Decrement,
        Op::Push,
        Op::Pop,
        Op::SwapStack,
        Op::Swap,
        Op::Add,
        Op::Subtract,
        Op::Nand,
        Op::Reproduce,
        Op::PrivateIO,
        Op::SharedIO,
        Op::Donate,
        Op::Steal,
        Op::ReuptakePublic,
        Op::ReuptakePrivate,
        Op::InternalPrivate,
        Op::InternalShared,
        Op::JumpIfNEq,
        Op::JumpIfLess,
        Op::Anchor,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Maps any byte onto an opcode; used after bit-level mutation.
    pub fn wrapping_from_u8(value: u8) -> Self {
        Self::ALL[value as usize % Self::COUNT]
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Op::JumpIfNEq | Op::JumpIfLess)
    }

    pub fn is_anchor(self) -> bool {
        self == Op::Anchor
    }
}

/// Fixed-width label used for content-addressed jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub u32);

impl Tag {
    pub const BITS: u32 = u32::BITS;

    /// Number of differing bits.
    pub fn distance(self, other: Tag) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Op,
    pub args: [u8; 3],
    #[serde(default)]
    pub tag: Tag,
}

impl Instruction {
    pub fn new(op: Op, args: [u8; 3], tag: Tag) -> Self {
        Self { op, args, tag }.rectified()
    }

    /// Instruction that only reads registers.
    pub fn simple(op: Op, args: [u8; 3]) -> Self {
        Self::new(op, args, Tag::default())
    }

    /// Instruction with no operands.
    pub fn system(op: Op) -> Self {
        Self::new(op, [0, 0, 0], Tag::default())
    }

    pub fn anchor(tag: Tag) -> Self {
        Self::new(Op::Anchor, [0, 0, 0], tag)
    }

    pub fn jump(op: Op, a: u8, b: u8, tag: Tag) -> Self {
        Self::new(op, [a, b, 0], tag)
    }

    /// Folds operands back into the register file.
    fn rectified(mut self) -> Self {
        for arg in &mut self.args {
            *arg %= NUM_REGISTERS as u8;
        }
        self
    }
}

/// An organism's genome: the instruction sequence its CPU executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Result<Self> {
        let program = Self {
            instructions: instructions.into_iter().map(Instruction::rectified).collect(),
        };
        program.validate()?;
        Ok(program)
    }

    pub fn validate(&self) -> Result<()> {
        if self.instructions.is_empty() {
            return Err(CpuError::EmptyProgram);
        }
        if self.instructions.len() > MAX_PROGRAM_LEN {
            return Err(CpuError::ProgramTooLong {
                len: self.instructions.len(),
                max: MAX_PROGRAM_LEN,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Toggles each bit of every instruction (opcode byte, operand bytes
    /// and tag word) independently with probability `p_bit_toggle`, then
    /// folds the results back into valid opcodes and registers.
    ///
    /// Returns the number of bits flipped.
    pub fn apply_point_mutations<R: Rng + ?Sized>(&mut self, p_bit_toggle: f64, rng: &mut R) -> usize {
        let p = if p_bit_toggle.is_finite() {
            p_bit_toggle.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if p == 0.0 {
            return 0;
        }

        let mut flipped = 0usize;
        for inst in &mut self.instructions {
            let mut op_byte = inst.op.as_u8();
            flipped += toggle_bits(&mut op_byte, u8::BITS, p, rng);
            inst.op = Op::wrapping_from_u8(op_byte);

            for arg in &mut inst.args {
                flipped += toggle_bits(arg, u8::BITS, p, rng);
            }

            let mut tag_word = inst.tag.0;
            for bit in 0..Tag::BITS {
                if rng.gen_bool(p) {
                    tag_word ^= 1 << bit;
                    flipped += 1;
                }
            }
            inst.tag = Tag(tag_word);

            *inst = inst.rectified();
        }
        flipped
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

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let instructions: Vec<Instruction> = serde_json::from_reader(BufReader::new(file))?;
        Self::new(instructions)
    }
}

fn toggle_bits<R: Rng + ?Sized>(byte: &mut u8, width: u32, p: f64, rng: &mut R) -> usize {
    let mut flipped = 0;
    for bit in 0..width {
        if rng.gen_bool(p) {
            *byte ^= 1 << bit;
            flipped += 1;
        }
    }
    flipped
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, idx: usize) -> &Instruction {
        &self.instructions[idx]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl TryFrom<Vec<Instruction>> for Program {
    type Error = CpuError;

    fn try_from(instructions: Vec<Instruction>) -> Result<Self> {
        Self::new(instructions)
    }
}

impl<'de> Deserialize<'de> for Program {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let instructions = Vec::<Instruction>::deserialize(deserializer)?;
        Program::new(instructions).map_err(serde::de::Error::custom)
    }
}
