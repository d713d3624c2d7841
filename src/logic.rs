use crate::program::Op;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogicInfo {
    pub name: &'static str,
    /// Register operands the op reads or writes.
    pub arity: usize,
}

const fn info(name: &'static str, arity: usize) -> LogicInfo {
    LogicInfo { name, arity }
}

pub const fn logic_of(op: Op) -> LogicInfo {
    match op {
        Op::Nop => info("Nop-0", 0),
        Op::ShiftLeft => info("ShiftLeft", 1),
        Op::ShiftRight => info("ShiftRight", 1),
        Op::Increment => info("Increment", 1),
        Op::Decrement => info("Decrement", 1),
        Op::Push => info("Push", 1),
        Op::Pop => info("Pop", 1),
        Op::SwapStack => info("SwapStack", 0),
        Op::Swap => info("Swap", 2),
        Op::Add => info("Add", 3),
        Op::Subtract => info("Subtract", 3),
        Op::Nand => info("Nand", 3),
        Op::Reproduce => info("Reproduce", 0),
        Op::PrivateIO => info("PrivateIO", 1),
        Op::SharedIO => info("SharedIO", 1),
        Op::Donate => info("Donate", 0),
        Op::Steal => info("Steal", 0),
        Op::ReuptakePublic => info("ReuptakePublic", 1),
        Op::ReuptakePrivate => info("ReuptakePrivate", 1),
        Op::InternalPrivate => info("InternalPrivate", 0),
        Op::InternalShared => info("InternalShared", 0),
        Op::JumpIfNEq => info("JumpIfNEq", 2),
        Op::JumpIfLess => info("JumpIfLess", 2),
        Op::Anchor => info("Global Anchor", 0),
    }
}
