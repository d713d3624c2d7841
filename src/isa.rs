//! Instruction semantics.
//!
//! Every op is total: stack bounds, missing jump targets and failed
//! economic gates all degrade to defined no-ops.

use crate::economy;
use crate::program::{Instruction, NUM_REGISTERS, Op};
use crate::state::CpuState;

pub type Registers = [u32; NUM_REGISTERS];

/// Where the core goes after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Jump(usize),
}

#[inline]
pub(crate) fn execute(inst: &Instruction, pc: usize, regs: &mut Registers, state: &mut CpuState) -> Flow {
    let [a, b, c] = inst.args.map(usize::from);

    match inst.op {
        Op::Nop | Op::Anchor => {}
        Op::JumpIfNEq => {
            if regs[a] != regs[b] {
                return Flow::Jump(state.jump_table[pc]);
            }
        }
        Op::JumpIfLess => {
            if regs[a] < regs[b] {
                return Flow::Jump(state.jump_table[pc]);
            }
        }
        Op::Increment => regs[a] = regs[a].wrapping_add(1),
        Op::Decrement => regs[a] = regs[a].wrapping_sub(1),
        Op::ShiftLeft => regs[a] <<= 1,
        Op::ShiftRight => regs[a] >>= 1,
        Op::Add => regs[a] = regs[b].wrapping_add(regs[c]),
        Op::Subtract => regs[a] = regs[b].wrapping_sub(regs[c]),
        Op::Nand => regs[a] = !(regs[b] & regs[c]),
        Op::Push => {
            state.stack.push(regs[a]);
        }
        Op::Pop => regs[a] = state.stack.pop(),
        Op::SwapStack => std::mem::swap(&mut state.stack, &mut state.stack2),
        Op::Swap => regs.swap(a, b),
        Op::Reproduce => {
            economy::reproduce(state);
        }
        Op::PrivateIO => {
            economy::score_output(state, regs[a], false);
            regs[a] = refill(state);
        }
        Op::SharedIO => {
            economy::score_output(state, regs[a], true);
            regs[a] = refill(state);
        }
        Op::Donate => {
            economy::donate(state);
        }
        Op::Steal => {
            economy::steal(state);
        }
        Op::ReuptakePublic => {
            economy::score_output(state, regs[a], true);
            regs[a] = reuptake(state, false);
        }
        Op::ReuptakePrivate => {
            economy::score_output(state, regs[a], true);
            regs[a] = reuptake(state, true);
        }
        Op::InternalPrivate => state.internal_private = true,
        Op::InternalShared => state.internal_private = false,
    }
    Flow::Next
}

fn refill(state: &mut CpuState) -> u32 {
    let next = economy::next_input(state.world.config());
    state.input_buf.push(next);
    next
}

fn reuptake(state: &mut CpuState, private: bool) -> u32 {
    let reservoir = if private {
        &mut state.internal_environment_private
    } else {
        &mut state.internal_environment
    };
    match reservoir.pop() {
        Some(next) => {
            state.input_buf.push(next);
            next
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::organism::{Critter, Organism};
    use crate::program::Tag;
    use crate::state::STACK_LIMIT;
    use crate::world::{TaskSet, World};
    use std::sync::Arc;

    struct NoTasks;

    impl TaskSet for NoTasks {
        fn num_tasks(&self) -> usize {
            0
        }

        fn check_tasks(&self, _: &mut CpuState, _: u32, _: bool) -> f64 {
            0.0
        }
    }

    fn state() -> CpuState {
        let config = Config {
            random_io_input: false,
            ..Config::default()
        };
        let organism: Arc<dyn Organism> = Arc::new(Critter::host_with_points(0.0));
        CpuState::new(organism, Arc::new(World::new(config, NoTasks)))
    }

    fn run(op: Op, args: [u8; 3], regs: &mut Registers, state: &mut CpuState) -> Flow {
        execute(&Instruction::simple(op, args), 0, regs, state)
    }

    #[test]
    fn arithmetic_wraps() {
        let mut st = state();
        let mut regs = [0u32; NUM_REGISTERS];
        run(Op::Decrement, [0, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[0], u32::MAX);
        run(Op::Increment, [0, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[0], 0);

        regs[1] = 3;
        regs[2] = 5;
        run(Op::Subtract, [0, 1, 2], &mut regs, &mut st);
        assert_eq!(regs[0], u32::MAX - 1);
        run(Op::Add, [3, 0, 2], &mut regs, &mut st);
        assert_eq!(regs[3], 3);
        run(Op::Nand, [4, 1, 2], &mut regs, &mut st);
        assert_eq!(regs[4], !1);

        regs[5] = 0x8000_0001;
        run(Op::ShiftLeft, [5, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[5], 2);
        run(Op::ShiftRight, [5, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[5], 1);
    }

    #[test]
    fn swap_exchanges_registers() {
        let mut st = state();
        let mut regs = [0u32; NUM_REGISTERS];
        regs[2] = 9;
        regs[6] = 4;
        run(Op::Swap, [2, 6, 0], &mut regs, &mut st);
        assert_eq!((regs[2], regs[6]), (4, 9));
    }

    #[test]
    fn push_pop_and_swap_stack() {
        let mut st = state();
        let mut regs = [0u32; NUM_REGISTERS];
        for v in 0..(STACK_LIMIT as u32 + 4) {
            regs[0] = v;
            run(Op::Push, [0, 0, 0], &mut regs, &mut st);
        }
        assert_eq!(st.stack.len(), STACK_LIMIT);

        run(Op::SwapStack, [0, 0, 0], &mut regs, &mut st);
        assert!(st.stack.is_empty());
        assert_eq!(st.stack2.len(), STACK_LIMIT);

        regs[1] = 77;
        run(Op::Pop, [1, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[1], 0);

        run(Op::SwapStack, [0, 0, 0], &mut regs, &mut st);
        run(Op::Pop, [1, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[1], STACK_LIMIT as u32 - 1);
    }

    #[test]
    fn jumps_use_the_cached_target() {
        let mut st = state();
        st.jump_table = vec![9, 4];
        let mut regs = [0u32; NUM_REGISTERS];
        let neq = Instruction::jump(Op::JumpIfNEq, 0, 1, Tag(0));
        let less = Instruction::jump(Op::JumpIfLess, 0, 1, Tag(0));

        assert_eq!(execute(&neq, 1, &mut regs, &mut st), Flow::Next);
        regs[1] = 2;
        assert_eq!(execute(&neq, 1, &mut regs, &mut st), Flow::Jump(4));
        assert_eq!(execute(&less, 0, &mut regs, &mut st), Flow::Jump(9));
        regs[0] = 2;
        assert_eq!(execute(&less, 0, &mut regs, &mut st), Flow::Next);
    }

    #[test]
    fn io_refills_register_and_echoes() {
        let mut st = state();
        let mut regs = [0u32; NUM_REGISTERS];
        regs[3] = 123;
        run(Op::SharedIO, [3, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[3], 1);
        assert_eq!(st.input_buf.recent(0), Some(1));
    }

    #[test]
    fn reuptake_drains_from_the_back() {
        let mut st = state();
        st.deposit(10, false);
        st.deposit(11, false);
        st.deposit(20, true);
        let mut regs = [5u32; NUM_REGISTERS];

        run(Op::ReuptakePublic, [0, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[0], 11);
        run(Op::ReuptakePrivate, [1, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[1], 20);
        run(Op::ReuptakePrivate, [1, 0, 0], &mut regs, &mut st);
        assert_eq!(regs[1], 0);
        assert_eq!(st.input_buf.len(), 2);
        assert_eq!(st.internal_environment, vec![10]);
    }

    #[test]
    fn environment_toggles() {
        let mut st = state();
        let mut regs = [0u32; NUM_REGISTERS];
        run(Op::InternalPrivate, [0, 0, 0], &mut regs, &mut st);
        assert!(st.internal_private);
        run(Op::InternalShared, [0, 0, 0], &mut regs, &mut st);
        assert!(!st.internal_private);
        assert_eq!(regs, [0; NUM_REGISTERS]);
    }
}
