//! Per-organism execution state.
//!
//! Registers and program counters live in the CPU's cores; everything else
//! an instruction can observe or change lives in [`CpuState`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::organism::Organism;
use crate::world::World;

/// Organism stacks cap out here so they can't grow without bound.
pub const STACK_LIMIT: usize = 16;

/// Number of recent inputs kept in the echo buffer.
pub const INPUT_BUF_CAPACITY: usize = 16;

/// Resources held per internal reservoir; the oldest is dropped past this.
pub const RESERVOIR_LIMIT: usize = 64;

pub type CompletionTracker = Arc<Mutex<Vec<bool>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStack {
    items: Vec<u32>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(STACK_LIMIT),
        }
    }

    /// Pushes unless full; returns whether the value was kept.
    pub fn push(&mut self, value: u32) -> bool {
        if self.items.len() < STACK_LIMIT {
            self.items.push(value);
            true
        } else {
            false
        }
    }

    /// Pops the top value, or 0 when empty.
    pub fn pop(&mut self) -> u32 {
        self.items.pop().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.items
    }
}

/// Ring of the most recent values handed to the organism as input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    values: VecDeque<u32>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            values: VecDeque::with_capacity(INPUT_BUF_CAPACITY),
        }
    }

    pub fn push(&mut self, value: u32) {
        if self.values.len() == INPUT_BUF_CAPACITY {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// The `n`th most recent input (0 is the newest).
    pub fn recent(&self, n: usize) -> Option<u32> {
        self.values.iter().rev().nth(n).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &u32> {
        self.values.iter()
    }
}

pub struct CpuState {
    pub stack: ValueStack,
    pub stack2: ValueStack,
    pub input_buf: InputBuffer,
    /// Shared internal environment, consumed by ReuptakePublic.
    pub internal_environment: Vec<u32>,
    /// Private internal environment, consumed by ReuptakePrivate.
    pub internal_environment_private: Vec<u32>,
    pub internal_private: bool,
    pub self_completed: Vec<bool>,
    /// Shared with the organism's symbiotic partner.
    pub shared_completed: CompletionTracker,
    /// Queue slot of this step's reproduction, if one was requested.
    pub in_progress_repro: Option<usize>,
    /// Population slot for this step; `None` forbids reproduction.
    pub location: Option<usize>,
    pub jump_table: Vec<usize>,
    pub organism: Arc<dyn Organism>,
    pub world: Arc<World>,
}

impl CpuState {
    pub fn new(organism: Arc<dyn Organism>, world: Arc<World>) -> Self {
        Self {
            stack: ValueStack::new(),
            stack2: ValueStack::new(),
            input_buf: InputBuffer::new(),
            internal_environment: Vec::new(),
            internal_environment_private: Vec::new(),
            internal_private: false,
            self_completed: Vec::new(),
            shared_completed: Arc::new(Mutex::new(Vec::new())),
            in_progress_repro: None,
            location: None,
            jump_table: Vec::new(),
            organism,
            world,
        }
    }

    /// Sizes both completion trackers to `num_tasks`, clearing the private one.
    pub fn reset_trackers(&mut self, num_tasks: usize) {
        self.self_completed = vec![false; num_tasks];
        self.shared_completed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .resize(num_tasks, false);
    }

    pub fn shared_completed(&self) -> Vec<bool> {
        self.shared_completed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Adds a resource to the private or shared internal environment.
    pub fn deposit(&mut self, value: u32, private: bool) {
        let reservoir = if private {
            &mut self.internal_environment_private
        } else {
            &mut self.internal_environment
        };
        if reservoir.len() >= RESERVOIR_LIMIT {
            reservoir.remove(0);
        }
        reservoir.push(value);
    }

    /// Deposits into whichever reservoir InternalPrivate/InternalShared
    /// last selected.
    pub fn deposit_active(&mut self, value: u32) {
        self.deposit(value, self.internal_private);
    }
}

impl std::fmt::Debug for CpuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuState")
            .field("organism", &self.organism.id())
            .field("stack", &self.stack)
            .field("stack2", &self.stack2)
            .field("input_buf", &self.input_buf)
            .field("internal_private", &self.internal_private)
            .field("in_progress_repro", &self.in_progress_repro)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
