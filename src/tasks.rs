//! Reference task set: the classic nine logic tasks over recent inputs.

use crate::state::CpuState;
use crate::world::TaskSet;

#[derive(Clone, Copy, Debug)]
pub struct LogicTask {
    pub name: &'static str,
    pub value: f64,
    /// Number of recent inputs the task reads (1 or 2).
    pub arity: usize,
    compute: fn(u32, u32) -> u32,
}

impl LogicTask {
    pub const fn new(name: &'static str, value: f64, arity: usize, compute: fn(u32, u32) -> u32) -> Self {
        Self {
            name,
            value,
            arity,
            compute,
        }
    }

    /// Whether `output` solves this task for the organism's latest inputs.
    pub fn solved_by(&self, output: u32, state: &CpuState) -> bool {
        let Some(x) = state.input_buf.recent(0) else {
            return false;
        };
        let y = if self.arity > 1 {
            match state.input_buf.recent(1) {
                Some(y) => y,
                None => return false,
            }
        } else {
            0
        };
        (self.compute)(x, y) == output
    }
}

#[derive(Clone, Debug)]
pub struct LogicTasks {
    tasks: Vec<LogicTask>,
}

impl Default for LogicTasks {
    fn default() -> Self {
        Self::new(vec![
            LogicTask::new("NOT", 5.0, 1, |x, _| !x),
            LogicTask::new("NAND", 5.0, 2, |x, y| !(x & y)),
            LogicTask::new("AND", 10.0, 2, |x, y| x & y),
            LogicTask::new("ORN", 10.0, 2, |x, y| x | !y),
            LogicTask::new("OR", 15.0, 2, |x, y| x | y),
            LogicTask::new("ANDN", 15.0, 2, |x, y| x & !y),
            LogicTask::new("NOR", 20.0, 2, |x, y| !(x | y)),
            LogicTask::new("XOR", 20.0, 2, |x, y| x ^ y),
            LogicTask::new("EQU", 25.0, 2, |x, y| !(x ^ y)),
        ])
    }
}

impl LogicTasks {
    pub fn new(tasks: Vec<LogicTask>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[LogicTask] {
        &self.tasks
    }
}

impl TaskSet for LogicTasks {
    fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    fn check_tasks(&self, state: &mut CpuState, output: u32, shared: bool) -> f64 {
        let mut score = 0.0;
        for (i, task) in self.tasks.iter().enumerate() {
            if !task.solved_by(output, state) {
                continue;
            }
            score += task.value;
            if let Some(done) = state.self_completed.get_mut(i) {
                *done = true;
            }
            if shared {
                let mut completed = state
                    .shared_completed
                    .lock()
                    .unwrap_or_else(|e| e.into_inner());
                if let Some(done) = completed.get_mut(i) {
                    *done = true;
                }
            }
        }
        score
    }
}
