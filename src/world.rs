//! World-scoped services shared by every CPU in a population.
//!
//! A [`World`] is built once and handed to each CPU as an `Arc`. Everything
//! in it that CPUs write to (the reproduction queue and the data monitors)
//! is safe to use from many worker threads within one update.

use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::organism::Organism;
use crate::state::CpuState;

/// Scores an output value produced by an I/O instruction.
///
/// Implementations record completion into `state.self_completed` and, for
/// shared submissions, `state.shared_completed`.
pub trait TaskSet: Send + Sync {
    fn num_tasks(&self) -> usize;

    /// Returns the reward for `output`; 0.0 when no task matched.
    fn check_tasks(&self, state: &mut CpuState, output: u32, shared: bool) -> f64;
}

/// Organisms waiting to reproduce at the end of the current update.
#[derive(Default)]
pub struct ReproQueue {
    pending: Mutex<Vec<(Arc<dyn Organism>, usize)>>,
}

impl ReproQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues under the lock and returns the slot the entry landed in.
    pub fn append(&self, organism: Arc<dyn Organism>, location: usize) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let index = pending.len();
        pending.push((organism, location));
        index
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every pending entry, in enqueue order.
    pub fn drain(&self) -> Vec<(Arc<dyn Organism>, usize)> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MonitorSnapshot {
    pub count: usize,
    pub total: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MonitorSnapshot {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }

    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }
}

/// Concurrent running statistics over a stream of values.
#[derive(Debug, Default)]
pub struct DataMonitor {
    stats: Mutex<MonitorSnapshot>,
}

impl DataMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_datum(&self, value: f64) {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).record(value);
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current statistics and starts a new window.
    pub fn take(&self) -> MonitorSnapshot {
        std::mem::take(&mut *self.stats.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

pub struct World {
    config: Config,
    tasks: Box<dyn TaskSet>,
    to_reproduce: ReproQueue,
    sym_earned: DataMonitor,
    sym_donated: DataMonitor,
    sym_stolen: DataMonitor,
}

impl World {
    pub fn new(config: Config, tasks: impl TaskSet + 'static) -> Self {
        Self {
            config,
            tasks: Box::new(tasks),
            to_reproduce: ReproQueue::new(),
            sym_earned: DataMonitor::new(),
            sym_donated: DataMonitor::new(),
            sym_stolen: DataMonitor::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn task_set(&self) -> &dyn TaskSet {
        self.tasks.as_ref()
    }

    pub fn reproduction_queue(&self) -> &ReproQueue {
        &self.to_reproduce
    }

    /// Points earned by symbionts through I/O.
    pub fn sym_earned(&self) -> &DataMonitor {
        &self.sym_earned
    }

    pub fn sym_donated(&self) -> &DataMonitor {
        &self.sym_donated
    }

    pub fn sym_stolen(&self) -> &DataMonitor {
        &self.sym_stolen
    }
}
