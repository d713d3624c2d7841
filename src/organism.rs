//! The organism side of the CPU contract.
//!
//! The CPU only needs an organism's role, its point balance and, for a
//! symbiont, a handle to its living host. Point operations take `&self`
//! because a symbiont's Donate or Steal touches its host's balance from
//! the symbiont's worker thread.

use std::sync::{Arc, Mutex, Weak};
use uuid::Uuid;

pub trait Organism: Send + Sync {
    fn id(&self) -> Uuid;

    fn is_host(&self) -> bool;

    fn points(&self) -> f64;

    fn add_points(&self, delta: f64);

    /// Deducts `cost` only if the balance is strictly above it. The check
    /// and the deduction happen under one lock.
    fn try_spend(&self, cost: f64) -> bool;

    /// Removes up to `wanted` points without going below zero and returns
    /// what was removed, as one atomic update.
    fn take_points(&self, wanted: f64) -> f64;

    /// The host a symbiont lives in, while that host is alive.
    fn host(&self) -> Option<Arc<dyn Organism>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Symbiont,
}

/// Minimal organism used by the population harness and the tests.
pub struct Critter {
    id: Uuid,
    role: Role,
    points: Mutex<f64>,
    host: Mutex<Option<Weak<dyn Organism>>>,
}

impl Critter {
    pub fn new(role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            points: Mutex::new(0.0),
            host: Mutex::new(None),
        }
    }

    pub fn host_with_points(points: f64) -> Self {
        let critter = Self::new(Role::Host);
        critter.set_points(points);
        critter
    }

    pub fn symbiont_in(host: &Arc<dyn Organism>, points: f64) -> Self {
        let critter = Self::new(Role::Symbiont);
        critter.set_points(points);
        critter.set_host(Some(host));
        critter
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_points(&self, points: f64) {
        *self.points.lock().unwrap_or_else(|e| e.into_inner()) = points;
    }

    pub fn set_host(&self, host: Option<&Arc<dyn Organism>>) {
        *self.host.lock().unwrap_or_else(|e| e.into_inner()) = host.map(Arc::downgrade);
    }

    /// A fresh, pointless organism of the same role living in the same host.
    pub fn offspring(&self) -> Self {
        let child = Self::new(self.role);
        if let Some(host) = self.host() {
            child.set_host(Some(&host));
        }
        child
    }
}

impl Organism for Critter {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    fn points(&self) -> f64 {
        *self.points.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add_points(&self, delta: f64) {
        *self.points.lock().unwrap_or_else(|e| e.into_inner()) += delta;
    }

    fn try_spend(&self, cost: f64) -> bool {
        let mut points = self.points.lock().unwrap_or_else(|e| e.into_inner());
        if *points <= cost {
            return false;
        }
        *points -= cost;
        true
    }

    fn take_points(&self, wanted: f64) -> f64 {
        let mut points = self.points.lock().unwrap_or_else(|e| e.into_inner());
        let taken = wanted.min(*points).max(0.0);
        *points -= taken;
        taken
    }

    fn host(&self) -> Option<Arc<dyn Organism>> {
        self.host
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

impl std::fmt::Debug for Critter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Critter")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("points", &self.points())
            .finish()
    }
}
