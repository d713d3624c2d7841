//! Reward and economy protocol between instructions and the world.

use rand::RngCore;
use std::sync::Arc;
use tracing::trace;

use crate::config::Config;
use crate::state::CpuState;

/// Share of a private I/O reward a host keeps.
pub const HOST_PRIVATE_IO_FACTOR: f64 = 0.75;

/// Share of the pair's combined points moved by one Donate or Steal.
pub const TRANSFER_FRACTION: f64 = 0.20;

/// Scores `output` against the task set and credits the organism.
///
/// Private submissions made by a host are docked to
/// [`HOST_PRIVATE_IO_FACTOR`]. Symbiont rewards are also recorded to the
/// world's sym-earned monitor.
pub fn score_output(state: &mut CpuState, output: u32, shared: bool) -> f64 {
    let world = Arc::clone(&state.world);
    let mut score = world.task_set().check_tasks(state, output, shared);
    if score != 0.0 {
        if !state.organism.is_host() {
            world.sym_earned().add_datum(score);
        } else if !shared {
            score *= HOST_PRIVATE_IO_FACTOR;
        }
        state.organism.add_points(score);
    }
    score
}

/// The value an I/O instruction hands back to the organism.
pub fn next_input(config: &Config) -> u32 {
    if config.random_io_input {
        rand::thread_rng().next_u32()
    } else {
        1
    }
}

/// Queues this organism for reproduction if it is eligible and can pay.
///
/// Returns the queue slot on success. Ineligibility is not an error.
pub fn reproduce(state: &mut CpuState) -> Option<usize> {
    if state.in_progress_repro.is_some() {
        return None;
    }
    let location = state.location?;

    let config = state.world.config();
    let cost = if state.organism.is_host() {
        config.host_repro_res
    } else {
        config.sym_horiz_trans_res
    };
    if !state.organism.try_spend(cost) {
        return None;
    }

    let index = state
        .world
        .reproduction_queue()
        .append(Arc::clone(&state.organism), location);
    state.in_progress_repro = Some(index);
    trace!(organism = %state.organism.id(), location, index, "reproduction queued");
    Some(index)
}

/// Moves points from a symbiont to its host. Returns the amount taken from
/// the symbiont.
pub fn donate(state: &CpuState) -> Option<f64> {
    let config = state.world.config();
    if !config.donation_steal_inst || state.organism.is_host() {
        return None;
    }
    let host = state.organism.host()?;

    // Debit the giver first; the cap is applied under its lock.
    let wanted = (state.organism.points() + host.points()) * TRANSFER_FRACTION;
    let amount = state.organism.take_points(wanted);
    state.world.sym_donated().add_datum(amount);
    host.add_points(amount * (1.0 - config.donate_penalty));
    trace!(symbiont = %state.organism.id(), host = %host.id(), amount, "donated");
    Some(amount)
}

/// Moves points from a host to the symbiont living in it. Returns the
/// amount taken from the host.
pub fn steal(state: &CpuState) -> Option<f64> {
    let config = state.world.config();
    if !config.donation_steal_inst || state.organism.is_host() {
        return None;
    }
    let host = state.organism.host()?;

    let wanted = (state.organism.points() + host.points()) * TRANSFER_FRACTION;
    let amount = host.take_points(wanted);
    state.world.sym_stolen().add_datum(amount);
    state.organism.add_points(amount * (1.0 - config.steal_penalty));
    trace!(symbiont = %state.organism.id(), host = %host.id(), amount, "stole");
    Some(amount)
}
