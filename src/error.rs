//! Error types for symbiont_vm

use thiserror::Error;

/// Failures that can surface while building a CPU or loading its inputs.
///
/// Instruction execution never produces one of these.
#[derive(Debug, Error)]
pub enum CpuError {
    /// A genome with no instructions cannot be executed
    #[error("program is empty")]
    EmptyProgram,

    #[error("program has {len} instructions, limit is {max}")]
    ProgramTooLong { len: usize, max: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CpuError>;
