pub mod config;
pub mod disasm;
pub mod economy;
pub mod error;
pub mod evolution;
pub mod genome;
pub mod isa;
pub mod logic;
pub mod matching;
pub mod organism;
pub mod program;
pub mod regulation;
pub mod state;
pub mod tasks;
pub mod vm;
pub mod world;

pub use config::Config;
pub use error::{CpuError, Result};
pub use evolution::{Population, UpdateReport};
pub use organism::{Critter, Organism};
pub use program::{Instruction, Op, Program, Tag};
pub use tasks::LogicTasks;
pub use vm::{Cpu, START_TAG};
pub use world::{TaskSet, World};
