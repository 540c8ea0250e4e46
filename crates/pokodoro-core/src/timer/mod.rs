mod config;
mod engine;

pub use config::TimerConfig;
pub use engine::{Mode, PhaseTimer, PhaseTransition, TimerState};
