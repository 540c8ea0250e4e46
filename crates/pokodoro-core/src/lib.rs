//! # Pokodoro Core Library
//!
//! This library provides the core logic for Pokodoro, a focus timer that
//! rewards each completed work interval with a chance at a wild encounter.
//! The CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Phase Timer**: A tick-driven work/break state machine that requires the
//!   caller to invoke `tick()` once per second
//! - **Encounter Engine**: A coordinator that turns each WORK -> BREAK
//!   transition into at most one outstanding generator request
//! - **Session**: Owns one timer and one coordinator, runs generator calls
//!   on tokio and drops results that outlive a reset
//! - **Driver**: Puts a session on its own task with a real one-second clock
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PhaseTimer`]: Core timer state machine
//! - [`EncounterCoordinator`]: Request lifecycle (idle/pending/resolved/failed)
//! - [`EncounterGenerator`]: Trait for encounter sources (local or HTTP)
//! - [`Session`]: The per-task aggregate exposed to presentation layers
//! - [`Config`]: Application configuration management

pub mod auth;
pub mod driver;
pub mod encounter;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use auth::{AuthGate, Identity};
pub use driver::{Command, SessionDriver, SessionHandle};
pub use encounter::{
    EncounterCoordinator, EncounterGenerator, EncounterOutcome, EncounterRequest,
    EncounterRequestState, GeneratorVerdict, HttpGenerator, LocalGenerator, RequestTicket,
};
pub use error::{ConfigError, CoreError, GeneratorError, ValidationError};
pub use events::Event;
pub use session::{Session, SessionContext, SessionSnapshot};
pub use storage::{Config, GeneratorKind};
pub use timer::{Mode, PhaseTimer, PhaseTransition, TimerConfig, TimerState};
