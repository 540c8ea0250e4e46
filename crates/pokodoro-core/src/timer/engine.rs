//! Phase timer implementation.
//!
//! The phase timer is a tick-driven state machine alternating between focus
//! (work) and rest (break) phases. It owns no clock and no thread - the
//! caller invokes `tick()` once per elapsed second while the timer runs.
//!
//! ## State Transitions
//!
//! ```text
//! WORK-paused <-> WORK-running --(0s)--> BREAK-paused <-> BREAK-running
//!      ^                                                        |
//!      +------------------------(0s)----------------------------+
//! ```
//!
//! Reaching zero always pauses the timer; the next phase waits for `start()`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = PhaseTimer::new(TimerConfig::default());
//! timer.start();
//! // Once per second:
//! if let Some(Event::WorkCompleted { transition, .. }) = timer.tick() {
//!     // hand the transition to the encounter coordinator
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::TimerConfig;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Work,
    Break,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Work => "Focus Session",
            Mode::Break => "Short Break",
        }
    }
}

/// Read-only view of the live timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: Mode,
    pub remaining_seconds: u64,
    pub is_running: bool,
    /// Incremented exactly once per WORK -> BREAK transition; never decreases.
    pub completed_work_sessions: u64,
}

/// Emitted once each time a work interval runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from_mode: Mode,
    pub to_mode: Mode,
    /// `completed_work_sessions` after the increment.
    pub session_count: u64,
}

/// Work/break countdown state machine.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    config: TimerConfig,
    state: TimerState,
}

impl PhaseTimer {
    /// Create a timer in the WORK-paused state with the full work duration.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            state: TimerState {
                mode: Mode::Work,
                remaining_seconds: config.work_duration_secs(),
                is_running: false,
                completed_work_sessions: 0,
            },
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn completed_work_sessions(&self) -> u64 {
        self.state.completed_work_sessions
    }

    /// Configured length of the current phase in seconds.
    pub fn phase_duration_secs(&self) -> u64 {
        match self.state.mode {
            Mode::Work => self.config.work_duration_secs(),
            Mode::Break => self.config.break_duration_secs(),
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.phase_duration_secs();
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(self.state.remaining_seconds);
        elapsed as f64 / total as f64
    }

    /// Remaining time as `MM:SS`.
    pub fn format_remaining(&self) -> String {
        let secs = self.state.remaining_seconds;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state.is_running = true;
        Some(Event::TimerStarted {
            mode: self.state.mode,
            remaining_seconds: self.state.remaining_seconds,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        Some(Event::TimerPaused {
            mode: self.state.mode,
            remaining_seconds: self.state.remaining_seconds,
            at: Utc::now(),
        })
    }

    /// Back to WORK-paused with the full work duration. The session counter
    /// is kept.
    pub fn reset(&mut self) -> Event {
        self.state.mode = Mode::Work;
        self.state.remaining_seconds = self.config.work_duration_secs();
        self.state.is_running = false;
        Event::TimerReset {
            completed_work_sessions: self.state.completed_work_sessions,
            at: Utc::now(),
        }
    }

    /// Advance one second. Returns `Some` when the tick finished a phase.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds > 0 {
            return None;
        }
        Some(self.complete_phase())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self) -> Event {
        self.state.is_running = false;
        match self.state.mode {
            Mode::Work => {
                self.state.completed_work_sessions += 1;
                self.state.mode = Mode::Break;
                self.state.remaining_seconds = self.config.break_duration_secs();
                let transition = PhaseTransition {
                    from_mode: Mode::Work,
                    to_mode: Mode::Break,
                    session_count: self.state.completed_work_sessions,
                };
                info!(
                    session_count = transition.session_count,
                    "work phase complete, entering break"
                );
                Event::WorkCompleted {
                    transition,
                    at: Utc::now(),
                }
            }
            Mode::Break => {
                self.state.mode = Mode::Work;
                self.state.remaining_seconds = self.config.work_duration_secs();
                debug!("break complete, back to work");
                Event::BreakCompleted {
                    completed_work_sessions: self.state.completed_work_sessions,
                    at: Utc::now(),
                }
            }
        }
    }
}
