use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::encounter::{EncounterOutcome, EncounterRequest};
use crate::timer::{Mode, PhaseTransition};

/// Every state change in a session produces an Event.
/// The presentation layer drains them; only `WorkCompleted` feeds the
/// encounter coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        completed_work_sessions: u64,
        at: DateTime<Utc>,
    },
    /// The phase-transition event: a work interval ran out.
    WorkCompleted {
        transition: PhaseTransition,
        at: DateTime<Utc>,
    },
    /// A break ran out and the timer is back in work mode.
    BreakCompleted {
        completed_work_sessions: u64,
        at: DateTime<Utc>,
    },
    EncounterRequested {
        request: EncounterRequest,
        at: DateTime<Utc>,
    },
    /// A transition arrived while a request was still pending.
    EncounterDiscarded {
        session_count: u64,
        at: DateTime<Utc>,
    },
    EncounterResolved {
        outcome: EncounterOutcome,
        at: DateTime<Utc>,
    },
    EncounterFailed {
        reason: String,
        at: DateTime<Utc>,
    },
    /// A pending request was abandoned (reset or teardown).
    EncounterCancelled {
        at: DateTime<Utc>,
    },
    EncounterAcknowledged {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Wire name of the variant, as used in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerReset { .. } => "timer_reset",
            Event::WorkCompleted { .. } => "work_completed",
            Event::BreakCompleted { .. } => "break_completed",
            Event::EncounterRequested { .. } => "encounter_requested",
            Event::EncounterDiscarded { .. } => "encounter_discarded",
            Event::EncounterResolved { .. } => "encounter_resolved",
            Event::EncounterFailed { .. } => "encounter_failed",
            Event::EncounterCancelled { .. } => "encounter_cancelled",
            Event::EncounterAcknowledged { .. } => "encounter_acknowledged",
        }
    }
}
