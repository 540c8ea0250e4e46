//! Encounter coordinator.
//!
//! Turns phase-transition events into generator requests and tracks the
//! lifecycle of the one request that may be outstanding:
//!
//! ```text
//! Idle --transition--> Pending --ok--> Resolved --acknowledge--> Idle
//!                         |
//!                         +---error/timeout--> Failed --acknowledge--> Idle
//! ```
//!
//! The coordinator never performs I/O itself. It hands out a
//! [`RequestTicket`] with each request; the owner runs the call and feeds
//! the result back through [`EncounterCoordinator::resolve`]. Results whose
//! ticket no longer matches the outstanding request are dropped.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{EncounterOutcome, EncounterRequest, EncounterRequestState, GeneratorVerdict};
use crate::error::GeneratorError;
use crate::events::Event;
use crate::session::SessionContext;
use crate::timer::{Mode, PhaseTransition, TimerConfig};

/// Identifies one dispatched request: the issuing session plus a sequence
/// number that is never reused within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestTicket {
    session_id: Uuid,
    sequence: u64,
}

impl RequestTicket {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Debug)]
pub struct EncounterCoordinator {
    session_id: Uuid,
    state: EncounterRequestState,
    outstanding: Option<RequestTicket>,
    outcome: Option<EncounterOutcome>,
    last_error: Option<GeneratorError>,
    next_sequence: u64,
}

impl EncounterCoordinator {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            state: EncounterRequestState::Idle,
            outstanding: None,
            outcome: None,
            last_error: None,
            next_sequence: 1,
        }
    }

    pub fn state(&self) -> EncounterRequestState {
        self.state
    }

    /// The stored outcome; only present while RESOLVED.
    pub fn outcome(&self) -> Option<&EncounterOutcome> {
        self.outcome.as_ref()
    }

    /// Why the last request failed; only present while FAILED.
    pub fn last_error(&self) -> Option<&GeneratorError> {
        self.last_error.as_ref()
    }

    /// Accept a WORK -> BREAK transition.
    ///
    /// Returns the request to dispatch, or `None` when a request is already
    /// pending (the transition is discarded, not queued) or the event is not
    /// a work completion.
    pub fn on_work_to_break(
        &mut self,
        transition: &PhaseTransition,
        context: &SessionContext,
        config: &TimerConfig,
    ) -> Option<(RequestTicket, EncounterRequest)> {
        if transition.from_mode != Mode::Work || transition.to_mode != Mode::Break {
            debug!(?transition, "ignoring non work-to-break transition");
            return None;
        }
        if self.state == EncounterRequestState::Pending {
            warn!(
                session_count = transition.session_count,
                "encounter request still pending; discarding transition"
            );
            return None;
        }

        let ticket = RequestTicket {
            session_id: self.session_id,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        let request = EncounterRequest::new(
            context.task_map.as_str(),
            context.partner.as_str(),
            transition.session_count,
            config.session_duration_minutes(),
        );

        self.state = EncounterRequestState::Pending;
        self.outstanding = Some(ticket);
        self.outcome = None;
        self.last_error = None;

        debug!(
            sequence = ticket.sequence,
            session_count = transition.session_count,
            "encounter request issued"
        );
        Some((ticket, request))
    }

    /// Apply a generator result.
    ///
    /// Returns `None` when the ticket is stale (reset, cancelled, or from
    /// another session) and the result was dropped.
    pub fn resolve(
        &mut self,
        ticket: RequestTicket,
        result: Result<GeneratorVerdict, GeneratorError>,
    ) -> Option<Event> {
        if self.state != EncounterRequestState::Pending || self.outstanding != Some(ticket) {
            warn!(
                sequence = ticket.sequence,
                "dropping stale encounter result"
            );
            return None;
        }
        self.outstanding = None;

        match result.and_then(GeneratorVerdict::into_outcome) {
            Ok(outcome) => {
                info!(
                    occurred = outcome.occurred(),
                    subject = outcome.subject_name().unwrap_or("-"),
                    rare = outcome.is_rare_variant().unwrap_or(false),
                    "encounter resolved"
                );
                self.state = EncounterRequestState::Resolved;
                self.outcome = Some(outcome.clone());
                Some(Event::EncounterResolved {
                    outcome,
                    at: Utc::now(),
                })
            }
            Err(err) => {
                warn!(error = %err, "encounter request failed");
                let reason = err.to_string();
                self.state = EncounterRequestState::Failed;
                self.outcome = None;
                self.last_error = Some(err);
                Some(Event::EncounterFailed {
                    reason,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Dismiss a RESOLVED or FAILED result. No-op in any other state.
    pub fn acknowledge(&mut self) -> Option<Event> {
        match self.state {
            EncounterRequestState::Resolved | EncounterRequestState::Failed => {
                self.state = EncounterRequestState::Idle;
                self.outcome = None;
                self.last_error = None;
                Some(Event::EncounterAcknowledged { at: Utc::now() })
            }
            EncounterRequestState::Idle | EncounterRequestState::Pending => None,
        }
    }

    /// Abandon a PENDING request so its eventual result is ignored.
    pub fn cancel_pending(&mut self) -> Option<Event> {
        if self.state != EncounterRequestState::Pending {
            return None;
        }
        debug!(ticket = ?self.outstanding, "cancelling pending encounter request");
        self.state = EncounterRequestState::Idle;
        self.outstanding = None;
        Some(Event::EncounterCancelled { at: Utc::now() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(session_count: u64) -> PhaseTransition {
        PhaseTransition {
            from_mode: Mode::Work,
            to_mode: Mode::Break,
            session_count,
        }
    }

    fn context() -> SessionContext {
        SessionContext::new("Viridian Forest", "Pikachu")
    }

    fn issue(c: &mut EncounterCoordinator, session_count: u64) -> Option<(RequestTicket, EncounterRequest)> {
        c.on_work_to_break(&transition(session_count), &context(), &TimerConfig::default())
    }

    #[test]
    fn transition_from_idle_goes_pending() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, request) = issue(&mut c, 1).unwrap();
        assert_eq!(c.state(), EncounterRequestState::Pending);
        assert_eq!(ticket.sequence(), 1);
        assert_eq!(request, EncounterRequest::new("Viridian Forest", "Pikachu", 1, 25));
    }

    #[test]
    fn second_transition_while_pending_is_discarded() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (first, _) = issue(&mut c, 1).unwrap();
        assert!(issue(&mut c, 2).is_none());
        assert_eq!(c.state(), EncounterRequestState::Pending);

        // The original request still resolves normally.
        assert!(c.resolve(first, Ok(GeneratorVerdict::nothing())).is_some());
        assert_eq!(c.state(), EncounterRequestState::Resolved);
    }

    #[test]
    fn break_to_work_is_not_a_trigger() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let backwards = PhaseTransition {
            from_mode: Mode::Break,
            to_mode: Mode::Work,
            session_count: 1,
        };
        assert!(c
            .on_work_to_break(&backwards, &context(), &TimerConfig::default())
            .is_none());
        assert_eq!(c.state(), EncounterRequestState::Idle);
    }

    #[test]
    fn negative_verdict_resolves_without_subject() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, _) = issue(&mut c, 1).unwrap();
        let event = c.resolve(ticket, Ok(GeneratorVerdict::nothing())).unwrap();
        assert!(matches!(event, Event::EncounterResolved { .. }));

        let outcome = c.outcome().unwrap();
        assert!(!outcome.occurred());
        assert!(outcome.subject_name().is_none());
        assert!(outcome.is_rare_variant().is_none());
    }

    #[test]
    fn positive_verdict_stores_subject() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, _) = issue(&mut c, 1).unwrap();
        c.resolve(ticket, Ok(GeneratorVerdict::appeared("Pikachu", true)));
        assert_eq!(c.outcome(), Some(&EncounterOutcome::appeared("Pikachu", true)));
    }

    #[test]
    fn generator_error_fails_without_outcome() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, _) = issue(&mut c, 1).unwrap();
        let event = c
            .resolve(ticket, Err(GeneratorError::Network("connection reset".into())))
            .unwrap();
        assert!(matches!(event, Event::EncounterFailed { .. }));
        assert_eq!(c.state(), EncounterRequestState::Failed);
        assert!(c.outcome().is_none());
        assert_eq!(
            c.last_error(),
            Some(&GeneratorError::Network("connection reset".into()))
        );

        assert!(c.acknowledge().is_some());
        assert_eq!(c.state(), EncounterRequestState::Idle);
        assert!(c.last_error().is_none());
    }

    #[test]
    fn malformed_verdict_fails() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, _) = issue(&mut c, 1).unwrap();
        let verdict = GeneratorVerdict {
            encounter_occurs: true,
            encountered_pokemon: None,
            shiny: None,
        };
        c.resolve(ticket, Ok(verdict));
        assert_eq!(c.state(), EncounterRequestState::Failed);
    }

    #[test]
    fn acknowledge_outside_result_states_is_noop() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        assert!(c.acknowledge().is_none());
        assert_eq!(c.state(), EncounterRequestState::Idle);

        issue(&mut c, 1).unwrap();
        assert!(c.acknowledge().is_none());
        assert_eq!(c.state(), EncounterRequestState::Pending);
    }

    #[test]
    fn acknowledge_clears_outcome() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, _) = issue(&mut c, 1).unwrap();
        c.resolve(ticket, Ok(GeneratorVerdict::appeared("Weedle", false)));
        c.acknowledge();
        assert_eq!(c.state(), EncounterRequestState::Idle);
        assert!(c.outcome().is_none());
    }

    #[test]
    fn result_after_cancel_is_dropped() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, _) = issue(&mut c, 1).unwrap();
        assert!(c.cancel_pending().is_some());
        assert!(c.resolve(ticket, Ok(GeneratorVerdict::appeared("Mew", true))).is_none());
        assert_eq!(c.state(), EncounterRequestState::Idle);
        assert!(c.outcome().is_none());
    }

    #[test]
    fn old_ticket_cannot_resolve_newer_request() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (old, _) = issue(&mut c, 1).unwrap();
        c.cancel_pending();
        let (new, _) = issue(&mut c, 2).unwrap();
        assert_ne!(old, new);

        assert!(c.resolve(old, Ok(GeneratorVerdict::nothing())).is_none());
        assert_eq!(c.state(), EncounterRequestState::Pending);
        assert!(c.resolve(new, Ok(GeneratorVerdict::nothing())).is_some());
    }

    #[test]
    fn ticket_from_another_session_is_dropped() {
        let mut mine = EncounterCoordinator::new(Uuid::new_v4());
        let mut theirs = EncounterCoordinator::new(Uuid::new_v4());
        issue(&mut mine, 1).unwrap();
        let (foreign, _) = issue(&mut theirs, 1).unwrap();
        assert!(mine.resolve(foreign, Ok(GeneratorVerdict::nothing())).is_none());
        assert_eq!(mine.state(), EncounterRequestState::Pending);
    }

    #[test]
    fn new_transition_after_resolution_replaces_outcome() {
        let mut c = EncounterCoordinator::new(Uuid::new_v4());
        let (ticket, _) = issue(&mut c, 1).unwrap();
        c.resolve(ticket, Ok(GeneratorVerdict::appeared("Pidgey", false)));
        assert!(issue(&mut c, 2).is_some());
        assert_eq!(c.state(), EncounterRequestState::Pending);
        assert!(c.outcome().is_none());
    }
}
