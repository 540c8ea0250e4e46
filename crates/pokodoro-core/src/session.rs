//! A focus session: one phase timer plus one encounter coordinator.
//!
//! All state mutation happens through `&mut Session` on the owner's task.
//! The generator call is the only suspension point; it runs as a spawned
//! tokio task and reports back through a channel tagged with the request's
//! ticket, so results that outlive a reset or the session itself are
//! dropped instead of applied.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Notify};
use tokio::task::AbortHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::AuthGate;
use crate::encounter::{
    EncounterCoordinator, EncounterGenerator, EncounterOutcome, EncounterRequest,
    EncounterRequestState, GeneratorVerdict, RequestTicket,
};
use crate::error::{CoreError, GeneratorError, Result};
use crate::events::Event;
use crate::timer::{PhaseTimer, PhaseTransition, TimerConfig, TimerState};

pub const DEFAULT_TASK_MAP: &str = "Viridian Forest";
pub const DEFAULT_PARTNER: &str = "Pikachu";

/// Thematic context of the task being worked on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub task_map: String,
    pub partner: String,
}

impl SessionContext {
    pub fn new(task_map: impl Into<String>, partner: impl Into<String>) -> Self {
        Self {
            task_map: task_map.into(),
            partner: partner.into(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_MAP, DEFAULT_PARTNER)
    }
}

/// Everything the presentation layer reads.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub user: String,
    pub context: SessionContext,
    pub timer: TimerState,
    pub phase_label: String,
    pub clock: String,
    /// 0.0 .. 1.0 within the current phase.
    pub progress: f64,
    pub encounter_state: EncounterRequestState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<EncounterOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_error: Option<String>,
}

struct Completion {
    ticket: RequestTicket,
    result: std::result::Result<GeneratorVerdict, GeneratorError>,
}

pub struct Session {
    id: Uuid,
    user: String,
    timer: PhaseTimer,
    coordinator: EncounterCoordinator,
    context: SessionContext,
    generator: Arc<dyn EncounterGenerator>,
    request_timeout: Duration,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    /// The spawned generator call for the outstanding ticket.
    in_flight: Option<AbortHandle>,
    signal: Arc<Notify>,
    events: Vec<Event>,
}

impl Session {
    /// Open a session for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotAuthenticated`] when the gate reports no user.
    pub fn open(
        config: TimerConfig,
        context: SessionContext,
        generator: Arc<dyn EncounterGenerator>,
        gate: &dyn AuthGate,
        request_timeout: Duration,
    ) -> Result<Self> {
        let user = match gate.user() {
            Some(user) if gate.is_authenticated() => user.to_string(),
            _ => return Err(CoreError::NotAuthenticated),
        };

        let id = Uuid::new_v4();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        info!(
            session_id = %id,
            user = %user,
            task_map = %context.task_map,
            partner = %context.partner,
            generator = generator.name(),
            "session opened"
        );

        Ok(Self {
            id,
            user,
            timer: PhaseTimer::new(config),
            coordinator: EncounterCoordinator::new(id),
            context,
            generator,
            request_timeout,
            completions_tx,
            completions_rx,
            in_flight: None,
            signal: Arc::new(Notify::new()),
            events: Vec::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn encounter_state(&self) -> EncounterRequestState {
        self.coordinator.state()
    }

    pub fn outcome(&self) -> Option<&EncounterOutcome> {
        self.coordinator.outcome()
    }

    pub fn encounter_error(&self) -> Option<&GeneratorError> {
        self.coordinator.last_error()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            user: self.user.clone(),
            context: self.context.clone(),
            timer: self.timer.state(),
            phase_label: self.timer.mode().label().to_string(),
            clock: self.timer.format_remaining(),
            progress: self.timer.progress(),
            encounter_state: self.coordinator.state(),
            encounter: self.coordinator.outcome().cloned(),
            encounter_error: self.coordinator.last_error().map(|e| e.to_string()),
        }
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Fires whenever a generator result is waiting to be applied.
    pub fn resolution_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.signal)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> bool {
        let event = self.timer.start();
        self.record(event)
    }

    pub fn pause(&mut self) -> bool {
        let event = self.timer.pause();
        self.record(event)
    }

    /// Reset the timer and abandon any pending encounter request.
    pub fn reset(&mut self) {
        let event = self.timer.reset();
        self.events.push(event);
        let cancelled = self.coordinator.cancel_pending();
        if self.record(cancelled) {
            self.abort_in_flight();
        }
    }

    /// Dismiss the encounter dialog. Returns false when there was nothing
    /// to dismiss.
    pub fn acknowledge(&mut self) -> bool {
        let event = self.coordinator.acknowledge();
        self.record(event)
    }

    /// Advance the timer by one second.
    pub fn tick(&mut self) {
        let Some(event) = self.timer.tick() else {
            return;
        };
        let transition = match &event {
            Event::WorkCompleted { transition, .. } => Some(*transition),
            _ => None,
        };
        self.events.push(event);
        if let Some(transition) = transition {
            self.request_encounter(&transition);
        }
    }

    /// Apply every generator result that has arrived. Returns how many
    /// changed the encounter state.
    pub fn apply_resolutions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if let Some(event) = self.coordinator.resolve(completion.ticket, completion.result) {
                self.events.push(event);
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the pending request (if any) has been applied.
    pub async fn wait_for_resolution(&mut self) {
        loop {
            self.apply_resolutions();
            if self.coordinator.state() != EncounterRequestState::Pending {
                return;
            }
            self.signal.notified().await;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn record(&mut self, event: Option<Event>) -> bool {
        match event {
            Some(event) => {
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    fn request_encounter(&mut self, transition: &PhaseTransition) {
        let admitted =
            self.coordinator
                .on_work_to_break(transition, &self.context, self.timer.config());
        match admitted {
            Some((ticket, request)) => {
                self.events.push(Event::EncounterRequested {
                    request: request.clone(),
                    at: chrono::Utc::now(),
                });
                self.dispatch(ticket, request);
            }
            None => self.events.push(Event::EncounterDiscarded {
                session_count: transition.session_count,
                at: chrono::Utc::now(),
            }),
        }
    }

    fn dispatch(&mut self, ticket: RequestTicket, request: EncounterRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let err = GeneratorError::NotConfigured("no async runtime to run the generator".into());
            let event = self.coordinator.resolve(ticket, Err(err));
            self.record(event);
            return;
        };

        let generator = Arc::clone(&self.generator);
        let completions = self.completions_tx.clone();
        let signal = Arc::clone(&self.signal);
        let timeout = self.request_timeout;

        let task = runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, generator.generate(&request)).await {
                Ok(result) => result,
                Err(_) => Err(GeneratorError::Timeout(timeout)),
            };
            if completions.send(Completion { ticket, result }).is_ok() {
                signal.notify_one();
            } else {
                debug!(sequence = ticket.sequence(), "session gone; encounter result discarded");
            }
        });
        self.in_flight = Some(task.abort_handle());
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.coordinator.state() == EncounterRequestState::Pending {
            debug!(session_id = %self.id, "session closed with an encounter pending");
        }
        self.abort_in_flight();
    }
}
