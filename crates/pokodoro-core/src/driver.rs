//! Real-clock driver for a [`Session`].
//!
//! The session lives inside one tokio task. Ticks, generator results and
//! user commands are all serialized through that task's select loop, so no
//! lock is held around timer or encounter state.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::session::{Session, SessionSnapshot};

/// Write access granted to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Acknowledge,
    Shutdown,
}

/// Handle to a running session task.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: mpsc::UnboundedReceiver<Event>,
    task: JoinHandle<Session>,
}

impl SessionHandle {
    /// Returns false once the driver has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause)
    }

    pub fn reset(&self) -> bool {
        self.send(Command::Reset)
    }

    pub fn acknowledge(&self) -> bool {
        self.send(Command::Acknowledge)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Next session event; `None` once the driver has stopped and every
    /// event has been read.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Stop the driver and hand back the session.
    pub async fn shutdown(self) -> Result<Session> {
        let _ = self.commands.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| CoreError::Custom(format!("session driver failed: {e}")))
    }
}

pub struct SessionDriver;

impl SessionDriver {
    /// Move `session` onto its own task, ticking it every `tick_interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(session: Session, tick_interval: Duration) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(session, tick_interval, command_rx, snapshot_tx, event_tx));

        SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_rx,
            task,
        }
    }
}

async fn run(
    mut session: Session,
    tick_interval: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: mpsc::UnboundedSender<Event>,
) -> Session {
    let signal = session.resolution_signal();
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    debug!(session_id = %session.id(), ?tick_interval, "session driver started");

    loop {
        tokio::select! {
            _ = ticker.tick() => session.tick(),
            _ = signal.notified() => {
                session.apply_resolutions();
            }
            command = commands.recv() => match command {
                Some(Command::Start) => {
                    // A full second of countdown after pressing start.
                    if session.start() {
                        ticker.reset();
                    }
                }
                Some(Command::Pause) => {
                    session.pause();
                }
                Some(Command::Reset) => session.reset(),
                Some(Command::Acknowledge) => {
                    session.acknowledge();
                }
                Some(Command::Shutdown) | None => break,
            },
        }

        for event in session.take_events() {
            let _ = events.send(event);
        }
        snapshots.send_replace(session.snapshot());
    }

    for event in session.take_events() {
        let _ = events.send(event);
    }
    debug!(session_id = %session.id(), "session driver stopped");
    session
}
