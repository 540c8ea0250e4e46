use std::time::Duration;

use clap::Args;
use pokodoro_core::{Config, Event, SessionDriver};
use tracing::debug;

use super::{emit, open_session, SessionArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Number of work sessions to run before exiting
    #[arg(long, default_value_t = 1)]
    pub cycles: u64,
    /// Milliseconds per timer tick (1000 = real time)
    #[arg(long, default_value_t = 1000)]
    pub tick_ms: u64,
}

/// Run a session on the real clock, printing every event as a JSON line.
///
/// Phases start automatically; encounters are acknowledged as soon as they
/// are printed.
pub fn run(args: RunArgs, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if args.cycles == 0 {
        return Err("--cycles must be at least 1".into());
    }
    if args.tick_ms == 0 {
        return Err("--tick-ms must be at least 1".into());
    }

    let mut config = Config::load()?;
    args.session.apply(&mut config);
    let generator = config.build_generator()?;
    let session = open_session(&config, user, generator)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let mut handle = SessionDriver::spawn(session, Duration::from_millis(args.tick_ms));
        handle.start();

        let mut completed = 0u64;
        while let Some(event) = handle.next_event().await {
            emit(&event)?;
            match event {
                Event::WorkCompleted { .. } => {
                    completed += 1;
                    handle.start();
                }
                Event::BreakCompleted { .. } => {
                    handle.start();
                }
                Event::EncounterResolved { .. } | Event::EncounterFailed { .. } => {
                    handle.acknowledge();
                    if completed >= args.cycles {
                        break;
                    }
                }
                Event::EncounterDiscarded { .. } if completed >= args.cycles => break,
                _ => {}
            }
        }

        debug!(completed, "run finished");
        let session = handle.shutdown().await?;
        emit(&session.snapshot())?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
