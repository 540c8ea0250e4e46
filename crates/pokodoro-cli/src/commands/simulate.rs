use std::sync::Arc;

use clap::Args;
use pokodoro_core::{Config, Event, LocalGenerator, Mode, Session};
use serde::Serialize;

use super::{emit, open_session, SessionArgs};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Number of work sessions to simulate
    #[arg(long, default_value_t = 4)]
    pub cycles: u64,
    /// Seed for the local encounter generator
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "summary")]
struct Summary {
    cycles: u64,
    encounters: u64,
    rare: u64,
    failures: u64,
    seed: Option<u64>,
}

/// Run whole sessions without waiting on the clock. Always uses the local
/// generator, so a seed makes the output reproducible apart from timestamps.
pub fn run(args: SimulateArgs, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if args.cycles == 0 {
        return Err("--cycles must be at least 1".into());
    }

    let mut config = Config::load()?;
    args.session.apply(&mut config);
    let seed = args.seed.or(config.encounter.seed);
    let generator = match seed {
        Some(seed) => LocalGenerator::seeded(seed),
        None => LocalGenerator::new(),
    };
    let mut session = open_session(&config, user, Arc::new(generator))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut summary = Summary {
        cycles: args.cycles,
        encounters: 0,
        rare: 0,
        failures: 0,
        seed,
    };
    runtime.block_on(simulate(&mut session, args.cycles, &mut summary))?;
    emit(&summary)?;
    Ok(())
}

async fn simulate(
    session: &mut Session,
    cycles: u64,
    summary: &mut Summary,
) -> Result<(), Box<dyn std::error::Error>> {
    while session.timer_state().completed_work_sessions < cycles {
        run_phase(session);
        session.wait_for_resolution().await;
        for event in session.take_events() {
            emit(&event)?;
            match &event {
                Event::EncounterResolved { outcome, .. } if outcome.occurred() => {
                    summary.encounters += 1;
                    if outcome.is_rare_variant() == Some(true) {
                        summary.rare += 1;
                    }
                }
                Event::EncounterFailed { .. } => summary.failures += 1,
                _ => {}
            }
        }
        if session.acknowledge() {
            for event in session.take_events() {
                emit(&event)?;
            }
        }
        // Let the break run out unless this was the last work session.
        if session.timer_state().mode == Mode::Break
            && session.timer_state().completed_work_sessions < cycles
        {
            run_phase(session);
            for event in session.take_events() {
                emit(&event)?;
            }
        }
    }
    Ok(())
}

/// Start the current phase and tick until it completes.
fn run_phase(session: &mut Session) {
    session.start();
    while session.timer_state().is_running {
        session.tick();
    }
}
