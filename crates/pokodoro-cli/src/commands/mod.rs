pub mod config;
pub mod run;
pub mod simulate;
pub mod status;

use std::sync::Arc;

use clap::Args;
use pokodoro_core::{Config, EncounterGenerator, Session};

/// Session settings that override the config file for one invocation.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Work phase length in seconds
    #[arg(long)]
    pub work_secs: Option<u64>,
    /// Break phase length in seconds
    #[arg(long)]
    pub break_secs: Option<u64>,
    /// Task map (e.g. "Viridian Forest", "Mt. Moon")
    #[arg(long)]
    pub map: Option<String>,
    /// Partner Pokemon
    #[arg(long)]
    pub partner: Option<String>,
}

impl SessionArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(secs) = self.work_secs {
            config.timer.work_secs = secs;
        }
        if let Some(secs) = self.break_secs {
            config.timer.break_secs = secs;
        }
        if let Some(map) = &self.map {
            config.task.map = map.clone();
        }
        if let Some(partner) = &self.partner {
            config.task.partner = partner.clone();
        }
    }
}

/// Open a session from config, checking the signed-in user first.
pub fn open_session(
    config: &Config,
    user: Option<String>,
    generator: Arc<dyn EncounterGenerator>,
) -> Result<Session, Box<dyn std::error::Error>> {
    let identity = config.identity(user);
    let timer = config.timer_config()?;
    let session = Session::open(
        timer,
        config.session_context(),
        generator,
        &identity,
        config.request_timeout(),
    )?;
    Ok(session)
}

/// Print one value as a single JSON line.
pub fn emit<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
