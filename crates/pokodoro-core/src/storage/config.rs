//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Work and break durations
//! - The active task's map and partner
//! - Which encounter generator to use and how to reach it
//! - The signed-in user name
//!
//! Configuration is stored at `~/.config/pokodoro/config.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::auth::Identity;
use crate::encounter::{EncounterGenerator, HttpGenerator, LocalGenerator};
use crate::error::{ConfigError, GeneratorError, Result, ValidationError};
use crate::session::{SessionContext, DEFAULT_PARTNER, DEFAULT_TASK_MAP};
use crate::timer::TimerConfig;

/// Timer durations, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSection {
    #[serde(default = "default_work_secs")]
    pub work_secs: u64,
    #[serde(default = "default_break_secs")]
    pub break_secs: u64,
}

/// The task currently being worked on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSection {
    #[serde(default = "default_map")]
    pub map: String,
    #[serde(default = "default_partner")]
    pub partner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Local,
    Http,
}

/// Encounter generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterSection {
    #[serde(default = "default_generator")]
    pub generator: GeneratorKind,
    /// Endpoint for the `http` generator.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer token for the `http` generator.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fixed seed for the `local` generator.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default)]
    pub user: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pokodoro/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSection,
    #[serde(default)]
    pub task: TaskSection,
    #[serde(default)]
    pub encounter: EncounterSection,
    #[serde(default)]
    pub auth: AuthSection,
}

// Default functions
fn default_work_secs() -> u64 {
    25 * 60
}
fn default_break_secs() -> u64 {
    5 * 60
}
fn default_map() -> String {
    DEFAULT_TASK_MAP.into()
}
fn default_partner() -> String {
    DEFAULT_PARTNER.into()
}
fn default_generator() -> GeneratorKind {
    GeneratorKind::Local
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for TimerSection {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            break_secs: default_break_secs(),
        }
    }
}

impl Default for TaskSection {
    fn default() -> Self {
        Self {
            map: default_map(),
            partner: default_partner(),
        }
    }
}

impl Default for EncounterSection {
    fn default() -> Self {
        Self {
            generator: default_generator(),
            endpoint: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            seed: None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
        unset_as_number: bool,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    // An empty value unsets optional keys.
                    serde_json::Value::Null
                    | serde_json::Value::String(_)
                    | serde_json::Value::Number(_)
                    | serde_json::Value::Bool(_)
                        if value.is_empty() =>
                    {
                        serde_json::Value::Null
                    }
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Null if unset_as_number => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Null => serde_json::Value::String(value.into()),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Only updates memory; call `save()` to
    /// persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    ///
    /// An empty value unsets an optional key. A key that is currently unset
    /// carries no type in its serialized form, so the value is tried as text
    /// first and as a number second.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let current = serde_json::to_value(&*self)?;

        let mut json = current.clone();
        Self::set_json_value_by_path(&mut json, key, value, false)?;
        let err = match serde_json::from_value(json) {
            Ok(updated) => {
                *self = updated;
                return Ok(());
            }
            Err(err) => err,
        };

        let was_unset = Self::get_json_value_by_path(&current, key).is_some_and(|v| v.is_null());
        if was_unset && !value.is_empty() {
            let mut json = current;
            if Self::set_json_value_by_path(&mut json, key, value, true).is_ok() {
                if let Ok(updated) = serde_json::from_value(json) {
                    *self = updated;
                    return Ok(());
                }
            }
        }

        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        }
        .into())
    }

    /// Validated timer durations.
    pub fn timer_config(&self) -> Result<TimerConfig, ValidationError> {
        TimerConfig::new(self.timer.work_secs, self.timer.break_secs)
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(self.task.map.as_str(), self.task.partner.as_str())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.encounter.timeout_secs.max(1))
    }

    /// The identity to gate sessions with; `user_override` wins over the
    /// configured user.
    pub fn identity(&self, user_override: Option<String>) -> Identity {
        Identity::from_optional(user_override.or_else(|| self.auth.user.clone()))
    }

    /// Build the configured encounter generator.
    pub fn build_generator(&self) -> Result<Arc<dyn EncounterGenerator>, GeneratorError> {
        match self.encounter.generator {
            GeneratorKind::Local => {
                let generator = match self.encounter.seed {
                    Some(seed) => LocalGenerator::seeded(seed),
                    None => LocalGenerator::new(),
                };
                Ok(Arc::new(generator))
            }
            GeneratorKind::Http => {
                let endpoint = self.encounter.endpoint.as_deref().ok_or_else(|| {
                    GeneratorError::NotConfigured("encounter.endpoint is not set".into())
                })?;
                let mut generator = HttpGenerator::new(endpoint, self.request_timeout())?;
                if let Some(token) = &self.encounter.token {
                    generator = generator.with_token(token.as_str());
                }
                Ok(Arc::new(generator))
            }
        }
    }
}
