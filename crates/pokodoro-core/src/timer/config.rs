use serde::Serialize;

use crate::error::ValidationError;

/// Immutable work/break durations for one session.
///
/// Construction is the only place durations are checked; a reset re-reads
/// these values but never changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerConfig {
    work_duration_secs: u64,
    break_duration_secs: u64,
}

impl TimerConfig {
    /// Build a config, rejecting zero-length phases.
    pub fn new(work_duration_secs: u64, break_duration_secs: u64) -> Result<Self, ValidationError> {
        if work_duration_secs == 0 {
            return Err(ValidationError::NonPositiveDuration {
                field: "work_duration_secs",
            });
        }
        if break_duration_secs == 0 {
            return Err(ValidationError::NonPositiveDuration {
                field: "break_duration_secs",
            });
        }
        Ok(Self {
            work_duration_secs,
            break_duration_secs,
        })
    }

    pub fn work_duration_secs(&self) -> u64 {
        self.work_duration_secs
    }

    pub fn break_duration_secs(&self) -> u64 {
        self.break_duration_secs
    }

    /// Whole minutes of focus per session, as reported to the generator.
    pub fn session_duration_minutes(&self) -> u64 {
        self.work_duration_secs / 60
    }
}

impl Default for TimerConfig {
    /// 25 minutes of focus, 5 minutes of rest.
    fn default() -> Self {
        Self {
            work_duration_secs: 25 * 60,
            break_duration_secs: 5 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_work_duration() {
        assert_eq!(
            TimerConfig::new(0, 300),
            Err(ValidationError::NonPositiveDuration {
                field: "work_duration_secs"
            })
        );
    }

    #[test]
    fn rejects_zero_break_duration() {
        assert_eq!(
            TimerConfig::new(1500, 0),
            Err(ValidationError::NonPositiveDuration {
                field: "break_duration_secs"
            })
        );
    }

    #[test]
    fn session_minutes_round_down() {
        assert_eq!(TimerConfig::new(1500, 300).unwrap().session_duration_minutes(), 25);
        assert_eq!(TimerConfig::new(90, 30).unwrap().session_duration_minutes(), 1);
        assert_eq!(TimerConfig::new(59, 30).unwrap().session_duration_minutes(), 0);
    }

    #[test]
    fn default_is_classic_pomodoro() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.work_duration_secs(), 1500);
        assert_eq!(cfg.break_duration_secs(), 300);
    }
}
