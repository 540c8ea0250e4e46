use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;

/// One request to the encounter generator, built at a WORK -> BREAK
/// transition.
///
/// Serializes to the generator's wire input:
/// `{ taskMap, partnerPokemon, sessionCount, sessionDuration }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRequest {
    #[serde(rename = "taskMap")]
    task_map: String,
    #[serde(rename = "partnerPokemon")]
    partner_identifier: String,
    #[serde(rename = "sessionCount")]
    session_count: u64,
    /// Minutes of focus per session.
    #[serde(rename = "sessionDuration")]
    session_duration_minutes: u64,
}

impl EncounterRequest {
    pub fn new(
        task_map: impl Into<String>,
        partner_identifier: impl Into<String>,
        session_count: u64,
        session_duration_minutes: u64,
    ) -> Self {
        Self {
            task_map: task_map.into(),
            partner_identifier: partner_identifier.into(),
            session_count,
            session_duration_minutes,
        }
    }

    pub fn task_map(&self) -> &str {
        &self.task_map
    }

    pub fn partner_identifier(&self) -> &str {
        &self.partner_identifier
    }

    pub fn session_count(&self) -> u64 {
        self.session_count
    }

    pub fn session_duration_minutes(&self) -> u64 {
        self.session_duration_minutes
    }
}

/// Raw generator output: `{ encounterOccurs, encounteredPokemon?, shiny? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorVerdict {
    pub encounter_occurs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encountered_pokemon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiny: Option<bool>,
}

impl GeneratorVerdict {
    pub fn nothing() -> Self {
        Self {
            encounter_occurs: false,
            encountered_pokemon: None,
            shiny: None,
        }
    }

    pub fn appeared(name: impl Into<String>, shiny: bool) -> Self {
        Self {
            encounter_occurs: true,
            encountered_pokemon: Some(name.into()),
            shiny: Some(shiny),
        }
    }

    /// Interpret the verdict.
    ///
    /// A positive verdict without a subject name is malformed; extra fields
    /// on a negative verdict are ignored.
    pub fn into_outcome(self) -> Result<EncounterOutcome, GeneratorError> {
        if !self.encounter_occurs {
            return Ok(EncounterOutcome::nothing());
        }
        match self.encountered_pokemon {
            Some(name) if !name.trim().is_empty() => {
                Ok(EncounterOutcome::appeared(name, self.shiny.unwrap_or(false)))
            }
            _ => Err(GeneratorError::MalformedResponse(
                "encounterOccurs is true but no encounteredPokemon was given".into(),
            )),
        }
    }
}

/// Presentable result of a completed request.
///
/// `subject_name` and `is_rare_variant` exist only when `occurred` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterOutcome {
    occurred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_rare_variant: Option<bool>,
}

impl EncounterOutcome {
    pub fn nothing() -> Self {
        Self {
            occurred: false,
            subject_name: None,
            is_rare_variant: None,
        }
    }

    pub fn appeared(subject_name: impl Into<String>, is_rare_variant: bool) -> Self {
        Self {
            occurred: true,
            subject_name: Some(subject_name.into()),
            is_rare_variant: Some(is_rare_variant),
        }
    }

    pub fn occurred(&self) -> bool {
        self.occurred
    }

    pub fn subject_name(&self) -> Option<&str> {
        self.subject_name.as_deref()
    }

    pub fn is_rare_variant(&self) -> Option<bool> {
        self.is_rare_variant
    }
}

/// Lifecycle of the coordinator's single request slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterRequestState {
    Idle,
    Pending,
    Resolved,
    Failed,
}
