//! Encounter engine: the request/verdict types exchanged with the external
//! generator, the generator implementations, and the coordinator that owns
//! the single in-flight request.

mod coordinator;
mod generator;
mod http;
mod local;
mod types;

pub use coordinator::{EncounterCoordinator, RequestTicket};
pub use generator::EncounterGenerator;
pub use http::HttpGenerator;
pub use local::LocalGenerator;
pub use types::{EncounterOutcome, EncounterRequest, EncounterRequestState, GeneratorVerdict};

#[cfg(test)]
pub(crate) use generator::testing;
