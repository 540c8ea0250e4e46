use async_trait::async_trait;

use super::types::{EncounterRequest, GeneratorVerdict};
use crate::error::GeneratorError;

/// The stochastic encounter source.
///
/// Treated as an opaque capability: a function of the request that may
/// fail or never answer. Callers bound it with their own timeout.
#[async_trait]
pub trait EncounterGenerator: Send + Sync {
    /// Short identifier for logs (e.g. "local", "http").
    fn name(&self) -> &str;

    async fn generate(&self, request: &EncounterRequest)
        -> Result<GeneratorVerdict, GeneratorError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted generator for engine tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    pub(crate) struct ScriptedGenerator {
        reply: Result<GeneratorVerdict, GeneratorError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        live: AtomicUsize,
        peak: AtomicUsize,
        requests: Mutex<Vec<EncounterRequest>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn replying(reply: Result<GeneratorVerdict, GeneratorError>) -> Self {
            Self {
                reply,
                delay: None,
                calls: AtomicUsize::new(0),
                live: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn after(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Calls whose futures have not yet been dropped.
        pub(crate) fn live(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }

        /// Highest number of simultaneously live calls.
        pub(crate) fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }

        pub(crate) fn requests(&self) -> Vec<EncounterRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    struct LiveCall<'a>(&'a AtomicUsize);

    impl Drop for LiveCall<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl EncounterGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: &EncounterRequest,
        ) -> Result<GeneratorVerdict, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(live, Ordering::SeqCst);
            let _call = LiveCall(&self.live);
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone()
        }
    }
}
