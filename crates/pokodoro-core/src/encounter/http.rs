//! HttpGenerator: encounter verdicts from a remote endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::generator::EncounterGenerator;
use super::types::{EncounterRequest, GeneratorVerdict};
use crate::error::GeneratorError;

/// Largest verdict body accepted from the endpoint.
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Generator backed by an HTTP endpoint accepting the wire request as JSON.
pub struct HttpGenerator {
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
    http_client: Client,
}

impl HttpGenerator {
    /// Create a generator posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GeneratorError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GeneratorError::NotConfigured(format!(
                "endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        Ok(Self {
            endpoint,
            token: None,
            timeout,
            http_client: Client::new(),
        })
    }

    /// Send `token` as a bearer credential with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> GeneratorError {
        if err.is_timeout() {
            GeneratorError::Timeout(self.timeout)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl EncounterGenerator for HttpGenerator {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(
        &self,
        request: &EncounterRequest,
    ) -> Result<GeneratorVerdict, GeneratorError> {
        debug!(
            endpoint = %self.endpoint,
            session_count = request.session_count(),
            "requesting encounter verdict"
        );

        let mut req = self
            .http_client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeneratorError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        if bytes.len() > MAX_RESPONSE_SIZE {
            return Err(GeneratorError::MalformedResponse(format!(
                "response body exceeds {MAX_RESPONSE_SIZE} byte limit"
            )));
        }

        serde_json::from_slice(&bytes).map_err(|e| GeneratorError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn request() -> EncounterRequest {
        EncounterRequest::new("Mt. Moon", "Clefairy", 3, 25)
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let result = HttpGenerator::new("ftp://example.com", Duration::from_secs(5));
        assert!(matches!(result, Err(GeneratorError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn posts_wire_request_and_parses_verdict() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/encounter")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::Json(json!({
                "taskMap": "Mt. Moon",
                "partnerPokemon": "Clefairy",
                "sessionCount": 3,
                "sessionDuration": 25,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"encounterOccurs":true,"encounteredPokemon":"Zubat","shiny":false}"#)
            .create_async()
            .await;

        let generator = HttpGenerator::new(format!("{}/encounter", server.url()), Duration::from_secs(5))
            .unwrap()
            .with_token("secret");
        let verdict = generator.generate(&request()).await.unwrap();

        assert_eq!(verdict, GeneratorVerdict::appeared("Zubat", false));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn negative_verdict_round_trips() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"encounterOccurs":false}"#)
            .create_async()
            .await;

        let generator = HttpGenerator::new(server.url(), Duration::from_secs(5)).unwrap();
        let verdict = generator.generate(&request()).await.unwrap();
        assert_eq!(verdict, GeneratorVerdict::nothing());
    }

    #[tokio::test]
    async fn server_error_is_http_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let generator = HttpGenerator::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = generator.generate(&request()).await.unwrap_err();
        assert_eq!(err, GeneratorError::HttpStatus(503));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body("the tall grass rustles")
            .create_async()
            .await;

        let generator = HttpGenerator::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GeneratorError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Port 9 (discard) on localhost is not expected to be listening.
        let generator =
            HttpGenerator::new("http://127.0.0.1:9/encounter", Duration::from_secs(5)).unwrap();
        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Network(_)));
    }
}
