//! Remote recognition strategy.
//!
//! Submits the cropped image to a backend recognition endpoint and maps
//! every failure mode (transport error, timeout, non-2xx status, error
//! body) to the same [`RecognitionError`] shape the local worker
//! produces, so the session cannot distinguish the strategies.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::RecognitionError;
use crate::payload::{CaptureKind, RecognitionResult};
use crate::recognize::RecognitionBackend;

#[derive(Serialize)]
struct RemoteRequest<'a> {
    image: &'a str,
    kind: CaptureKind,
}

#[derive(Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    result: Option<RecognitionResult>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP recognition client.
pub struct RemoteBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl RemoteBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RecognitionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecognitionError::new(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl RecognitionBackend for RemoteBackend {
    fn recognize(
        &self,
        data_url: &str,
        kind: CaptureKind,
    ) -> Result<RecognitionResult, RecognitionError> {
        debug!(endpoint = %self.endpoint, kind = ?kind, "dispatching remote recognition");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&RemoteRequest {
                image: data_url,
                kind,
            })
            .send()
            .map_err(|e| RecognitionError::new(format!("recognition request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RecognitionError::new(format!("recognition response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(RecognitionError::new(format!(
                "recognition service returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: RemoteResponse = serde_json::from_str(&body)
            .map_err(|e| RecognitionError::new(format!("malformed recognition response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(RecognitionError::new(error));
        }
        parsed
            .result
            .ok_or_else(|| RecognitionError::new("recognition service returned no result"))
    }
}
