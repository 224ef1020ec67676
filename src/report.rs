//! Failure-report upload channel.
//!
//! On a failed recognition the operator can push the offending image plus
//! a free-text note to a review queue. Two hops: a credential request
//! scoped to the session, then a single blob upload to the signed URL it
//! returns. The channel is independent of the session state machine: a
//! failed upload is a notification concern, never a stage change.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ReportError;
use crate::payload::{CaptureKind, decode_data_url};

#[derive(Serialize)]
struct CredentialRequest<'a> {
    session_id: &'a str,
    capture_kind: CaptureKind,
    metadata: ReportMetadata<'a>,
}

#[derive(Serialize)]
struct ReportMetadata<'a> {
    note: &'a str,
    content_type: &'a str,
    reported_at: String,
}

#[derive(Deserialize)]
struct CredentialResponse {
    upload_url: String,
}

/// Client for the credential service and the signed upload destination.
pub struct ReportChannel {
    client: reqwest::blocking::Client,
    credential_endpoint: String,
    session_id: String,
}

impl ReportChannel {
    pub fn new(
        credential_endpoint: impl Into<String>,
        session_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Credential(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self {
            client,
            credential_endpoint: credential_endpoint.into(),
            session_id: session_id.into(),
        })
    }

    /// Uploads the failed capture and the operator's note.
    pub fn report(
        &self,
        image_data_url: &str,
        kind: CaptureKind,
        note: &str,
    ) -> Result<(), ReportError> {
        let (content_type, bytes) = decode_data_url(image_data_url)
            .map_err(|e| ReportError::Upload(format!("cannot extract image: {}", e)))?;

        let upload_url = self.request_credential(kind, note, &content_type)?;
        self.upload_blob(&upload_url, &content_type, bytes)?;

        info!(kind = ?kind, "failure report uploaded");
        Ok(())
    }

    fn request_credential(
        &self,
        kind: CaptureKind,
        note: &str,
        content_type: &str,
    ) -> Result<String, ReportError> {
        let request = CredentialRequest {
            session_id: &self.session_id,
            capture_kind: kind,
            metadata: ReportMetadata {
                note,
                content_type,
                reported_at: Utc::now().to_rfc3339(),
            },
        };

        let response = self
            .client
            .post(&self.credential_endpoint)
            .json(&request)
            .send()
            .map_err(|e| ReportError::Credential(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "credential service refused the report");
            return Err(ReportError::Credential(format!(
                "credential service returned {}",
                status
            )));
        }

        let credential: CredentialResponse = response
            .json()
            .map_err(|e| ReportError::Credential(format!("malformed credential: {}", e)))?;
        Ok(credential.upload_url)
    }

    fn upload_blob(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ReportError> {
        let response = self
            .client
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .map_err(|e| ReportError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "blob upload failed");
            return Err(ReportError::Upload(format!(
                "upload destination returned {}",
                status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::encode_data_url;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn image_url() -> String {
        encode_data_url(&[0x89, 0x50, 0x4e, 0x47, 1, 2, 3], "image/png")
    }

    #[test]
    fn test_report_happy_path() {
        let mut server = mockito::Server::new();
        let upload = server
            .mock("PUT", "/blob/abc123")
            .match_header("content-type", "image/png")
            .with_status(200)
            .create();
        let credential = server
            .mock("POST", "/credentials")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"session_id":"sess-1","capture_kind":"resource_scan"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(format!(r#"{{"upload_url":"{}/blob/abc123"}}"#, server.url()))
            .create();

        let channel = ReportChannel::new(
            format!("{}/credentials", server.url()),
            "sess-1",
            TIMEOUT,
        )
        .unwrap();
        channel
            .report(&image_url(), CaptureKind::ResourceScan, "scan came out blank")
            .unwrap();

        credential.assert();
        upload.assert();
    }

    #[test]
    fn test_credential_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/credentials")
            .with_status(403)
            .create();

        let channel = ReportChannel::new(
            format!("{}/credentials", server.url()),
            "sess-1",
            TIMEOUT,
        )
        .unwrap();
        let err = channel
            .report(&image_url(), CaptureKind::ResourceScan, "note")
            .unwrap_err();
        assert!(matches!(err, ReportError::Credential(_)));
    }

    #[test]
    fn test_upload_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/credentials")
            .with_status(200)
            .with_body(format!(r#"{{"upload_url":"{}/blob/x"}}"#, server.url()))
            .create();
        server.mock("PUT", "/blob/x").with_status(500).create();

        let channel = ReportChannel::new(
            format!("{}/credentials", server.url()),
            "sess-1",
            TIMEOUT,
        )
        .unwrap();
        let err = channel
            .report(&image_url(), CaptureKind::OrderConfirmation, "note")
            .unwrap_err();
        assert!(matches!(err, ReportError::Upload(_)));
    }

    #[test]
    fn test_non_data_url_image_is_upload_error() {
        let channel = ReportChannel::new("http://127.0.0.1:1/c", "sess-1", TIMEOUT).unwrap();
        let err = channel
            .report("https://not-a-data-url", CaptureKind::ResourceScan, "note")
            .unwrap_err();
        assert!(matches!(err, ReportError::Upload(_)));
    }
}
