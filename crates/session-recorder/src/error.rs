// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors surfaced by the session recorder.
///
/// None of these are retried internally. Lifecycle operations that fail leave the recorder in the
/// state it was in before the call.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Configuration not initialized. Call init() before performing any actions.")]
    NotInitialized,

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Invalid session type: expected {expected}, session is {actual}")]
    InvalidSessionType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid short session id {short_id:?}: {reason}")]
    InvalidShortId { short_id: String, reason: String },

    #[error("Network response was not ok: {status}")]
    RemoteCall {
        status: StatusCode,
        body: Option<String>,
    },

    #[error("Request aborted")]
    Canceled,

    #[error("Probability must be within [0, 1], got {0}")]
    Range(f64),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RecorderError {
    /// Response body returned alongside a non-success status, if the remote service sent one.
    pub fn remote_body(&self) -> Option<&str> {
        match self {
            Self::RemoteCall { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}
