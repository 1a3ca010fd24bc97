// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client for the remote session-management service.
//!
//! The recorder only talks to the [`SessionApi`] trait; [`HttpSessionApi`] is the JSON-over-HTTPS
//! implementation. Calls are never retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::constants::{API_KEY_HEADER, API_PATH_PREFIX};
use crate::error::RecorderError;
use crate::session::{RemoteSessionResponse, Session, StopSessionRequest};

const DEBUG_SESSIONS_PATH: &str = "/debug-sessions";
const CONTINUOUS_DEBUG_SESSIONS_PATH: &str = "/continuous-debug-sessions";
const REMOTE_SESSION_CHECK_PATH: &str = "/remote-debug-session/check";

/// Remote operations backing the session lifecycle.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn start_session(&self, session: &Session) -> Result<Session, RecorderError>;

    async fn stop_session(
        &self,
        short_id: &str,
        request: &StopSessionRequest,
    ) -> Result<(), RecorderError>;

    async fn cancel_session(&self, short_id: &str) -> Result<(), RecorderError>;

    async fn start_continuous_session(&self, session: &Session) -> Result<Session, RecorderError>;

    async fn save_continuous_session(
        &self,
        short_id: &str,
        session: &Session,
    ) -> Result<(), RecorderError>;

    async fn stop_continuous_session(&self, short_id: &str) -> Result<(), RecorderError>;

    async fn check_remote_session(
        &self,
        session: &Session,
    ) -> Result<RemoteSessionResponse, RecorderError>;
}

#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpSessionApi {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        https_proxy: Option<&str>,
    ) -> Result<Self, RecorderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut api_key = HeaderValue::from_str(api_key).map_err(|_| {
            RecorderError::Configuration("Api key is not a valid header value".to_string())
        })?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = https_proxy {
            builder = builder.proxy(reqwest::Proxy::https(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and returns the response text, or `None` for 204 responses.
    async fn send_request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<String>, RecorderError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{API_PATH_PREFIX}{path}", self.base_url);
        debug!(
            method = %method,
            url = %url,
            headers = ?redact_headers(&self.headers),
            "session API request"
        );

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .headers(self.headers.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|body| !body.is_empty());
            debug!(
                method = %method,
                url = %url,
                status = %status,
                body = body.as_deref().unwrap_or_default(),
                "session API error response"
            );
            return Err(RecorderError::RemoteCall { status, body });
        }

        debug!(method = %method, url = %url, status = %status, "session API response");
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}

fn decode<T: DeserializeOwned>(payload: Option<String>) -> Result<T, RecorderError> {
    Ok(serde_json::from_str(payload.as_deref().unwrap_or_default())?)
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn start_session(&self, session: &Session) -> Result<Session, RecorderError> {
        let payload = self
            .send_request(
                Method::POST,
                &format!("{DEBUG_SESSIONS_PATH}/start"),
                Some(session),
            )
            .await?;
        decode(payload)
    }

    async fn stop_session(
        &self,
        short_id: &str,
        request: &StopSessionRequest,
    ) -> Result<(), RecorderError> {
        self.send_request(
            Method::PATCH,
            &format!("{DEBUG_SESSIONS_PATH}/{short_id}/stop"),
            Some(request),
        )
        .await?;
        Ok(())
    }

    async fn cancel_session(&self, short_id: &str) -> Result<(), RecorderError> {
        self.send_request::<()>(
            Method::DELETE,
            &format!("{DEBUG_SESSIONS_PATH}/{short_id}/cancel"),
            None,
        )
        .await?;
        Ok(())
    }

    async fn start_continuous_session(&self, session: &Session) -> Result<Session, RecorderError> {
        let payload = self
            .send_request(
                Method::POST,
                &format!("{CONTINUOUS_DEBUG_SESSIONS_PATH}/start"),
                Some(session),
            )
            .await?;
        decode(payload)
    }

    async fn save_continuous_session(
        &self,
        short_id: &str,
        session: &Session,
    ) -> Result<(), RecorderError> {
        self.send_request(
            Method::POST,
            &format!("{CONTINUOUS_DEBUG_SESSIONS_PATH}/{short_id}/save"),
            Some(session),
        )
        .await?;
        Ok(())
    }

    async fn stop_continuous_session(&self, short_id: &str) -> Result<(), RecorderError> {
        self.send_request::<()>(
            Method::DELETE,
            &format!("{CONTINUOUS_DEBUG_SESSIONS_PATH}/{short_id}/cancel"),
            None,
        )
        .await?;
        Ok(())
    }

    async fn check_remote_session(
        &self,
        session: &Session,
    ) -> Result<RemoteSessionResponse, RecorderError> {
        let payload = self
            .send_request(Method::POST, REMOTE_SESSION_CHECK_PATH, Some(session))
            .await?;
        // An empty answer means no recording is requested.
        match payload.filter(|payload| !payload.trim().is_empty()) {
            Some(payload) => decode(Some(payload)),
            None => Ok(RemoteSessionResponse::default()),
        }
    }
}

fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let display = if value.is_sensitive() || name.as_str().eq_ignore_ascii_case(API_KEY_HEADER)
            {
                "<redacted>".to_string()
            } else {
                value
                    .to_str()
                    .map(str::to_string)
                    .unwrap_or_else(|_| "<non-utf8>".to_string())
            };
            (name.as_str().to_string(), display)
        })
        .collect()
}
