// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! What an HTTP capture layer records on the current span, and how it is masked.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::constants::{
    ATTR_HTTP_REQUEST_BODY, ATTR_HTTP_REQUEST_HEADERS, ATTR_HTTP_RESPONSE_BODY,
    ATTR_HTTP_RESPONSE_HEADERS,
};
use crate::mask::{mask_json, SENSITIVE_FIELDS, SENSITIVE_HEADERS};
use crate::span::CurrentSpan;

const DEFAULT_MAX_PAYLOAD_SIZE_BYTES: usize = 1024 * 1024;

pub type MaskFn = Arc<dyn Fn(&str, &dyn CurrentSpan) -> String + Send + Sync>;

/// How a captured payload is redacted before it lands on the span.
#[derive(Clone)]
pub enum MaskStrategy {
    Disabled,
    /// Selective masking with the given keys; an empty list masks every string.
    Denylist(Arc<[String]>),
    /// Caller-supplied transform, replacing the built-in denylists.
    Custom(MaskFn),
}

impl MaskStrategy {
    pub fn denylist<S: AsRef<str>>(keys: &[S]) -> Self {
        Self::Denylist(keys.iter().map(|key| key.as_ref().to_string()).collect())
    }

    pub fn default_headers() -> Self {
        Self::denylist(SENSITIVE_HEADERS)
    }

    pub fn default_body() -> Self {
        Self::denylist(SENSITIVE_FIELDS)
    }

    pub fn apply(&self, payload: &str, span: &dyn CurrentSpan) -> String {
        match self {
            Self::Disabled => payload.to_string(),
            Self::Denylist(keys) => mask_json(payload, &keys[..]),
            Self::Custom(transform) => transform(payload, span),
        }
    }
}

impl Debug for MaskStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "MaskStrategy::Disabled"),
            Self::Denylist(keys) => write!(f, "MaskStrategy::Denylist({} keys)", keys.len()),
            Self::Custom(_) => write!(f, "MaskStrategy::Custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpCaptureOptions {
    pub capture_headers: bool,
    pub capture_body: bool,
    pub mask_headers: MaskStrategy,
    pub mask_body: MaskStrategy,
    /// Bodies of this size or larger are not captured.
    pub max_payload_size_bytes: usize,
}

impl Default for HttpCaptureOptions {
    fn default() -> Self {
        Self {
            capture_headers: true,
            capture_body: true,
            mask_headers: MaskStrategy::default_headers(),
            mask_body: MaskStrategy::default_body(),
            max_payload_size_bytes: DEFAULT_MAX_PAYLOAD_SIZE_BYTES,
        }
    }
}

impl HttpCaptureOptions {
    pub fn capture_request(
        &self,
        span: &dyn CurrentSpan,
        headers: &BTreeMap<String, String>,
        body: Option<&str>,
    ) {
        self.capture(
            span,
            headers,
            body,
            ATTR_HTTP_REQUEST_HEADERS,
            ATTR_HTTP_REQUEST_BODY,
        );
    }

    pub fn capture_response(
        &self,
        span: &dyn CurrentSpan,
        headers: &BTreeMap<String, String>,
        body: Option<&str>,
    ) {
        self.capture(
            span,
            headers,
            body,
            ATTR_HTTP_RESPONSE_HEADERS,
            ATTR_HTTP_RESPONSE_BODY,
        );
    }

    fn capture(
        &self,
        span: &dyn CurrentSpan,
        headers: &BTreeMap<String, String>,
        body: Option<&str>,
        headers_attribute: &str,
        body_attribute: &str,
    ) {
        if self.capture_headers {
            match serde_json::to_string(headers) {
                Ok(serialized) => span.set_attribute(
                    headers_attribute,
                    Value::String(self.mask_headers.apply(&serialized, span)),
                ),
                Err(e) => debug!("Failed to serialize captured headers: {e}"),
            }
        }

        if !self.capture_body {
            return;
        }
        let Some(body) = body.filter(|body| !body.is_empty()) else {
            return;
        };
        if body.len() >= self.max_payload_size_bytes {
            debug!(
                size = body.len(),
                limit = self.max_payload_size_bytes,
                "Captured body exceeds the payload limit, skipping"
            );
            return;
        }
        span.set_attribute(
            body_attribute,
            Value::String(self.mask_body.apply(body, span)),
        );
    }
}
