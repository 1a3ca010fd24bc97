// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Attribute helpers for the span that is current in the caller's telemetry context.
//!
//! The recorder never creates spans. Callers adapt whatever span type their tracing pipeline uses
//! by implementing [`CurrentSpan`].

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::constants::{
    ATTR_CONTINUOUS_SESSION_AUTO_SAVE, ATTR_CONTINUOUS_SESSION_AUTO_SAVE_REASON,
    ATTR_GRPC_REQUEST_MESSAGE, ATTR_GRPC_RESPONSE_MESSAGE, ATTR_HTTP_REQUEST_BODY,
    ATTR_HTTP_REQUEST_HEADERS, ATTR_HTTP_RESPONSE_BODY, ATTR_HTTP_RESPONSE_HEADERS,
    ATTR_MESSAGING_MESSAGE_BODY, ATTR_RPC_REQUEST_MESSAGE, ATTR_RPC_RESPONSE_MESSAGE,
};
use crate::mask::{mask_body, mask_headers};
use crate::trace_id::TraceId;

pub trait CurrentSpan: Send + Sync {
    fn trace_id(&self) -> Option<TraceId>;

    fn set_attribute(&self, key: &str, value: Value);

    /// Marks the span as failed.
    fn set_error(&self, message: &str);
}

/// In-memory span, for pipelines that buffer attributes before handing them to an exporter.
#[derive(Debug, Default)]
pub struct RecordingSpan {
    trace_id: Option<TraceId>,
    attributes: Mutex<BTreeMap<String, Value>>,
    error: Mutex<Option<String>>,
}

impl RecordingSpan {
    pub fn new(trace_id: Option<TraceId>) -> Self {
        Self {
            trace_id,
            ..Default::default()
        }
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn attributes(&self) -> BTreeMap<String, Value> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CurrentSpan for RecordingSpan {
    fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    fn set_attribute(&self, key: &str, value: Value) {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn set_error(&self, message: &str) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }
}

/// Captured payloads and the span attribute each one is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadAttribute {
    HttpRequestBody,
    HttpResponseBody,
    HttpRequestHeaders,
    HttpResponseHeaders,
    MessageBody,
    RpcRequestMessage,
    RpcResponseMessage,
    GrpcRequestMessage,
    GrpcResponseMessage,
}

impl PayloadAttribute {
    pub fn key(&self) -> &'static str {
        match self {
            Self::HttpRequestBody => ATTR_HTTP_REQUEST_BODY,
            Self::HttpResponseBody => ATTR_HTTP_RESPONSE_BODY,
            Self::HttpRequestHeaders => ATTR_HTTP_REQUEST_HEADERS,
            Self::HttpResponseHeaders => ATTR_HTTP_RESPONSE_HEADERS,
            Self::MessageBody => ATTR_MESSAGING_MESSAGE_BODY,
            Self::RpcRequestMessage => ATTR_RPC_REQUEST_MESSAGE,
            Self::RpcResponseMessage => ATTR_RPC_RESPONSE_MESSAGE,
            Self::GrpcRequestMessage => ATTR_GRPC_REQUEST_MESSAGE,
            Self::GrpcResponseMessage => ATTR_GRPC_RESPONSE_MESSAGE,
        }
    }

    pub fn is_headers(&self) -> bool {
        matches!(self, Self::HttpRequestHeaders | Self::HttpResponseHeaders)
    }
}

/// Writes a captured payload to the span, masked with the default denylist when `mask` is set.
pub fn set_payload(span: &dyn CurrentSpan, attribute: PayloadAttribute, payload: &str, mask: bool) {
    let payload = match (mask, attribute.is_headers()) {
        (false, _) => payload.to_string(),
        (true, true) => mask_headers(payload),
        (true, false) => mask_body(payload),
    };
    span.set_attribute(attribute.key(), Value::String(payload));
}

pub fn set_attribute(span: Option<&dyn CurrentSpan>, key: &str, value: Value) {
    if let Some(span) = span {
        span.set_attribute(key, value);
    }
}

/// Records an error on the span.
pub fn capture_exception(span: Option<&dyn CurrentSpan>, error: &dyn std::error::Error) {
    let Some(span) = span else {
        return;
    };
    let message = error.to_string();
    span.set_attribute("exception.message", Value::String(message.clone()));
    span.set_error(&message);
}

/// Marks the span as an auto-save checkpoint of the running continuous session.
pub fn save_continuous_session(span: Option<&dyn CurrentSpan>, reason: Option<&str>) {
    let Some(span) = span else {
        return;
    };
    span.set_attribute(ATTR_CONTINUOUS_SESSION_AUTO_SAVE, Value::Bool(true));
    if let Some(reason) = reason.filter(|reason| !reason.is_empty()) {
        span.set_attribute(
            ATTR_CONTINUOUS_SESSION_AUTO_SAVE_REASON,
            Value::String(reason.to_string()),
        );
    }
}
