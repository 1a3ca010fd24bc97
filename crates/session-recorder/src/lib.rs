// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Debug-session recording for OpenTelemetry pipelines.
//!
//! While a debug session runs, every new trace id starts with a session prefix followed by the
//! session's short id, so exporters can route that telemetry by prefix match alone. Captured
//! payloads are redacted with the JSON masking engine before they are attached to spans.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod api;
pub mod capture;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod mask;
pub mod recorder;
pub mod sampler;
pub mod session;
pub mod short_id;
pub mod span;
pub mod trace_id;

pub use api::{HttpSessionApi, SessionApi};
pub use capture::{HttpCaptureOptions, MaskStrategy};
pub use config::{RecorderConfig, RecorderSettings};
pub use error::RecorderError;
pub use export::{is_session_trace_id, ExportFilter, HasTraceId};
pub use mask::{mask_json, SENSITIVE_FIELDS, SENSITIVE_HEADERS};
pub use recorder::SessionRecorder;
pub use sampler::{SamplingDecision, TraceIdRatioSampler};
pub use session::{
    Attributes, RemoteSessionResponse, RemoteSessionState, Session, SessionState, SessionType,
    StopSessionRequest, Tag,
};
pub use short_id::ShortIdSource;
pub use span::{CurrentSpan, PayloadAttribute, RecordingSpan};
pub use trace_id::{SessionTraceIdGenerator, TraceId};
