// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::DEFAULT_API_BASE_URL;
use crate::error::RecorderError;
use crate::sampler::TraceIdRatioSampler;
use crate::session::Attributes;
use crate::short_id::ShortIdSource;
use crate::trace_id::SessionTraceIdGenerator;

const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Input of [`SessionRecorder::init`](crate::recorder::SessionRecorder::init).
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Key sent to the session service. Must not be empty.
    pub api_key: String,
    /// Default resource attributes merged under every started session's own.
    pub resource_attributes: Option<Attributes>,
    pub short_id_source: ShortIdSource,
    /// Generator tagged with the active session. Required.
    pub trace_id_generator: Option<Arc<SessionTraceIdGenerator>>,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub https_proxy: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            resource_attributes: None,
            short_id_source: ShortIdSource::default(),
            trace_id_generator: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            https_proxy: None,
        }
    }
}

impl RecorderConfig {
    pub fn new(api_key: impl Into<String>, trace_id_generator: Arc<SessionTraceIdGenerator>) -> Self {
        Self {
            api_key: api_key.into(),
            trace_id_generator: Some(trace_id_generator),
            ..Default::default()
        }
    }
}

/// Process settings read from `MULTIPLAYER_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderSettings {
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// Log level (trace, debug, info, warn or error)
    pub log_level: String,
    /// Fraction of session-less traces tagged with the document prefix
    pub doc_span_ratio: f64,
    /// Whether to poll the session service for remotely started continuous sessions
    pub continuous_session_polling: bool,
    pub poll_interval_secs: u64,
    pub api_timeout_secs: u64,
    pub generate_short_id_locally: bool,
    pub https_proxy: Option<String>,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_level: "info".to_string(),
            doc_span_ratio: 0.0,
            continuous_session_polling: false,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            generate_short_id_locally: false,
            https_proxy: None,
        }
    }
}

impl RecorderSettings {
    pub fn from_env() -> Result<Self, RecorderError> {
        let defaults = Self::default();

        let api_key = env::var("MULTIPLAYER_OTLP_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let api_base_url =
            env::var("MULTIPLAYER_API_BASE_URL").unwrap_or(defaults.api_base_url);
        let log_level = env::var("MULTIPLAYER_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);
        let doc_span_ratio = env::var("MULTIPLAYER_DOC_SPAN_RATIO")
            .ok()
            .and_then(|val| val.trim().parse::<f64>().ok())
            .unwrap_or(defaults.doc_span_ratio);
        let continuous_session_polling = env::var("MULTIPLAYER_CONTINUOUS_SESSION_POLLING")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(defaults.continuous_session_polling);
        let poll_interval_secs = env::var("MULTIPLAYER_CONTINUOUS_SESSION_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.poll_interval_secs);
        let api_timeout_secs = env::var("MULTIPLAYER_API_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.api_timeout_secs);
        let generate_short_id_locally = env::var("MULTIPLAYER_GENERATE_SHORT_ID_LOCALLY")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(defaults.generate_short_id_locally);
        let https_proxy = env::var("MULTIPLAYER_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();

        let settings = Self {
            api_key,
            api_base_url,
            log_level,
            doc_span_ratio,
            continuous_session_polling,
            poll_interval_secs,
            api_timeout_secs,
            generate_short_id_locally,
            https_proxy,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), RecorderError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(RecorderError::Configuration(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        if self.api_base_url.trim().is_empty() {
            return Err(RecorderError::Configuration(
                "MULTIPLAYER_API_BASE_URL cannot be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.doc_span_ratio) {
            return Err(RecorderError::Configuration(format!(
                "MULTIPLAYER_DOC_SPAN_RATIO must be within [0, 1], got {}",
                self.doc_span_ratio
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(RecorderError::Configuration(
                "Continuous session poll interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Trace-id generator for these settings; a zero ratio disables document sampling.
    pub fn trace_id_generator(&self) -> Result<SessionTraceIdGenerator, RecorderError> {
        if self.doc_span_ratio == 0.0 {
            return Ok(SessionTraceIdGenerator::new());
        }
        let sampler = TraceIdRatioSampler::new(self.doc_span_ratio)?;
        Ok(SessionTraceIdGenerator::with_document_sampler(sampler))
    }

    pub fn recorder_config(&self, trace_id_generator: Arc<SessionTraceIdGenerator>) -> RecorderConfig {
        RecorderConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            resource_attributes: None,
            short_id_source: if self.generate_short_id_locally {
                ShortIdSource::local_random()
            } else {
                ShortIdSource::ServerAssigned
            },
            trace_id_generator: Some(trace_id_generator),
            api_base_url: self.api_base_url.clone(),
            api_timeout: Duration::from_secs(self.api_timeout_secs),
            https_proxy: self.https_proxy.clone(),
        }
    }
}
