// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace identifiers tagged with the active debug session.
//!
//! While a session is active every generated trace id starts with the raw bytes of
//! `session tag ⧺ short id`. Exporters recognise session telemetry by the hex form of the tag
//! alone, see [`crate::export::is_session_trace_id`].
//! Without a session the id is random, except for the fraction of traffic picked by the optional
//! document sampler, which gets [`TRACE_DOC_PREFIX`].

use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::constants::{TRACE_CONTINUOUS_DEBUG_PREFIX, TRACE_DEBUG_PREFIX, TRACE_DOC_PREFIX};
use crate::sampler::{SamplingDecision, TraceIdRatioSampler};
use crate::session::SessionType;

/// 128-bit trace identifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

impl TraceId {
    pub const INVALID: TraceId = TraceId([0; 16]);

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Uniformly random id. Trace ids carry no secrecy requirement.
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        fastrand::fill(&mut bytes);
        Self(bytes)
    }

    /// Last 8 bytes read as a big-endian signed integer.
    pub fn lower_i64(&self) -> i64 {
        let mut lower = [0u8; 8];
        lower.copy_from_slice(&self.0[8..]);
        i64::from_be_bytes(lower)
    }

    pub fn to_hex(&self) -> String {
        format!("{:032x}", u128::from_be_bytes(self.0))
    }

    /// True when the id belongs to a plain or continuous debug session.
    pub fn has_session_prefix(&self) -> bool {
        self.0.starts_with(TRACE_DEBUG_PREFIX.as_bytes())
            || self.0.starts_with(TRACE_CONTINUOUS_DEBUG_PREFIX.as_bytes())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({self})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trace id {0:?}: expected 32 hexadecimal characters")]
pub struct ParseTraceIdError(String);

impl FromStr for TraceId {
    type Err = ParseTraceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ParseTraceIdError(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(|value| Self(value.to_be_bytes()))
            .map_err(|_| ParseTraceIdError(s.to_string()))
    }
}

/// Bytes written over the start of a trace id, at most the id's 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BytePrefix(Vec<u8>);

impl BytePrefix {
    /// Raw bytes of `tag ⧺ short_id`.
    fn session(session_type: SessionType, short_id: &str) -> Self {
        let mut bytes = Vec::with_capacity(session_prefix(session_type).len() + short_id.len());
        bytes.extend_from_slice(session_prefix(session_type).as_bytes());
        bytes.extend_from_slice(short_id.as_bytes());
        bytes.truncate(16);
        Self(bytes)
    }

    /// Decodes hex text pairwise; a trailing odd digit is ignored.
    fn from_hex(prefix: &str) -> Self {
        let digits: Vec<u8> = prefix
            .chars()
            .filter_map(|ch| ch.to_digit(16))
            .map(|digit| digit as u8)
            .collect();
        Self(
            digits
                .chunks_exact(2)
                .map(|pair| (pair[0] << 4) | pair[1])
                .take(16)
                .collect(),
        )
    }

    /// Overwrites the leading bytes; bytes past the prefix keep their random value.
    fn apply(&self, bytes: &mut [u8; 16]) {
        bytes[..self.0.len()].copy_from_slice(&self.0);
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    short_id: String,
    session_type: SessionType,
    prefix: BytePrefix,
}

/// Session tag written, as raw bytes, at the start of trace ids of the given session type.
pub fn session_prefix(session_type: SessionType) -> &'static str {
    match session_type {
        SessionType::Continuous => TRACE_CONTINUOUS_DEBUG_PREFIX,
        SessionType::Plain => TRACE_DEBUG_PREFIX,
    }
}

/// Generates trace ids, tagging them with the active debug session.
///
/// The session context is written by the recorder and read on every id generation, so readers
/// never wait on a remote call.
#[derive(Debug)]
pub struct SessionTraceIdGenerator {
    session: RwLock<Option<ActiveSession>>,
    doc_sampler: Option<TraceIdRatioSampler>,
    doc_prefix: BytePrefix,
}

impl Default for SessionTraceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTraceIdGenerator {
    pub fn new() -> Self {
        Self {
            session: RwLock::new(None),
            doc_sampler: None,
            doc_prefix: BytePrefix::from_hex(TRACE_DOC_PREFIX),
        }
    }

    /// Generator that also marks the fraction of session-less traffic picked by `sampler`.
    pub fn with_document_sampler(sampler: TraceIdRatioSampler) -> Self {
        Self {
            doc_sampler: Some(sampler),
            ..Self::new()
        }
    }

    /// Tags subsequent trace ids with `short_id`. An empty short id clears the session context.
    ///
    /// Any short id is accepted; it is truncated where `tag ⧺ short_id` passes 16 bytes.
    pub fn set_session_id(&self, short_id: &str, session_type: SessionType) {
        if short_id.is_empty() {
            self.clear_session();
            return;
        }

        debug!(short_id, %session_type, "Tagging trace ids with debug session");
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(ActiveSession {
            short_id: short_id.to_string(),
            session_type,
            prefix: BytePrefix::session(session_type, short_id),
        });
    }

    pub fn clear_session(&self) {
        let previous = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            debug!(short_id = %previous.short_id, "Stopped tagging trace ids");
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.short_id.clone())
    }

    pub fn session_type(&self) -> Option<SessionType> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.session_type)
    }

    pub fn generate_trace_id(&self) -> TraceId {
        let mut bytes = TraceId::random().to_bytes();

        let guard = self.session.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = guard.as_ref() {
            session.prefix.apply(&mut bytes);
            return TraceId::from_bytes(bytes);
        }
        drop(guard);

        if let Some(sampler) = &self.doc_sampler {
            if sampler.should_sample_ratio(&TraceId::from_bytes(bytes))
                == SamplingDecision::RecordAndSample
            {
                self.doc_prefix.apply(&mut bytes);
            }
        }
        TraceId::from_bytes(bytes)
    }
}
