// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace-id prefix convention used by exporters to route debug-session telemetry.
//!
//! Spans and logs whose trace id starts with a debug-session prefix go to the session backend;
//! everything else goes to the default backend. The OTLP export itself happens elsewhere, this
//! module only decides which records belong where.

use crate::constants::{TRACE_CONTINUOUS_DEBUG_PREFIX_HEX, TRACE_DEBUG_PREFIX_HEX};
use crate::trace_id::TraceId;

/// Case-insensitive match of a hex trace id against the encoded plain and continuous session tags.
pub fn is_session_trace_id(trace_id: &str) -> bool {
    starts_with_ignore_case(trace_id, TRACE_DEBUG_PREFIX_HEX)
        || starts_with_ignore_case(trace_id, TRACE_CONTINUOUS_DEBUG_PREFIX_HEX)
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Telemetry records carrying a trace id.
pub trait HasTraceId {
    fn trace_id(&self) -> Option<TraceId>;
}

/// Which side of the session split an exporter forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFilter {
    /// Only records of a debug session; records without a trace id are dropped.
    SessionOnly,
    /// Everything except debug-session records; records without a trace id are kept.
    ExcludeSessions,
}

impl ExportFilter {
    pub fn should_export(&self, trace_id: Option<&TraceId>) -> bool {
        let in_session = trace_id
            .filter(|id| **id != TraceId::INVALID)
            .is_some_and(TraceId::has_session_prefix);
        match self {
            Self::SessionOnly => in_session,
            Self::ExcludeSessions => !in_session,
        }
    }

    /// Keeps the records this exporter should forward, preserving order.
    pub fn retain<T: HasTraceId>(&self, batch: Vec<T>) -> Vec<T> {
        batch
            .into_iter()
            .filter(|record| self.should_export(record.trace_id().as_ref()))
            .collect()
    }
}
