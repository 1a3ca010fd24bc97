// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire-level constants shared with exporters and the remote session service.

/// Default base URL of the remote session-management service.
pub const DEFAULT_API_BASE_URL: &str = "https://api.multiplayer.app";

/// Path prefix under which every session-management endpoint lives.
pub const API_PATH_PREFIX: &str = "/v0/radar";

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Length of a debug session short id.
pub const SHORT_ID_LENGTH: usize = 8;

/// Trace-id prefix (hex form) applied to the document-sampled fraction of traffic.
pub const TRACE_DOC_PREFIX: &str = "d0cd0c";

/// Session tag of a plain debug session, written as raw bytes at the start of its trace ids.
pub const TRACE_DEBUG_PREFIX: &str = "debdeb";

/// Session tag of a continuous debug session, written as raw bytes at the start of its trace ids.
pub const TRACE_CONTINUOUS_DEBUG_PREFIX: &str = "cdbcdb";

/// Hex form of [`TRACE_DEBUG_PREFIX`] as it appears at the start of a hex trace id.
pub const TRACE_DEBUG_PREFIX_HEX: &str = "646562646562";

/// Hex form of [`TRACE_CONTINUOUS_DEBUG_PREFIX`] as it appears at the start of a hex trace id.
pub const TRACE_CONTINUOUS_DEBUG_PREFIX_HEX: &str = "636462636462";

/// Replacement written over masked values.
pub const MASK_PLACEHOLDER: &str = "***MASKED***";

/// Version of this crate, reported as a default resource attribute.
pub const SESSION_RECORDER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ATTR_SESSION_RECORDER_VERSION: &str = "multiplayer.session-recorder.version";
pub const ATTR_WORKSPACE_ID: &str = "multiplayer.workspace.id";
pub const ATTR_PROJECT_ID: &str = "multiplayer.project.id";
pub const ATTR_PLATFORM_ID: &str = "multiplayer.platform.id";
pub const ATTR_PLATFORM_NAME: &str = "multiplayer.platform.name";
pub const ATTR_CLIENT_ID: &str = "multiplayer.client.id";
pub const ATTR_INTEGRATION_ID: &str = "multiplayer.integration.id";
pub const ATTR_SESSION_ID: &str = "multiplayer.session.id";
pub const ATTR_CONTINUOUS_SESSION_AUTO_SAVE: &str = "multiplayer.session.auto-save";
pub const ATTR_CONTINUOUS_SESSION_AUTO_SAVE_REASON: &str = "multiplayer.session.auto-save.reason";
pub const ATTR_HTTP_REQUEST_BODY: &str = "multiplayer.http.request.body";
pub const ATTR_HTTP_RESPONSE_BODY: &str = "multiplayer.http.response.body";
pub const ATTR_HTTP_REQUEST_HEADERS: &str = "multiplayer.http.request.headers";
pub const ATTR_HTTP_RESPONSE_HEADERS: &str = "multiplayer.http.response.headers";
pub const ATTR_HTTP_RESPONSE_BODY_ENCODING: &str = "multiplayer.http.response.body.encoding";
pub const ATTR_RPC_REQUEST_MESSAGE: &str = "multiplayer.rpc.request.message";
pub const ATTR_RPC_RESPONSE_MESSAGE: &str = "multiplayer.rpc.response.message";
pub const ATTR_GRPC_REQUEST_MESSAGE: &str = "multiplayer.rpc.grpc.request.message";
pub const ATTR_GRPC_RESPONSE_MESSAGE: &str = "multiplayer.rpc.grpc.response.message";
pub const ATTR_MESSAGING_MESSAGE_BODY: &str = "multiplayer.messaging.message.body";
