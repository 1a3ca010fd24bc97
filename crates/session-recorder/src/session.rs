// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Session records exchanged between callers, the recorder and the remote session service.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{macros::format_description, OffsetDateTime};

/// Free-form attribute map attached to sessions. Keys keep insertion order on the wire.
pub type Attributes = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub value: String,
}

/// A debug session as sent to and returned by the remote session service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub session_attributes: Attributes,
    #[serde(default)]
    pub resource_attributes: Attributes,
}

impl Session {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Short id, treating an empty string as absent.
    pub fn short_id(&self) -> Option<&str> {
        self.short_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Fills a missing name with one derived from the current UTC time.
    pub(crate) fn ensure_name(&mut self) {
        if self.name.is_none() {
            self.name = Some(default_session_name(OffsetDateTime::now_utc()));
        }
    }
}

/// Body of the plain-session stop call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionRequest {
    #[serde(default)]
    pub session_attributes: Attributes,
}

impl From<Session> for StopSessionRequest {
    fn from(session: Session) -> Self {
        Self {
            session_attributes: session.session_attributes,
        }
    }
}

/// Body returned by the remote-session check endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSessionResponse {
    #[serde(default)]
    pub state: RemoteSessionState,
}

/// Recording state requested by the remote service for a continuous session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteSessionState {
    Start,
    #[default]
    Stop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionType {
    #[default]
    Plain,
    Continuous,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Continuous => "CONTINUOUS",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local recording state. `Paused` exists for wire compatibility only; no transition enters it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    #[default]
    Stopped,
    Started,
    Paused,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Started => "STARTED",
            Self::Paused => "PAUSED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `base` overlaid with `overrides`; on key collision the override wins.
pub fn merge_attributes(base: &Attributes, overrides: &Attributes) -> Attributes {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

pub fn default_session_name(now: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    match now.format(&format) {
        Ok(formatted) => format!("Session on {formatted}"),
        // Formatting a UTC timestamp with a static description cannot fail in practice.
        Err(_) => format!("Session on {}", now.unix_timestamp()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_merge_attributes_override_wins() {
        let base = attrs(json!({"service.name": "api", "env": "prod"}));
        let overrides = attrs(json!({"env": "staging", "host.name": "box"}));
        let merged = merge_attributes(&base, &overrides);
        assert_eq!(
            Value::Object(merged),
            json!({"service.name": "api", "env": "staging", "host.name": "box"})
        );
    }

    #[test]
    fn test_default_session_name() {
        let name = default_session_name(datetime!(2026-03-04 05:06:07 UTC));
        assert_eq!(name, "Session on 2026-03-04 05:06:07 UTC");
    }

    #[test]
    fn test_ensure_name_keeps_existing() {
        let mut session = Session::named("checkout bug");
        session.ensure_name();
        assert_eq!(session.name.as_deref(), Some("checkout bug"));

        let mut unnamed = Session::default();
        unnamed.ensure_name();
        assert!(unnamed.name.unwrap().starts_with("Session on "));
    }

    #[test]
    fn test_empty_short_id_is_absent() {
        let session = Session {
            short_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(session.short_id(), None);
    }

    #[test]
    fn test_session_wire_format() {
        let session = Session {
            name: Some("demo".to_string()),
            tags: vec![Tag {
                key: Some("team".to_string()),
                value: "payments".to_string(),
            }],
            session_attributes: attrs(json!({"user.id": "42"})),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&session).unwrap();
        assert_eq!(
            encoded,
            json!({
                "name": "demo",
                "tags": [{"key": "team", "value": "payments"}],
                "sessionAttributes": {"user.id": "42"},
                "resourceAttributes": {}
            })
        );
    }

    #[test]
    fn test_session_response_ignores_unknown_fields() {
        let session: Session =
            serde_json::from_str(r#"{"_id":"abc","shortId":"0a1b2c3d","name":"x"}"#).unwrap();
        assert_eq!(session.short_id(), Some("0a1b2c3d"));
        assert!(session.tags.is_empty());
    }

    #[test]
    fn test_remote_session_state_parsing() {
        let start: RemoteSessionResponse = serde_json::from_str(r#"{"state":"START"}"#).unwrap();
        assert_eq!(start.state, RemoteSessionState::Start);
        let missing: RemoteSessionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.state, RemoteSessionState::Stop);
    }
}
