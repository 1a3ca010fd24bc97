// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;
use std::sync::Arc;

use crate::constants::SHORT_ID_LENGTH;
use crate::error::RecorderError;

pub type ShortIdGeneratorFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Where a session's short id comes from.
#[derive(Clone, Default)]
pub enum ShortIdSource {
    /// The remote service assigns the short id when the session starts.
    #[default]
    ServerAssigned,
    /// The recorder assigns the short id before calling the remote service.
    Local(ShortIdGeneratorFn),
}

impl ShortIdSource {
    /// Local generation with the built-in random alphanumeric generator.
    pub fn local_random() -> Self {
        Self::Local(Arc::new(|| random_short_id(SHORT_ID_LENGTH)))
    }

    pub fn generate(&self) -> Option<String> {
        match self {
            Self::ServerAssigned => None,
            Self::Local(generator) => Some(generator()),
        }
    }
}

impl Debug for ShortIdSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServerAssigned => write!(f, "ShortIdSource::ServerAssigned"),
            Self::Local(_) => write!(f, "ShortIdSource::Local"),
        }
    }
}

/// Random `[A-Za-z0-9]` string of the given length.
pub fn random_short_id(length: usize) -> String {
    (0..length).map(|_| fastrand::alphanumeric()).collect()
}

/// Checks the length of a caller-supplied short id. The content is not restricted.
pub fn validate_short_id(short_id: &str) -> Result<(), RecorderError> {
    let length = short_id.chars().count();
    if length != SHORT_ID_LENGTH {
        return Err(RecorderError::InvalidShortId {
            short_id: short_id.to_string(),
            reason: format!("expected {SHORT_ID_LENGTH} characters, got {length}"),
        });
    }
    Ok(())
}
