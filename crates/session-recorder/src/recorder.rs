// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Debug-session lifecycle.
//!
//! [`SessionRecorder`] owns the local session state and is the only writer of the trace-id
//! generator's session context. Every transition runs under one async mutex, covering the state
//! check, the remote call and the state update, so two concurrent starts can never both proceed.
//!
//! ```text
//! STOPPED --start--> STARTED --stop (plain)----> STOPPED
//!                    STARTED --cancel----------> STOPPED
//!                    STARTED --save (continuous)-> STARTED
//! ```
//!
//! A remote call that fails or is canceled leaves the state untouched.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{HttpSessionApi, SessionApi};
use crate::config::RecorderConfig;
use crate::constants::{ATTR_SESSION_RECORDER_VERSION, SESSION_RECORDER_VERSION};
use crate::error::RecorderError;
use crate::session::{
    merge_attributes, Attributes, RemoteSessionState, Session, SessionState, SessionType,
    StopSessionRequest,
};
use crate::short_id::{validate_short_id, ShortIdSource};
use crate::span::{save_continuous_session, CurrentSpan};
use crate::trace_id::SessionTraceIdGenerator;

static GLOBAL_RECORDER: OnceLock<SessionRecorder> = OnceLock::new();

#[derive(Clone)]
struct Configured {
    api: Arc<dyn SessionApi>,
    generator: Arc<SessionTraceIdGenerator>,
    resource_attributes: Attributes,
    short_id_source: ShortIdSource,
}

#[derive(Default)]
struct Inner {
    configured: Option<Configured>,
    session_type: SessionType,
    state: SessionState,
    short_id: Option<String>,
}

#[derive(Default)]
pub struct SessionRecorder {
    inner: Mutex<Inner>,
}

impl SessionRecorder {
    /// A standalone recorder. Most processes use [`SessionRecorder::global`] instead.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide recorder, created on first access.
    pub fn global() -> &'static SessionRecorder {
        GLOBAL_RECORDER.get_or_init(SessionRecorder::new)
    }

    /// Configures the recorder with the HTTP session client. Calling it again reconfigures.
    pub async fn init(&self, config: RecorderConfig) -> Result<(), RecorderError> {
        check_config(&config)?;
        let api = HttpSessionApi::new(
            &config.api_base_url,
            &config.api_key,
            config.api_timeout,
            config.https_proxy.as_deref(),
        )?;
        self.init_with_api(config, Arc::new(api)).await
    }

    /// Like [`SessionRecorder::init`], with a caller-supplied session client.
    pub async fn init_with_api(
        &self,
        config: RecorderConfig,
        api: Arc<dyn SessionApi>,
    ) -> Result<(), RecorderError> {
        let generator = check_config(&config)?;
        let resource_attributes = config
            .resource_attributes
            .unwrap_or_else(default_resource_attributes);

        let mut inner = self.inner.lock().await;
        // A session that is already running keeps tagging through the new generator only.
        if let (SessionState::Started, Some(short_id)) = (inner.state, inner.short_id.as_deref()) {
            generator.set_session_id(short_id, inner.session_type);
        }
        if let Some(previous) = &inner.configured {
            if !Arc::ptr_eq(&previous.generator, &generator) {
                previous.generator.clear_session();
            }
        }
        inner.configured = Some(Configured {
            api,
            generator,
            resource_attributes,
            short_id_source: config.short_id_source,
        });
        info!("Session recorder initialized");
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.lock().await.configured.is_some()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn session_type(&self) -> SessionType {
        self.inner.lock().await.session_type
    }

    pub async fn short_id(&self) -> Option<String> {
        self.inner.lock().await.short_id.clone()
    }

    pub async fn start(
        &self,
        session_type: SessionType,
        session: Option<Session>,
        cancel: &CancellationToken,
    ) -> Result<(), RecorderError> {
        self.inner
            .lock()
            .await
            .start(session_type, session, cancel)
            .await
    }

    /// Checkpoints the running continuous session on the session service.
    pub async fn save(
        &self,
        session: Option<Session>,
        cancel: &CancellationToken,
    ) -> Result<(), RecorderError> {
        let inner = self.inner.lock().await;
        let configured = inner.configured()?.clone();
        let short_id = inner.require_continuous()?;

        let mut session = session.unwrap_or_default();
        session.ensure_name();
        session.resource_attributes = merge_attributes(
            &configured.resource_attributes,
            &session.resource_attributes,
        );
        run_cancelable(
            cancel,
            configured.api.save_continuous_session(&short_id, &session),
        )
        .await?;
        info!(short_id = %short_id, "Continuous debug session saved");
        Ok(())
    }

    /// Marks `span` as an auto-save point of the running continuous session.
    ///
    /// Nothing is sent to the session service; the exporter picks the marker up with the span.
    pub async fn save_reason(
        &self,
        span: Option<&dyn CurrentSpan>,
        reason: Option<&str>,
    ) -> Result<(), RecorderError> {
        let inner = self.inner.lock().await;
        inner.configured()?;
        inner.require_continuous()?;
        save_continuous_session(span, reason);
        Ok(())
    }

    pub async fn stop(
        &self,
        session: Option<Session>,
        cancel: &CancellationToken,
    ) -> Result<(), RecorderError> {
        self.inner.lock().await.stop(session, cancel).await
    }

    pub async fn cancel(&self, cancel: &CancellationToken) -> Result<(), RecorderError> {
        self.inner.lock().await.cancel(cancel).await
    }

    /// Asks the session service whether a continuous session should be recording and reconciles
    /// the local state with the answer. Returns the state the service asked for.
    pub async fn check_remote_continuous_session(
        &self,
        session: Option<Session>,
        cancel: &CancellationToken,
    ) -> Result<RemoteSessionState, RecorderError> {
        let mut inner = self.inner.lock().await;
        let configured = inner.configured()?.clone();

        let mut session = session.unwrap_or_default();
        session.resource_attributes = merge_attributes(
            &configured.resource_attributes,
            &session.resource_attributes,
        );
        let response =
            run_cancelable(cancel, configured.api.check_remote_session(&session)).await?;
        debug!(state = ?response.state, local = %inner.state, "Remote continuous session check");

        match response.state {
            RemoteSessionState::Start if inner.state != SessionState::Started => {
                inner
                    .start(SessionType::Continuous, Some(session), cancel)
                    .await?;
            }
            RemoteSessionState::Stop if inner.state != SessionState::Stopped => {
                match inner.session_type {
                    SessionType::Continuous => inner.cancel(cancel).await?,
                    SessionType::Plain => inner.stop(None, cancel).await?,
                }
            }
            _ => {}
        }
        Ok(response.state)
    }
}

impl Inner {
    fn configured(&self) -> Result<&Configured, RecorderError> {
        self.configured.as_ref().ok_or(RecorderError::NotInitialized)
    }

    fn require_active(&self) -> Result<String, RecorderError> {
        match (self.state, self.short_id.as_ref()) {
            (SessionState::Stopped, _) | (_, None) => Err(RecorderError::InvalidState(
                "No debug session is running".to_string(),
            )),
            (_, Some(short_id)) => Ok(short_id.clone()),
        }
    }

    fn require_continuous(&self) -> Result<String, RecorderError> {
        let short_id = self.require_active()?;
        if self.session_type != SessionType::Continuous {
            return Err(RecorderError::InvalidSessionType {
                expected: SessionType::Continuous.as_str(),
                actual: self.session_type.as_str(),
            });
        }
        Ok(short_id)
    }

    async fn start(
        &mut self,
        session_type: SessionType,
        session: Option<Session>,
        cancel: &CancellationToken,
    ) -> Result<(), RecorderError> {
        let configured = self.configured()?.clone();
        if self.state != SessionState::Stopped {
            warn!(state = %self.state, "Rejected debug session start");
            return Err(RecorderError::InvalidState(format!(
                "Cannot start a debug session while one is {}",
                self.state
            )));
        }

        let mut session = session.unwrap_or_default();
        match session.short_id() {
            Some(short_id) => validate_short_id(short_id)?,
            None => {
                session.short_id = configured.short_id_source.generate();
                if let Some(short_id) = session.short_id.as_deref() {
                    validate_short_id(short_id)?;
                }
            }
        }
        session.ensure_name();
        session.resource_attributes = merge_attributes(
            &configured.resource_attributes,
            &session.resource_attributes,
        );

        let call = match session_type {
            SessionType::Plain => configured.api.start_session(&session),
            SessionType::Continuous => configured.api.start_continuous_session(&session),
        };
        let started = run_cancelable(cancel, call).await?;

        let short_id = started
            .short_id()
            .or_else(|| session.short_id())
            .map(str::to_string)
            .ok_or_else(|| RecorderError::InvalidShortId {
                short_id: String::new(),
                reason: "the session service returned no short id".to_string(),
            })?;
        configured.generator.set_session_id(&short_id, session_type);

        self.session_type = session_type;
        self.state = SessionState::Started;
        info!(short_id = %short_id, %session_type, "Debug session started");
        self.short_id = Some(short_id);
        Ok(())
    }

    async fn stop(
        &mut self,
        session: Option<Session>,
        cancel: &CancellationToken,
    ) -> Result<(), RecorderError> {
        let configured = self.configured()?.clone();
        let short_id = self.require_active()?;
        if self.session_type != SessionType::Plain {
            return Err(RecorderError::InvalidSessionType {
                expected: SessionType::Plain.as_str(),
                actual: self.session_type.as_str(),
            });
        }

        let request = StopSessionRequest::from(session.unwrap_or_default());
        run_cancelable(cancel, configured.api.stop_session(&short_id, &request)).await?;

        self.reset(&configured.generator);
        info!(short_id = %short_id, "Debug session stopped");
        Ok(())
    }

    async fn cancel(&mut self, cancel: &CancellationToken) -> Result<(), RecorderError> {
        let configured = self.configured()?.clone();
        let short_id = self.require_active()?;

        let call = match self.session_type {
            SessionType::Continuous => configured.api.stop_continuous_session(&short_id),
            SessionType::Plain => configured.api.cancel_session(&short_id),
        };
        run_cancelable(cancel, call).await?;

        self.reset(&configured.generator);
        info!(short_id = %short_id, session_type = %self.session_type, "Debug session canceled");
        Ok(())
    }

    fn reset(&mut self, generator: &SessionTraceIdGenerator) {
        generator.clear_session();
        self.state = SessionState::Stopped;
        self.short_id = None;
    }
}

fn check_config(config: &RecorderConfig) -> Result<Arc<SessionTraceIdGenerator>, RecorderError> {
    if config.api_key.trim().is_empty() {
        return Err(RecorderError::Configuration(
            "Api key not provided".to_string(),
        ));
    }
    config.trace_id_generator.clone().ok_or_else(|| {
        RecorderError::Configuration("Trace id generator not provided".to_string())
    })
}

fn default_resource_attributes() -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        ATTR_SESSION_RECORDER_VERSION.to_string(),
        Value::String(SESSION_RECORDER_VERSION.to_string()),
    );
    attributes
}

async fn run_cancelable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, RecorderError>>,
) -> Result<T, RecorderError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("Session service call canceled");
            Err(RecorderError::Canceled)
        }
        result = call => result,
    }
}
