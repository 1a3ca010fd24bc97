// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;

use anyhow::Context;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use session_recorder::{RecorderSettings, SessionRecorder, SessionState};

#[tokio::main]
pub async fn main() {
    let settings = match RecorderSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            // Logging is not up yet.
            eprintln!("Error reading session recorder settings: {e}");
            return;
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", settings.log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    if let Err(e) = run(settings).await {
        error!("Session recorder agent stopped: {e:#}");
    }
}

async fn run(settings: RecorderSettings) -> anyhow::Result<()> {
    let generator = Arc::new(
        settings
            .trace_id_generator()
            .context("Error creating the trace id generator")?,
    );
    let recorder = SessionRecorder::global();
    recorder
        .init(settings.recorder_config(Arc::clone(&generator)))
        .await
        .context("Error initializing the session recorder")?;
    info!(
        api_base_url = %settings.api_base_url,
        doc_span_ratio = settings.doc_span_ratio,
        "Session recorder ready"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for the shutdown signal: {e}");
        }
        signal_token.cancel();
    });

    if settings.continuous_session_polling {
        info!(
            interval_secs = settings.poll_interval_secs,
            "Polling for remotely started continuous sessions"
        );
        poll_continuous_session(recorder, &settings, &shutdown).await;
    } else {
        shutdown.cancelled().await;
    }

    // The shutdown token is already canceled, the final call gets a fresh one.
    if recorder.state().await != SessionState::Stopped {
        recorder
            .cancel(&CancellationToken::new())
            .await
            .context("Error canceling the active debug session on shutdown")?;
    }
    info!("Session recorder agent shut down");
    Ok(())
}

async fn poll_continuous_session(
    recorder: &SessionRecorder,
    settings: &RecorderSettings,
    shutdown: &CancellationToken,
) {
    let mut poll_interval = interval(settings.poll_interval());

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = poll_interval.tick() => {}
        }

        match recorder
            .check_remote_continuous_session(None, shutdown)
            .await
        {
            Ok(state) => debug!(?state, "Continuous session check completed"),
            Err(e) => error!("Continuous session check failed: {e}"),
        }
    }
}
