//! Live cricket score monitor.
//!
//! Follows one live match, printing a frame every poll cycle. With
//! commentary enabled, cycles that fit inside the call budget send the
//! scorecard to an LLM and print its summary instead of the bare score.
//!
//! # Architecture
//!
//! ```text
//! Cricbuzz page --> Snapshot --> budget check --> LLM summary? --> console
//! ```
//!
//! Startup problems (bad configuration, no live matches, missing API key)
//! end the process. Once the session runs, only Ctrl-C or SIGTERM stops it.

mod config;
mod error;
mod llm;
mod render;
mod scrape;
mod select;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use scorewatch_core::enricher::{Enricher, PromptBuilder};
use scorewatch_core::lifecycle::{SessionControl, SessionEndReason};
use scorewatch_core::session::{PollSession, log_session_end};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::llm::{LlmBackend, create_backend};
use crate::render::ConsoleRenderer;
use crate::scrape::CricbuzzSource;

/// Application entry point.
///
/// Initializes logging, loads configuration, resolves the match and the
/// commentary choice, then polls until stopped.
///
/// # Errors
///
/// Returns an error if any startup step fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with score frames.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("scorewatch starting");

    let mut config = RunnerConfig::from_env().context("loading configuration")?;
    info!(
        base_url = config.base_url,
        tick_interval_ms = config.engine.tick_interval_ms,
        acquire_threshold = config.engine.acquire_threshold,
        reset_delay_ms = config.engine.reset_delay_ms,
        "configuration loaded"
    );

    let scrape_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("building HTTP client")?;

    let chosen = select::resolve_match(&config, &scrape_client).await?;
    info!(title = chosen.title, link = chosen.link, "match selected");

    let enrich = select::resolve_enrichment(config.enrichment_choice).await?;
    config.engine.enrichment_enabled = enrich;

    let enricher = if enrich {
        Some(build_enricher(&config)?)
    } else {
        info!("commentary disabled, showing raw scores");
        None
    };

    let source = CricbuzzSource::new(scrape_client, &config.base_url, &chosen.link);
    info!(url = source.url(), "polling scorecard");
    let session = PollSession::new(&config.engine, source, enricher, ConsoleRenderer::stdout())
        .context("creating poll session")?;

    spawn_stop_listener(session.control());

    let result = session.run().await;
    log_session_end(&result);

    Ok(())
}

/// Build the prompt renderer and summarizer backend.
fn build_enricher(config: &RunnerConfig) -> Result<Enricher<LlmBackend>, RunnerError> {
    let backend_config = config.require_backend()?;

    let prompts = match &config.prompt_template_path {
        Some(path) => {
            info!(path, "loading prompt template override");
            PromptBuilder::from_file(Path::new(path))?
        }
        None => PromptBuilder::new()?,
    };

    // Summarizer deadlines come from the engine, not the HTTP client.
    let backend = create_backend(reqwest::Client::new(), backend_config);
    info!(
        backend = backend.name(),
        model = backend.model(),
        max_tokens = backend_config.max_tokens,
        "commentary backend configured"
    );

    Ok(Enricher::new(prompts, backend))
}

/// Fire the stop signal on Ctrl-C or SIGTERM.
fn spawn_stop_listener(control: Arc<SessionControl>) {
    tokio::spawn(async move {
        let reason = wait_for_stop().await;
        info!(?reason, "stop requested, finishing current cycle");
        control.request_stop(reason);
    });
}

#[cfg(unix)]
async fn wait_for_stop() -> SessionEndReason {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                () = ctrl_c() => SessionEndReason::OperatorStop,
                _ = term.recv() => SessionEndReason::Signal,
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl-C only");
            ctrl_c().await;
            SessionEndReason::OperatorStop
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_stop() -> SessionEndReason {
    ctrl_c().await;
    SessionEndReason::OperatorStop
}

/// Resolve on Ctrl-C. If the handler cannot be installed, never resolve.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}
