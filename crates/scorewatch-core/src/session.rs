//! One polling session: the poller, its call budget, and its stop signal.
//!
//! Exactly one [`PollSession`] exists per process run. Construction
//! validates the configuration, so a bad configuration stops the run before
//! the first tick. Call [`PollSession::control`] before [`PollSession::run`]
//! to get the handle used to stop it.

use std::sync::Arc;

use scorewatch_types::SessionId;
use tracing::{info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::enricher::{Enricher, Summarizer};
use crate::lifecycle::{SessionControl, SessionEndReason};
use crate::limiter::{LimiterStatus, RateLimiter};
use crate::poller::{CycleStats, DisplaySink, Poller, SnapshotSource};

/// Result of a finished session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// Which session this was.
    pub session_id: SessionId,
    /// Why it ended.
    pub end_reason: Option<SessionEndReason>,
    /// Running totals across all cycles.
    pub stats: CycleStats,
    /// Call budget at the moment the loop stopped.
    pub budget: LimiterStatus,
    /// Wall-clock seconds the session ran.
    pub elapsed_seconds: u64,
}

/// Run-scoped aggregate owning the poller, the budget and the stop signal.
pub struct PollSession<S, M, D> {
    id: SessionId,
    poller: Poller<S, M, D>,
    limiter: Arc<RateLimiter>,
    control: Arc<SessionControl>,
}

impl<S, M, D> PollSession<S, M, D>
where
    S: SnapshotSource,
    M: Summarizer,
    D: DisplaySink,
{
    /// Assemble a session.
    ///
    /// `enricher` is ignored when `config.enrichment_enabled` is false.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration is out of range.
    pub fn new(
        config: &EngineConfig,
        source: S,
        enricher: Option<Enricher<M>>,
        sink: D,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let enricher = enricher.filter(|_| config.enrichment_enabled);
        if config.enrichment_enabled && enricher.is_none() {
            warn!("enrichment enabled but no summarizer supplied, showing raw scores only");
        }

        let limiter = Arc::new(RateLimiter::from_config(config));
        let poller = Poller::new(
            source,
            enricher,
            Arc::clone(&limiter),
            sink,
            config.tick_interval(),
            config.enrichment_timeout(),
        );

        Ok(Self {
            id: SessionId::new(),
            poller,
            limiter,
            control: Arc::new(SessionControl::new()),
        })
    }

    /// The session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Handle used to stop the session.
    pub fn control(&self) -> Arc<SessionControl> {
        Arc::clone(&self.control)
    }

    /// Handle to the shared call budget.
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Run until the stop signal fires, then report.
    pub async fn run(mut self) -> SessionResult {
        info!(session_id = %self.id, "poll session starting");

        let stats = self.poller.run(&self.control).await;

        SessionResult {
            session_id: self.id,
            end_reason: self.control.end_reason(),
            stats,
            budget: self.limiter.status(),
            elapsed_seconds: self.control.elapsed_seconds(),
        }
    }
}

/// Log the session end summary.
pub fn log_session_end(result: &SessionResult) {
    info!(
        session_id = %result.session_id,
        reason = ?result.end_reason,
        cycles = result.stats.cycles,
        enriched = result.stats.enriched,
        raw = result.stats.raw,
        failed = result.stats.failed,
        denied = result.stats.denied,
        elapsed_seconds = result.elapsed_seconds,
        "poll session ended"
    );

    if result.stats.cycles == 0 {
        warn!(session_id = %result.session_id, "poll session ended with no cycles executed");
    }
}
