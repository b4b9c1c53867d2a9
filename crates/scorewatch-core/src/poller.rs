//! The tick loop and the per-cycle routing decision.
//!
//! Each cycle runs strictly in order:
//!
//! ```text
//! fetch snapshot --> budget check --> (summarize | pass-through) --> display
//! ```
//!
//! Cycles never overlap. A cycle that outlasts the interval delays the next
//! tick instead of queueing one, so slow fetches and slow summaries push the
//! cadence back rather than piling up. The stop signal is only observed
//! between cycles.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scorewatch_types::{DisplayEvent, Snapshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, info, warn};

use crate::enricher::{Enricher, SummarizeError, Summarizer};
use crate::lifecycle::SessionControl;
use crate::limiter::RateLimiter;

/// Smallest interval the ticker accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Produces a fresh snapshot on demand.
///
/// Fetching never fails from the engine's point of view: an implementation
/// that cannot reach its feed returns [`Snapshot::empty`].
pub trait SnapshotSource {
    /// Fetch the current snapshot.
    fn fetch_snapshot(&self) -> impl Future<Output = Snapshot> + Send;
}

/// Receives the display event at the end of every cycle.
pub trait DisplaySink {
    /// Called exactly once per cycle, synchronously.
    fn on_display(&mut self, event: &DisplayEvent);
}

/// Running totals across all cycles of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Cycles completed.
    pub cycles: u64,
    /// Cycles that displayed a summary.
    pub enriched: u64,
    /// Cycles that displayed the raw score by routing (disabled or denied).
    pub raw: u64,
    /// Cycles whose enrichment attempt failed.
    pub failed: u64,
    /// Cycles where the call budget denied enrichment.
    pub denied: u64,
}

impl CycleStats {
    fn record(&mut self, event: &DisplayEvent, denied: bool) {
        self.cycles = self.cycles.saturating_add(1);
        if denied {
            self.denied = self.denied.saturating_add(1);
        }
        match event {
            DisplayEvent::Raw { .. } => self.raw = self.raw.saturating_add(1),
            DisplayEvent::Enriched { .. } => self.enriched = self.enriched.saturating_add(1),
            DisplayEvent::EnrichmentFailed { .. } => self.failed = self.failed.saturating_add(1),
        }
    }
}

/// Drives the recurring poll cycle.
pub struct Poller<S, M, D> {
    source: S,
    /// `None` when enrichment is turned off; the budget is then never
    /// consulted.
    enricher: Option<Enricher<M>>,
    limiter: Arc<RateLimiter>,
    sink: D,
    interval: Duration,
    enrichment_timeout: Duration,
    stats: CycleStats,
}

impl<S, M, D> Poller<S, M, D>
where
    S: SnapshotSource,
    M: Summarizer,
    D: DisplaySink,
{
    /// Create a poller.
    pub const fn new(
        source: S,
        enricher: Option<Enricher<M>>,
        limiter: Arc<RateLimiter>,
        sink: D,
        interval: Duration,
        enrichment_timeout: Duration,
    ) -> Self {
        Self {
            source,
            enricher,
            limiter,
            sink,
            interval,
            enrichment_timeout,
            stats: CycleStats {
                cycles: 0,
                enriched: 0,
                raw: 0,
                failed: 0,
                denied: 0,
            },
        }
    }

    /// Run cycles until `control` is stopped.
    ///
    /// The first cycle starts one interval after the call. Returns the
    /// running totals.
    pub async fn run(&mut self, control: &SessionControl) -> CycleStats {
        let period = self.interval.max(MIN_INTERVAL);
        let first_tick = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
        let mut ticker = interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = period.as_millis(),
            enrichment = self.enricher.is_some(),
            threshold = self.limiter.threshold(),
            window_ms = self.limiter.reset_delay().as_millis(),
            "poll loop starting"
        );

        loop {
            tokio::select! {
                biased;
                () = control.stopped() => break,
                _ = ticker.tick() => {}
            }

            self.run_cycle().await;
        }

        info!(cycles = self.stats.cycles, "poll loop stopped");
        self.stats
    }

    /// Perform one full cycle immediately, without waiting for a tick.
    ///
    /// Fetches a snapshot, consults the budget (only when enrichment is on),
    /// either summarizes or passes the score through, hands the event to the
    /// sink and updates the totals. A summarizer failure falls back to the
    /// raw score for this cycle only; the grant it consumed is not returned.
    pub async fn run_cycle(&mut self) -> DisplayEvent {
        let cycle = self.stats.cycles.saturating_add(1);
        let (event, denied) = self.route(cycle).await;
        self.sink.on_display(&event);
        self.stats.record(&event, denied);

        debug!(cycle = cycle, event = event.kind(), "cycle complete");
        event
    }

    /// Fetch and decide what to show. The flag is set when the budget
    /// denied enrichment.
    async fn route(&self, cycle: u64) -> (DisplayEvent, bool) {
        let snapshot = self.source.fetch_snapshot().await;
        if snapshot.is_empty() {
            debug!(cycle = cycle, "snapshot is empty, displaying as-is");
        }

        let Some(enricher) = &self.enricher else {
            let event = DisplayEvent::Raw {
                score: snapshot.score,
            };
            return (event, false);
        };

        if !self.limiter.try_acquire() {
            debug!(
                cycle = cycle,
                threshold = self.limiter.threshold(),
                "call budget spent, displaying raw score"
            );
            let event = DisplayEvent::Raw {
                score: snapshot.score,
            };
            return (event, true);
        }

        let event = match timeout(self.enrichment_timeout, enricher.summarize(&snapshot)).await {
            Ok(Ok(summary)) => {
                info!(cycle = cycle, summary_len = summary.len(), "snapshot enriched");
                DisplayEvent::Enriched { summary }
            }
            Ok(Err(e)) => {
                warn!(cycle = cycle, error = %e, "enrichment failed, displaying raw score");
                DisplayEvent::EnrichmentFailed {
                    score: snapshot.score,
                    error: e.to_string(),
                }
            }
            Err(_) => {
                let e = SummarizeError::Timeout(self.enrichment_timeout);
                warn!(cycle = cycle, error = %e, "enrichment deadline exceeded, displaying raw score");
                DisplayEvent::EnrichmentFailed {
                    score: snapshot.score,
                    error: e.to_string(),
                }
            }
        };
        (event, false)
    }

    /// Running totals so far.
    pub const fn stats(&self) -> CycleStats {
        self.stats
    }

    /// The display sink.
    pub const fn sink(&self) -> &D {
        &self.sink
    }

    /// Mutable access to the display sink.
    pub const fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    /// The shared call budget.
    pub const fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
