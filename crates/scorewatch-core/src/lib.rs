//! Polling engine for Scorewatch.
//!
//! This crate owns the recurring poll cycle: fetch a scorecard snapshot,
//! ask the call budget whether the enrichment service may be used, route
//! the snapshot to the summarizer or straight through, and emit exactly one
//! display event. Fetching, summarizing and rendering are collaborators
//! behind traits; the runner binary supplies the real ones.
//!
//! # Modules
//!
//! - [`config`] -- Engine tunables and their YAML loader.
//! - [`limiter`] -- Fixed-window call budget shared across the session.
//! - [`enricher`] -- Prompt construction and the [`Summarizer`] seam.
//! - [`lifecycle`] -- Stop signal and end reason for one run.
//! - [`poller`] -- The tick loop and the per-cycle routing decision.
//! - [`session`] -- [`PollSession`], the run-scoped aggregate.
//!
//! [`Summarizer`]: enricher::Summarizer
//! [`PollSession`]: session::PollSession

pub mod config;
pub mod enricher;
pub mod lifecycle;
pub mod limiter;
pub mod poller;
pub mod session;
