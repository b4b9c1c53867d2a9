//! Error types for the runner binary.
//!
//! Uses `thiserror` for typed errors raised during startup: configuration,
//! match discovery, and interactive selection. Once the poll session is
//! running nothing here is fatal; fetch and summarizer failures are handled
//! per cycle.

use scorewatch_core::config::ConfigError;
use scorewatch_core::enricher::SummarizeError;

/// Errors that can occur while starting the runner.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The engine configuration file or values were rejected.
    #[error("engine config error: {0}")]
    Engine(#[from] ConfigError),

    /// The prompt template could not be loaded.
    #[error("prompt template error: {0}")]
    Template(#[from] SummarizeError),

    /// A page could not be fetched or read.
    #[error("scrape error: {0}")]
    Scrape(String),

    /// The live scores page listed no matches.
    #[error("no live matches found")]
    NoLiveMatches,

    /// The interactive prompt failed (e.g. no terminal attached).
    #[error("selection error: {0}")]
    Selection(String),
}
