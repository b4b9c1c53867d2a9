//! Shared type definitions for Scorewatch.
//!
//! This crate holds the values that flow between the polling engine and its
//! collaborators: the scorecard snapshot produced on every tick, the display
//! event emitted at the end of a cycle, and the live match listing used to
//! pick which scorecard to follow.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`snapshot`] -- Scorecard snapshot and its batting/bowling lines
//! - [`display`] -- Per-cycle display events
//! - [`listing`] -- Live match listing entries

pub mod display;
pub mod ids;
pub mod listing;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use display::DisplayEvent;
pub use ids::SessionId;
pub use listing::MatchListing;
pub use snapshot::{BattingLine, BowlingLine, Snapshot};
