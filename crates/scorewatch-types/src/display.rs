//! Display events emitted at the end of every polling cycle.

use serde::{Deserialize, Serialize};

/// What the presentation layer should show for one cycle.
///
/// Exactly one event is produced per cycle and it is consumed immediately;
/// nothing is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayEvent {
    /// The raw score, shown when enrichment is disabled or the budget is spent.
    Raw {
        /// Score line from the snapshot.
        score: String,
    },
    /// The summarizer's text for this cycle.
    Enriched {
        /// Summary returned by the enrichment service.
        summary: String,
    },
    /// Enrichment was attempted and failed; the raw score is shown instead.
    EnrichmentFailed {
        /// Score line from the snapshot.
        score: String,
        /// Human-readable failure description.
        error: String,
    },
}

impl DisplayEvent {
    /// Short label for structured logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Raw { .. } => "raw",
            Self::Enriched { .. } => "enriched",
            Self::EnrichmentFailed { .. } => "enrichment_failed",
        }
    }

    /// The raw score carried by the event, if any.
    pub fn score(&self) -> Option<&str> {
        match self {
            Self::Raw { score } | Self::EnrichmentFailed { score, .. } => Some(score),
            Self::Enriched { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_event_still_carries_score() {
        let event = DisplayEvent::EnrichmentFailed {
            score: "120/2".to_owned(),
            error: "boom".to_owned(),
        };
        assert_eq!(event.score(), Some("120/2"));
        assert_eq!(event.kind(), "enrichment_failed");
    }

    #[test]
    fn enriched_event_has_no_score() {
        let event = DisplayEvent::Enriched {
            summary: "India cruise along".to_owned(),
        };
        assert_eq!(event.score(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let event = DisplayEvent::Raw {
            score: "55/1".to_owned(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["kind"], "raw");
        assert_eq!(json["score"], "55/1");
    }
}
