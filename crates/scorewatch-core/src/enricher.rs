//! Enrichment: prompt construction and the summarizer seam.
//!
//! The [`Enricher`] renders a [`Snapshot`] into a single natural-language
//! prompt via `minijinja` and hands it to a [`Summarizer`]. Summarizer
//! errors are returned untouched: no retry, no fallback text. Deciding
//! what to show instead is the poller's job.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use minijinja::{Environment, context};
use scorewatch_types::Snapshot;
use tracing::debug;

/// Built-in prompt template.
const DEFAULT_TEMPLATE: &str = include_str!("../templates/summary.j2");

/// Name the prompt template is registered under.
const TEMPLATE_NAME: &str = "summary";

/// Errors that can occur while producing a summary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizeError {
    /// The prompt template failed to load or render.
    #[error("template error: {0}")]
    Template(String),

    /// The summarization backend returned an error or was unreachable.
    #[error("summarizer backend error: {0}")]
    Backend(String),

    /// The summarization call exceeded its deadline.
    #[error("summarizer timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// External text summarization service.
///
/// Response length and temperature are fixed when the implementation is
/// constructed, never per call.
pub trait Summarizer {
    /// Summarize `prompt` and return the response text.
    fn summarize(&self, prompt: &str) -> impl Future<Output = Result<String, SummarizeError>> + Send;
}

/// Renders snapshots into the enrichment prompt.
#[derive(Debug)]
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    /// Create a builder using the built-in template.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::Template`] if the template fails to compile.
    pub fn new() -> Result<Self, SummarizeError> {
        Self::from_source(DEFAULT_TEMPLATE.to_owned())
    }

    /// Create a builder from a template file on disk, so the prompt can be
    /// tuned without recompiling.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::Template`] if the file cannot be read or
    /// the template fails to compile.
    pub fn from_file(path: &Path) -> Result<Self, SummarizeError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            SummarizeError::Template(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_source(source)
    }

    /// Create a builder from template source text.
    ///
    /// The template sees `score`, `batters` (`name`, `runs`, `balls`) and
    /// `bowlers` (`name`, `runs`, `wickets`).
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::Template`] if the template fails to compile.
    pub fn from_source(source: String) -> Result<Self, SummarizeError> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source)
            .map_err(|e| SummarizeError::Template(format!("failed to add prompt template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the prompt for one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::Template`] if rendering fails.
    pub fn render(&self, snapshot: &Snapshot) -> Result<String, SummarizeError> {
        self.env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| SummarizeError::Template(format!("missing prompt template: {e}")))?
            .render(context! {
                score => snapshot.score,
                batters => snapshot.batters,
                bowlers => snapshot.bowlers,
            })
            .map_err(|e| SummarizeError::Template(format!("prompt render failed: {e}")))
    }
}

/// Prompt construction plus the summarizer call.
#[derive(Debug)]
pub struct Enricher<M> {
    prompts: PromptBuilder,
    summarizer: M,
}

impl<M: Summarizer> Enricher<M> {
    /// Create an enricher from a prompt builder and a summarizer.
    pub const fn new(prompts: PromptBuilder, summarizer: M) -> Self {
        Self {
            prompts,
            summarizer,
        }
    }

    /// Build the prompt for `snapshot` and summarize it.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::Template`] if the prompt cannot be rendered,
    /// or whatever error the summarizer produced.
    pub async fn summarize(&self, snapshot: &Snapshot) -> Result<String, SummarizeError> {
        let prompt = self.prompts.render(snapshot)?;
        debug!(prompt_len = prompt.len(), "enrichment prompt rendered");
        self.summarizer.summarize(&prompt).await
    }

    /// The prompt builder in use.
    pub const fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use scorewatch_types::{BattingLine, BowlingLine};

    use super::*;

    /// Records the prompt it was given and answers with a fixed reply.
    struct RecordingSummarizer {
        reply: Result<String, SummarizeError>,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingSummarizer {
        fn answering(reply: Result<String, SummarizeError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(prompt.to_owned());
            }
            self.reply.clone()
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(
            "120/2".to_owned(),
            vec![BattingLine {
                name: "A".to_owned(),
                runs: "10".to_owned(),
                balls: "8".to_owned(),
            }],
            vec![BowlingLine {
                name: "B".to_owned(),
                runs: "5".to_owned(),
                wickets: "1".to_owned(),
            }],
        )
    }

    fn render(snapshot: &Snapshot) -> String {
        PromptBuilder::new().unwrap().render(snapshot).unwrap()
    }

    #[test]
    fn prompt_embeds_score_and_lines() {
        let prompt = render(&sample_snapshot());

        assert!(prompt.contains("Current score: 120/2"));
        assert!(prompt.contains("Batsmen: A (Runs: 10, Balls: 8)\n"));
        assert!(prompt.ends_with("Bowlers: B (Runs: 5, Wickets: 1)"));
        assert!(!prompt.contains(", \n"));
        assert!(!prompt.trim_end().ends_with(','));
    }

    #[test]
    fn multiple_lines_are_comma_joined_in_order() {
        let mut snapshot = sample_snapshot();
        snapshot.batters.push(BattingLine {
            name: "C".to_owned(),
            runs: "44".to_owned(),
            balls: "30".to_owned(),
        });
        let prompt = render(&snapshot);

        assert!(prompt.contains("Batsmen: A (Runs: 10, Balls: 8), C (Runs: 44, Balls: 30)\n"));
    }

    #[test]
    fn empty_snapshot_renders_empty_sections() {
        let prompt = render(&Snapshot::empty());

        assert!(prompt.contains("Current score: \n"));
        assert!(prompt.contains("Batsmen: \n"));
        assert!(prompt.ends_with("Bowlers: "));
    }

    #[test]
    fn score_text_is_not_html_escaped() {
        let snapshot = Snapshot::new("IND 120/2 & <rain>".to_owned(), Vec::new(), Vec::new());
        let prompt = render(&snapshot);
        assert!(prompt.contains("IND 120/2 & <rain>"));
    }

    #[test]
    fn custom_template_source_is_used() {
        let builder = PromptBuilder::from_source("Score is {{ score }}".to_owned()).unwrap();
        let prompt = builder.render(&sample_snapshot()).unwrap();
        assert_eq!(prompt, "Score is 120/2");
    }

    #[test]
    fn broken_template_is_rejected() {
        let result = PromptBuilder::from_source("{% for %}".to_owned());
        assert!(matches!(result, Err(SummarizeError::Template(_))));
    }

    #[test]
    fn missing_template_file_is_rejected() {
        let result = PromptBuilder::from_file(Path::new("/nonexistent/summary.j2"));
        assert!(matches!(result, Err(SummarizeError::Template(_))));
    }

    #[tokio::test]
    async fn summarizer_receives_rendered_prompt() {
        let prompts = PromptBuilder::new().unwrap();
        let enricher = Enricher::new(
            prompts,
            RecordingSummarizer::answering(Ok("India on top".to_owned())),
        );

        let summary = enricher.summarize(&sample_snapshot()).await;
        assert_eq!(summary, Ok("India on top".to_owned()));

        let seen = enricher.summarizer.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert!(seen.first().is_some_and(|p| p.contains("120/2")));
    }

    #[tokio::test]
    async fn summarizer_error_is_returned_untouched() {
        let prompts = PromptBuilder::new().unwrap();
        let failure = SummarizeError::Backend("429 Too Many Requests".to_owned());
        let enricher = Enricher::new(prompts, RecordingSummarizer::answering(Err(failure.clone())));

        let result = enricher.summarize(&sample_snapshot()).await;
        assert_eq!(result, Err(failure));
    }
}
