//! Startup choices: which match to follow and whether to enrich.
//!
//! Preconfigured values win; otherwise the operator is asked on the
//! terminal. The prompts block, so they run on the blocking pool.

use dialoguer::{Confirm, Select};
use scorewatch_types::MatchListing;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::scrape;

/// The match a session will follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenMatch {
    /// Menu title, or the raw link when preconfigured.
    pub title: String,
    /// Site-relative link to the match page.
    pub link: String,
}

impl From<MatchListing> for ChosenMatch {
    fn from(listing: MatchListing) -> Self {
        Self {
            title: listing.title,
            link: listing.link,
        }
    }
}

/// Resolve the match to follow: the configured link, or a menu over the
/// live listing.
pub async fn resolve_match(
    config: &RunnerConfig,
    client: &reqwest::Client,
) -> Result<ChosenMatch, RunnerError> {
    if let Some(link) = &config.match_link {
        return Ok(ChosenMatch {
            title: link.clone(),
            link: link.clone(),
        });
    }

    let matches = scrape::list_live_matches(client, &config.base_url).await?;
    if matches.is_empty() {
        return Err(RunnerError::NoLiveMatches);
    }

    let titles: Vec<String> = matches.iter().map(|m| m.title.clone()).collect();
    let choice = blocking(move || {
        Select::new()
            .with_prompt("Choose the match")
            .items(&titles)
            .default(0)
            .interact_opt()
    })
    .await?;

    pick(matches, choice)
}

/// Take the chosen entry out of the listing. `None` means the menu was
/// dismissed.
fn pick(matches: Vec<MatchListing>, choice: Option<usize>) -> Result<ChosenMatch, RunnerError> {
    let index = choice.ok_or_else(|| RunnerError::Selection("no match chosen".to_owned()))?;
    matches
        .into_iter()
        .find(|m| m.index == index)
        .map(ChosenMatch::from)
        .ok_or_else(|| RunnerError::Selection(format!("no match at position {index}")))
}

/// Resolve whether commentary is enabled: the configured answer, or a
/// yes/no question.
pub async fn resolve_enrichment(preset: Option<bool>) -> Result<bool, RunnerError> {
    if let Some(enabled) = preset {
        return Ok(enabled);
    }
    blocking(|| {
        Confirm::new()
            .with_prompt("Do you want to enable AI generated meta commentary?")
            .default(false)
            .interact()
    })
    .await
}

/// Run a terminal prompt on the blocking pool.
async fn blocking<T, F>(prompt: F) -> Result<T, RunnerError>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| RunnerError::Selection(format!("prompt task failed: {e}")))?
        .map_err(|e| RunnerError::Selection(e.to_string()))
}
