//! Cricbuzz scraping: the live match listing and per-match scorecards.
//!
//! Pages are fetched with `reqwest` and parsed with `scraper`. Parsing is
//! kept in plain functions over the page text because `scraper::Html` is
//! not `Send` and must never be held across an await.

use scorewatch_core::poller::SnapshotSource;
use scorewatch_types::{BattingLine, BowlingLine, MatchListing, Snapshot};
use scraper::{ElementRef, Html, Selector};

use crate::error::RunnerError;

/// Default site root.
pub const DEFAULT_BASE_URL: &str = "https://www.cricbuzz.com";

/// Path of the live scores page, relative to the site root.
pub const LIVE_SCORES_PATH: &str = "/cricket-match/live-scores";

const SCORE_SELECTOR: &str = "div.cb-col.cb-col-100.cb-col-scores";
const MINI_SCORECARD_SELECTOR: &str = "div.cb-min-inf.cb-col-100";
const ROW_SELECTOR: &str = "div.cb-col.cb-col-100.cb-min-itm-rw";
const LISTING_SELECTOR: &str = "div.cb-col-100.cb-col.cb-schdl.cb-billing-plans-text";

/// Scorecard source for one match.
pub struct CricbuzzSource {
    client: reqwest::Client,
    url: String,
}

impl CricbuzzSource {
    /// Follow the match at `link` (site-relative) under `base_url`.
    pub fn new(client: reqwest::Client, base_url: &str, link: &str) -> Self {
        Self {
            client,
            url: join_url(base_url, link),
        }
    }

    /// Full URL of the scorecard page.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for CricbuzzSource {
    async fn fetch_snapshot(&self) -> Snapshot {
        match fetch_page(&self.client, &self.url).await {
            Ok(body) => {
                let snapshot = parse_scorecard(&body);
                if snapshot.is_empty() {
                    tracing::warn!(url = %self.url, "scorecard page had no score data");
                }
                snapshot
            }
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "scorecard fetch failed");
                Snapshot::empty()
            }
        }
    }
}

/// Fetch the live scores page and list the matches on it.
pub async fn list_live_matches(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<Vec<MatchListing>, RunnerError> {
    let url = join_url(base_url, LIVE_SCORES_PATH);
    let body = fetch_page(client, &url).await?;
    let matches = parse_match_listing(&body);
    tracing::debug!(url = %url, count = matches.len(), "live match listing fetched");
    Ok(matches)
}

/// GET a page and return its body.
async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String, RunnerError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RunnerError::Scrape(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RunnerError::Scrape(format!("{url} returned {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| RunnerError::Scrape(format!("reading {url} failed: {e}")))
}

/// Extract a snapshot from a match page.
///
/// The score is the last score block on the page. The first mini
/// scorecard lists the batters at the crease; any later ones list the
/// bowlers. Missing sections leave the corresponding fields empty.
pub fn parse_scorecard(html: &str) -> Snapshot {
    let document = Html::parse_document(html);

    let score = selector(SCORE_SELECTOR)
        .and_then(|s| document.select(&s).last())
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let mut batters = Vec::new();
    let mut bowlers = Vec::new();

    if let (Some(blocks), Some(rows)) = (selector(MINI_SCORECARD_SELECTOR), selector(ROW_SELECTOR))
    {
        for (position, block) in document.select(&blocks).enumerate() {
            for row in block.select(&rows) {
                if position == 0 {
                    batters.push(BattingLine {
                        name: child_text(&row, "a"),
                        runs: child_text(&row, "div:nth-of-type(2)"),
                        balls: child_text(&row, "div:nth-of-type(3)"),
                    });
                } else {
                    bowlers.push(BowlingLine {
                        name: child_text(&row, "a"),
                        runs: child_text(&row, "div:nth-of-type(4)"),
                        wickets: child_text(&row, "div:nth-of-type(5)"),
                    });
                }
            }
        }
    }

    Snapshot::new(score, batters, bowlers)
}

/// Extract the live matches from the live scores page, in page order.
pub fn parse_match_listing(html: &str) -> Vec<MatchListing> {
    let document = Html::parse_document(html);
    let (Some(entries), Some(anchor)) = (selector(LISTING_SELECTOR), selector("a")) else {
        return Vec::new();
    };

    document
        .select(&entries)
        .enumerate()
        .map(|(index, entry)| {
            let link = entry
                .select(&anchor)
                .find_map(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_owned();
            MatchListing::new(index, &element_text(&entry), link)
        })
        .collect()
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Text of the first descendant matching `css`, trimmed.
fn child_text(element: &ElementRef<'_>, css: &str) -> String {
    selector(css)
        .and_then(|s| element.select(&s).next())
        .map(|el| element_text(&el))
        .unwrap_or_default()
}

/// All text under an element with whitespace runs collapsed.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
