//! Configuration types for the runner.
//!
//! Everything is read from environment variables, after loading a `.env`
//! file if one is present. Engine tunables start from the optional YAML
//! file named by `SCOREWATCH_CONFIG` (or the built-in defaults) and can be
//! overridden one by one.
//!
//! Variables are read through a lookup function so tests can supply a map
//! instead of touching the process environment.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use scorewatch_core::config::{ConfigError, EngineConfig};
use serde::Deserialize;

use crate::error::RunnerError;
use crate::scrape::DEFAULT_BASE_URL;

/// Complete runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Engine tunables (cadence, budget, summarizer limits).
    pub engine: EngineConfig,
    /// Whether to enrich; `None` means ask on the terminal.
    pub enrichment_choice: Option<bool>,
    /// Site-relative link of the match to follow; `None` means pick from
    /// the live listing.
    pub match_link: Option<String>,
    /// Scorecard site root (e.g. `https://www.cricbuzz.com`).
    pub base_url: String,
    /// Per-request deadline for scorecard fetches.
    pub http_timeout: Duration,
    /// Prompt template override.
    pub prompt_template_path: Option<String>,
    /// Summarizer backend, if credentials were supplied.
    pub backend: Option<LlmBackendConfig>,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type (openai, anthropic).
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g. `gpt-3.5-turbo`).
    pub model: String,
    /// Response length cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API (different request format).
    Anthropic,
}

impl BackendType {
    /// Parse a backend name.
    fn parse(name: &str) -> Result<Self, RunnerError> {
        match name.to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(RunnerError::Config(format!("unknown backend type: {other}"))),
        }
    }

    const fn default_api_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// Provider-specific key variable checked after `LLM_API_KEY`.
    const fn key_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl RunnerConfig {
    /// Load configuration from the process environment, after reading
    /// `.env` if present.
    ///
    /// Optional variables:
    /// - `SCOREWATCH_CONFIG` -- YAML file with engine tunables
    /// - `POLL_INTERVAL_MS` -- cycle cadence (default 10000)
    /// - `ENRICH_THRESHOLD` -- grants per window (default 2)
    /// - `ENRICH_RESET_MS` -- window length (default 60000)
    /// - `ENRICH_MAX_TOKENS` -- summary length cap (default 1024)
    /// - `ENRICH_TEMPERATURE` -- sampling temperature (default 0.8)
    /// - `ENRICH_TIMEOUT_MS` -- summarizer deadline (default 30000)
    /// - `ENRICHMENT_ENABLED` -- `y`/`n`; unset falls back to the engine
    ///   file's `enrichment_enabled`, then to asking
    /// - `SCOREWATCH_MATCH` -- match link; unset means choose from the listing
    /// - `CRICBUZZ_BASE_URL` -- site root (default `https://www.cricbuzz.com`)
    /// - `HTTP_TIMEOUT_MS` -- scorecard request deadline (default 8000)
    /// - `PROMPT_TEMPLATE_PATH` -- prompt template override
    /// - `LLM_BACKEND` -- `openai` (default) or `anthropic`
    /// - `LLM_API_URL`, `LLM_MODEL` -- backend endpoint and model
    /// - `LLM_API_KEY` / `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` -- credentials
    pub fn from_env() -> Result<Self, RunnerError> {
        // A missing .env file is normal.
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunnerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let (mut engine, file_choice) = match var("SCOREWATCH_CONFIG") {
            Some(path) => load_engine_file(Path::new(&path))?,
            None => (EngineConfig::default(), None),
        };
        if let Some(v) = parse_var(&var, "POLL_INTERVAL_MS")? {
            engine.tick_interval_ms = v;
        }
        if let Some(v) = parse_var(&var, "ENRICH_THRESHOLD")? {
            engine.acquire_threshold = v;
        }
        if let Some(v) = parse_var(&var, "ENRICH_RESET_MS")? {
            engine.reset_delay_ms = v;
        }
        if let Some(v) = parse_var(&var, "ENRICH_MAX_TOKENS")? {
            engine.max_enriched_tokens = v;
        }
        if let Some(v) = parse_var(&var, "ENRICH_TEMPERATURE")? {
            engine.temperature = v;
        }
        if let Some(v) = parse_var(&var, "ENRICH_TIMEOUT_MS")? {
            engine.enrichment_timeout_ms = v;
        }
        engine.validate()?;

        let enrichment_choice = var("ENRICHMENT_ENABLED")
            .map(|v| {
                parse_yes_no(&v).ok_or_else(|| {
                    RunnerError::Config(format!("invalid ENRICHMENT_ENABLED: {v}"))
                })
            })
            .transpose()?
            .or(file_choice);

        let http_timeout_ms: u64 = parse_var(&var, "HTTP_TIMEOUT_MS")?.unwrap_or(8000);

        let backend = load_backend_config(&var, &engine)?;

        Ok(Self {
            engine,
            enrichment_choice,
            match_link: var("SCOREWATCH_MATCH"),
            base_url: var("CRICBUZZ_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            http_timeout: Duration::from_millis(http_timeout_ms),
            prompt_template_path: var("PROMPT_TEMPLATE_PATH"),
            backend,
        })
    }

    /// The backend configuration, required once enrichment is on.
    pub fn require_backend(&self) -> Result<&LlmBackendConfig, RunnerError> {
        self.backend.as_ref().ok_or_else(|| {
            RunnerError::Config(
                "enrichment enabled but no API key found (set OPENAI_API_KEY or LLM_API_KEY)"
                    .to_owned(),
            )
        })
    }
}

/// The commentary switch as written in the engine file, if it is there.
#[derive(Debug, Default, Deserialize)]
struct FileEnrichment {
    enrichment_enabled: Option<bool>,
}

/// Load the engine file. An `enrichment_enabled` key in it answers the
/// commentary question unless `ENRICHMENT_ENABLED` is set.
fn load_engine_file(path: &Path) -> Result<(EngineConfig, Option<bool>), RunnerError> {
    let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
    let engine = EngineConfig::parse(&contents)?;
    let choice = serde_yml::from_str::<FileEnrichment>(&contents)
        .ok()
        .and_then(|file| file.enrichment_enabled);
    Ok((engine, choice))
}

/// Parse an optional variable.
fn parse_var<T, V>(var: &V, name: &str) -> Result<Option<T>, RunnerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| RunnerError::Config(format!("invalid {name}: {e}")))
        })
        .transpose()
}

/// Interpret a yes/no answer.
pub fn parse_yes_no(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "on" => Some(true),
        "n" | "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Load the backend config; `Ok(None)` when no key is set.
fn load_backend_config<V>(var: &V, engine: &EngineConfig) -> Result<Option<LlmBackendConfig>, RunnerError>
where
    V: Fn(&str) -> Option<String>,
{
    let backend_type = match var("LLM_BACKEND") {
        Some(name) => BackendType::parse(&name)?,
        None => BackendType::OpenAi,
    };

    let Some(api_key) = var("LLM_API_KEY").or_else(|| var(backend_type.key_var())) else {
        return Ok(None);
    };

    Ok(Some(LlmBackendConfig {
        backend_type,
        api_url: var("LLM_API_URL").unwrap_or_else(|| backend_type.default_api_url().to_owned()),
        api_key,
        model: var("LLM_MODEL").unwrap_or_else(|| backend_type.default_model().to_owned()),
        max_tokens: engine.max_enriched_tokens,
        temperature: engine.temperature,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RunnerConfig, RunnerError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RunnerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.enrichment_choice, None);
        assert_eq!(config.match_link, None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(8));
        assert!(config.backend.is_none());
        assert!(config.require_backend().is_err());
    }

    #[test]
    fn engine_overrides_apply() {
        let config = load(&[
            ("POLL_INTERVAL_MS", "5000"),
            ("ENRICH_THRESHOLD", "4"),
            ("ENRICH_RESET_MS", "120000"),
            ("ENRICH_MAX_TOKENS", "256"),
            ("ENRICH_TIMEOUT_MS", "9000"),
        ])
        .unwrap();
        let engine = config.engine;
        assert_eq!(engine.tick_interval_ms, 5000);
        assert_eq!(engine.acquire_threshold, 4);
        assert_eq!(engine.reset_delay_ms, 120_000);
        assert_eq!(engine.max_enriched_tokens, 256);
        assert_eq!(engine.enrichment_timeout_ms, 9000);
    }

    #[test]
    fn unparsable_override_is_rejected() {
        let result = load(&[("ENRICH_THRESHOLD", "two")]);
        assert!(matches!(result, Err(RunnerError::Config(msg)) if msg.contains("ENRICH_THRESHOLD")));
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let result = load(&[("POLL_INTERVAL_MS", "0")]);
        assert!(matches!(result, Err(RunnerError::Engine(_))));
    }

    #[test]
    fn openai_key_yields_openai_backend() {
        let config = load(&[("OPENAI_API_KEY", "sk-test"), ("ENRICH_TEMPERATURE", "0.5")]).unwrap();
        let backend = config.backend.unwrap();
        assert_eq!(backend.backend_type, BackendType::OpenAi);
        assert_eq!(backend.api_key, "sk-test");
        assert_eq!(backend.api_url, "https://api.openai.com/v1");
        assert_eq!(backend.model, "gpt-3.5-turbo");
        assert_eq!(backend.max_tokens, 1024);
        assert!((backend.temperature - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn anthropic_backend_reads_its_own_key() {
        let config = load(&[
            ("LLM_BACKEND", "anthropic"),
            ("ANTHROPIC_API_KEY", "ak-test"),
            ("LLM_MODEL", "claude-haiku"),
        ])
        .unwrap();
        let backend = config.backend.unwrap();
        assert_eq!(backend.backend_type, BackendType::Anthropic);
        assert_eq!(backend.api_key, "ak-test");
        assert_eq!(backend.model, "claude-haiku");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = load(&[("LLM_BACKEND", "carrier-pigeon"), ("LLM_API_KEY", "k")]);
        assert!(matches!(result, Err(RunnerError::Config(_))));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("OPENAI_API_KEY", "  "), ("SCOREWATCH_MATCH", "")]).unwrap();
        assert!(config.backend.is_none());
        assert!(config.match_link.is_none());
    }

    #[test]
    fn enrichment_choice_parsing() {
        let yes = load(&[("ENRICHMENT_ENABLED", "Y")]).unwrap();
        assert_eq!(yes.enrichment_choice, Some(true));
        let no = load(&[("ENRICHMENT_ENABLED", "no")]).unwrap();
        assert_eq!(no.enrichment_choice, Some(false));
        assert!(load(&[("ENRICHMENT_ENABLED", "maybe")]).is_err());
    }

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn engine_file_can_turn_commentary_off() {
        let path = fixture("engine_quiet.yaml");
        let config = load(&[("SCOREWATCH_CONFIG", path.as_str())]).unwrap();
        assert_eq!(config.enrichment_choice, Some(false));
        assert!(!config.engine.enrichment_enabled);
        assert_eq!(config.engine.tick_interval_ms, 5000);
    }

    #[test]
    fn env_choice_beats_engine_file() {
        let path = fixture("engine_quiet.yaml");
        let config = load(&[("SCOREWATCH_CONFIG", path.as_str()), ("ENRICHMENT_ENABLED", "yes")]).unwrap();
        assert_eq!(config.enrichment_choice, Some(true));
    }

    #[test]
    fn engine_file_without_switch_still_asks() {
        let path = fixture("engine_tuned.yaml");
        let config = load(&[("SCOREWATCH_CONFIG", path.as_str())]).unwrap();
        assert_eq!(config.enrichment_choice, None);
        assert_eq!(config.engine.acquire_threshold, 3);
    }

    #[test]
    fn missing_engine_file_is_rejected() {
        let result = load(&[("SCOREWATCH_CONFIG", "/nonexistent/scorewatch.yaml")]);
        assert!(matches!(result, Err(RunnerError::Engine(ConfigError::Io { .. }))));
    }

    #[test]
    fn yes_no_answers() {
        assert_eq!(parse_yes_no("y"), Some(true));
        assert_eq!(parse_yes_no(" TRUE "), Some(true));
        assert_eq!(parse_yes_no("n"), Some(false));
        assert_eq!(parse_yes_no(""), None);
    }
}
