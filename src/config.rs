//! Plugin configuration ("valves" in host terminology).
//!
//! The host's configuration UI injects these values at construction; within
//! a request they are read-only. For local use the same record loads from
//! `./chainpipe.toml` (or `$CHAINPIPE_CONFIG_PATH`) with environment
//! variables taking precedence.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

/// Which model backend the chain talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server at `base_url`.
    #[default]
    Ollama,
    /// OpenAI chat completions with `openai_api_key`.
    Openai,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::Openai),
            other => Err(format!("unknown provider {other:?}")),
        }
    }
}

/// User-configurable settings for the pipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Valves {
    /// Ollama service endpoint.
    pub base_url: String,
    /// Embedding model name. Carried for host-UI parity; the fixed chain
    /// does no retrieval and never embeds.
    pub ollama_embed_model: String,
    /// Ollama chat model name.
    pub ollama_model: String,
    /// OpenAI credential, used only when `provider = "openai"`.
    pub openai_api_key: String,
    /// OpenAI chat model name.
    pub openai_model: String,
    /// Minimum seconds between status emissions.
    pub emit_interval_secs: f64,
    /// Master switch for status emissions.
    pub enable_status_indicator: bool,
    /// Backend selector.
    pub provider: ProviderKind,
}

impl Default for Valves {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_owned(),
            ollama_embed_model: "nomic-embed-text".to_owned(),
            ollama_model: "llama3.1".to_owned(),
            openai_api_key: String::new(),
            openai_model: "gpt-3.5-turbo".to_owned(),
            emit_interval_secs: 2.0,
            enable_status_indicator: true,
            provider: ProviderKind::Ollama,
        }
    }
}

impl Valves {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$CHAINPIPE_CONFIG_PATH` or `./chainpipe.toml`.
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error on an unreadable or unparseable config file, or if
    /// the resulting valves fail validation.
    pub fn load() -> Result<Self> {
        let mut valves = Self::load_from_file()?;
        valves.apply_overrides(|key| std::env::var(key).ok());
        valves.validate()?;
        Ok(valves)
    }

    /// Parse valves from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid valves TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse valves TOML")
    }

    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading valves from file");
                Self::from_toml(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no valves file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read valves file: {e}")),
        }
    }

    /// Resolve the config file path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("CHAINPIPE_CONFIG_PATH")
            .map_or_else(|| PathBuf::from("chainpipe.toml"), PathBuf::from)
    }

    /// Apply environment variable overrides (env > file > defaults).
    ///
    /// Takes a resolver function for testability. Unparseable numeric or
    /// boolean overrides are ignored with a warning.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("CHAINPIPE_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = env("CHAINPIPE_EMBED_MODEL") {
            self.ollama_embed_model = v;
        }
        if let Some(v) = env("CHAINPIPE_OLLAMA_MODEL") {
            self.ollama_model = v;
        }
        if let Some(v) = env("CHAINPIPE_OPENAI_API_KEY") {
            self.openai_api_key = v;
        }
        if let Some(v) = env("CHAINPIPE_OPENAI_MODEL") {
            self.openai_model = v;
        }
        if let Some(v) = env("CHAINPIPE_EMIT_INTERVAL_SECS") {
            match v.parse() {
                Ok(n) => self.emit_interval_secs = n,
                Err(_) => tracing::warn!(
                    var = "CHAINPIPE_EMIT_INTERVAL_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("CHAINPIPE_STATUS_INDICATOR") {
            match v.parse() {
                Ok(b) => self.enable_status_indicator = b,
                Err(_) => tracing::warn!(
                    var = "CHAINPIPE_STATUS_INDICATOR",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("CHAINPIPE_PROVIDER") {
            match v.parse() {
                Ok(p) => self.provider = p,
                Err(_) => tracing::warn!(
                    var = "CHAINPIPE_PROVIDER",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Sanity-check the loaded values.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the emission
    /// interval is not a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        if !self.emit_interval_secs.is_finite() || self.emit_interval_secs < 0.0 {
            anyhow::bail!(
                "emit_interval_secs must be finite and non-negative, got {}",
                self.emit_interval_secs
            );
        }
        Ok(())
    }

    /// The emission interval as a [`Duration`]. Out-of-range values clamp
    /// to zero.
    pub fn emit_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.emit_interval_secs).unwrap_or(Duration::ZERO)
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plugin_constants() {
        let valves = Valves::default();
        assert_eq!(valves.base_url, "http://localhost:11434");
        assert_eq!(valves.ollama_embed_model, "nomic-embed-text");
        assert_eq!(valves.ollama_model, "llama3.1");
        assert_eq!(valves.openai_api_key, "");
        assert_eq!(valves.openai_model, "gpt-3.5-turbo");
        assert_eq!(valves.emit_interval_secs, 2.0);
        assert!(valves.enable_status_indicator);
        assert_eq!(valves.provider, ProviderKind::Ollama);
        valves.validate().expect("defaults should validate");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
base_url = "http://10.0.0.5:11434"
ollama_embed_model = "mxbai-embed-large"
ollama_model = "qwen3:8b"
openai_api_key = "sk-test"
openai_model = "gpt-4o-mini"
emit_interval_secs = 0.5
enable_status_indicator = false
provider = "openai"
"#;
        let valves = Valves::from_toml(toml_str).expect("should parse");
        assert_eq!(valves.base_url, "http://10.0.0.5:11434");
        assert_eq!(valves.ollama_model, "qwen3:8b");
        assert_eq!(valves.openai_model, "gpt-4o-mini");
        assert_eq!(valves.provider, ProviderKind::Openai);
        assert!(!valves.enable_status_indicator);
        assert_eq!(valves.emit_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let valves = Valves::from_toml(r#"ollama_model = "llama3.2""#).expect("should parse");
        assert_eq!(valves.ollama_model, "llama3.2");
        assert_eq!(valves.base_url, "http://localhost:11434");
        assert!(valves.enable_status_indicator);
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let mut valves = Valves::default();
        valves.apply_overrides(|key| match key {
            "CHAINPIPE_BASE_URL" => Some("http://ollama.lan:11434".to_owned()),
            "CHAINPIPE_OLLAMA_MODEL" => Some("mistral".to_owned()),
            "CHAINPIPE_EMIT_INTERVAL_SECS" => Some("5".to_owned()),
            "CHAINPIPE_STATUS_INDICATOR" => Some("false".to_owned()),
            "CHAINPIPE_PROVIDER" => Some("openai".to_owned()),
            _ => None,
        });
        assert_eq!(valves.base_url, "http://ollama.lan:11434");
        assert_eq!(valves.ollama_model, "mistral");
        assert_eq!(valves.emit_interval_secs, 5.0);
        assert!(!valves.enable_status_indicator);
        assert_eq!(valves.provider, ProviderKind::Openai);
    }

    #[test]
    fn test_invalid_env_override_is_ignored() {
        let mut valves = Valves::default();
        valves.apply_overrides(|key| match key {
            "CHAINPIPE_EMIT_INTERVAL_SECS" => Some("soon".to_owned()),
            "CHAINPIPE_STATUS_INDICATOR" => Some("yes please".to_owned()),
            "CHAINPIPE_PROVIDER" => Some("bard".to_owned()),
            _ => None,
        });
        assert_eq!(valves.emit_interval_secs, 2.0);
        assert!(valves.enable_status_indicator);
        assert_eq!(valves.provider, ProviderKind::Ollama);
    }

    #[test]
    fn test_config_path_resolution() {
        let path = Valves::config_path_with(|key| match key {
            "CHAINPIPE_CONFIG_PATH" => Some("/etc/chainpipe/valves.toml".to_owned()),
            _ => None,
        });
        assert_eq!(path, PathBuf::from("/etc/chainpipe/valves.toml"));

        let fallback = Valves::config_path_with(|_| None);
        assert_eq!(fallback, PathBuf::from("chainpipe.toml"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut valves = Valves::default();
        valves.base_url = "not a url".to_owned();
        assert!(valves.validate().is_err());

        let mut valves = Valves::default();
        valves.emit_interval_secs = f64::NAN;
        assert!(valves.validate().is_err());
        assert_eq!(valves.emit_interval(), Duration::ZERO);

        let mut valves = Valves::default();
        valves.emit_interval_secs = -1.0;
        assert!(valves.validate().is_err());
        assert_eq!(valves.emit_interval(), Duration::ZERO);
    }
}
