//! Service configuration
//!
//! Everything is read from the process environment (after `.env` is loaded
//! by `dotenv` in `main`). A missing credential is a startup error: the
//! service never falls back to a placeholder key.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::agents::{AgentError, CrewDefinition};
use crate::llm::{
    AnthropicConfig, AnthropicProvider, LlmError, LlmProvider, OpenAiConfig, OpenAiProvider,
};

/// Errors raised while loading configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Unknown LLM provider: {0} (expected \"openai\" or \"anthropic\")")]
    UnknownProvider(String),

    #[error("Failed to read crew definition {}: {source}", .path.display())]
    CrewFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid crew definition: {0}")]
    CrewDefinition(String),

    #[error("Failed to initialise LLM provider: {0}")]
    Provider(#[from] LlmError),
}

impl From<AgentError> for ConfigError {
    fn from(err: AgentError) -> Self {
        ConfigError::CrewDefinition(err.to_string())
    }
}

/// Supported completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    /// Environment variable that holds this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// LLM backend settings
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmSettings {
    /// Builds the configured provider
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        let provider: Arc<dyn LlmProvider> = match self.provider {
            ProviderKind::OpenAi => {
                let mut config = OpenAiConfig {
                    api_key: self.api_key.clone(),
                    timeout: self.timeout,
                    ..OpenAiConfig::default()
                };
                if let Some(base_url) = &self.base_url {
                    config.base_url = base_url.clone();
                }
                Arc::new(OpenAiProvider::new(config)?)
            }
            ProviderKind::Anthropic => {
                let mut config = AnthropicConfig {
                    api_key: self.api_key.clone(),
                    timeout: self.timeout,
                    ..AnthropicConfig::default()
                };
                if let Some(base_url) = &self.base_url {
                    config.base_url = base_url.clone();
                }
                Arc::new(AnthropicProvider::new(config)?)
            }
        };

        Ok(provider)
    }
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub llm: LlmSettings,
    /// Path to a JSON crew definition; the built-in crew is used when unset
    pub crew_file: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    ///
    /// Blank values are treated as unset.
    ///
    /// # Example
    /// ```
    /// use singularity_api::config::Config;
    ///
    /// let config = Config::from_lookup(|key| match key {
    ///     "OPENAI_API_KEY" => Some("sk-test".to_string()),
    ///     "PORT" => Some("9000".to_string()),
    ///     _ => None,
    /// })
    /// .expect("valid config");
    ///
    /// assert_eq!(config.port, 9000);
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = parse_or("HOST", get("HOST"), IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or("PORT", get("PORT"), 8000u16)?;

        let provider = match get("LLM_PROVIDER") {
            Some(value) => value.parse::<ProviderKind>()?,
            None => ProviderKind::OpenAi,
        };

        let api_key_var = provider.api_key_var();
        let api_key = get(api_key_var).ok_or(ConfigError::MissingVar(api_key_var))?;

        let timeout_secs = parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 120u64)?;
        let max_tokens = parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), 4096u32)?;
        let temperature = parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), 0.7f32)?;

        let llm = LlmSettings {
            provider,
            api_key,
            model: get("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: get("LLM_BASE_URL"),
            timeout: Duration::from_secs(timeout_secs),
            max_tokens,
            temperature,
        };

        Ok(Self {
            host,
            port,
            llm,
            crew_file: get("CREW_CONFIG").map(PathBuf::from),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Crew definition from `CREW_CONFIG`, or the built-in one
    pub fn crew_definition(&self) -> Result<CrewDefinition, ConfigError> {
        match &self.crew_file {
            Some(path) => load_crew_definition(path),
            None => Ok(CrewDefinition::singularity()),
        }
    }
}

/// Reads and validates a JSON crew definition file
pub fn load_crew_definition(path: &Path) -> Result<CrewDefinition, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::CrewFile {
        path: path.to_path_buf(),
        source,
    })?;

    let definition: CrewDefinition = serde_json::from_str(&contents)
        .map_err(|e| ConfigError::CrewDefinition(format!("{}: {}", path.display(), e)))?;
    definition.validate()?;

    Ok(definition)
}

fn parse_or<T: FromStr>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.llm.provider, ProviderKind::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout, Duration::from_secs(120));
        assert!(config.crew_file.is_none());
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let result = Config::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::MissingVar("OPENAI_API_KEY"))));
    }

    #[test]
    fn test_blank_credential_is_fatal() {
        let result = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")]));
        assert!(matches!(result, Err(ConfigError::MissingVar(_))));
    }

    #[test]
    fn test_anthropic_requires_its_own_key() {
        let result = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));
        assert!(matches!(result, Err(ConfigError::MissingVar("ANTHROPIC_API_KEY"))));

        let config = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "Anthropic"),
            ("ANTHROPIC_API_KEY", "ak-test"),
        ]))
        .unwrap();
        assert_eq!(config.llm.provider, ProviderKind::Anthropic);
        assert_eq!(config.llm.model, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { var: "PORT", .. })));
    }

    #[test]
    fn test_unknown_provider() {
        let result = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_PROVIDER", "mystery"),
        ]));
        assert!(matches!(result, Err(ConfigError::UnknownProvider(_))));
    }

    #[test]
    fn test_build_provider() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        let provider = config.llm.build_provider().unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_builtin_crew_when_no_file() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.crew_definition().unwrap(), CrewDefinition::singularity());
    }

    #[test]
    fn test_load_crew_definition_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "support",
                "agents": [{{"role": "Helper", "goal": "Help.", "backstory": "Kind."}}],
                "tasks": [{{"description": "Answer: {{user_input}}", "agent": "Helper"}}]
            }}"#
        )
        .unwrap();

        let definition = load_crew_definition(file.path()).unwrap();

        assert_eq!(definition.name, "support");
        assert_eq!(definition.tasks[0].description, "Answer: {user_input}");
    }

    #[test]
    fn test_crew_file_with_unknown_agent_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "agents": [{{"role": "Helper", "goal": "Help.", "backstory": "Kind."}}],
                "tasks": [{{"description": "Answer", "agent": "Nobody"}}]
            }}"#
        )
        .unwrap();

        let result = load_crew_definition(file.path());
        assert!(matches!(result, Err(ConfigError::CrewDefinition(_))));
    }

    #[test]
    fn test_missing_crew_file() {
        let result = load_crew_definition(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::CrewFile { .. })));
    }
}
