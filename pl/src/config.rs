//! Promptly configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::reconcile::DEFAULT_RESET_MARKER;

/// Main Promptly configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Prompt library configuration
    pub library: LibraryConfig,

    /// Chat behaviour
    pub chat: ChatConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .promptly.yml
        let local_config = PathBuf::from(".promptly.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/promptly/promptly.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("promptly").join("promptly.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Credential problems, detected before any network call
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("No active LLM provider configured")]
    NoActiveProvider,

    #[error("Provider {0} is disabled")]
    ProviderDisabled(ProviderKind),

    #[error("No API key for {provider}: set {env} or configure api-key-file")]
    MissingKey { provider: ProviderKind, env: String },

    #[error("Failed to read API key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
    Claude,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Claude => "claude",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::OpenAI => "gpt-3.5-turbo",
            ProviderKind::Claude => "claude-sonnet-4-20250514",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::OpenAI => "https://api.openai.com",
            ProviderKind::Claude => "https://api.anthropic.com",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Claude => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "claude" | "anthropic" => Ok(Self::Claude),
            _ => Err(format!("Unknown provider: {}. Use: gemini, openai, or claude", s)),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider used for chat; unset means chat is not configured
    pub active: Option<ProviderKind>,

    /// Per-provider settings
    pub providers: ProvidersConfig,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            active: None,
            providers: ProvidersConfig::default(),
            max_tokens: 1024,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Resolve the active provider into everything a client needs
    pub fn resolve(&self) -> Result<ResolvedLlmConfig, CredentialsError> {
        debug!(active = ?self.active, "LlmConfig::resolve: called");
        let kind = self.active.ok_or(CredentialsError::NoActiveProvider)?;
        let provider = self.providers.get(kind);
        if !provider.enabled {
            return Err(CredentialsError::ProviderDisabled(kind));
        }

        Ok(ResolvedLlmConfig {
            provider: kind,
            model: provider.model.clone().unwrap_or_else(|| kind.default_model().to_string()),
            base_url: provider
                .base_url
                .clone()
                .unwrap_or_else(|| kind.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: provider.get_api_key(kind)?,
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Settings for each supported provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
    pub openai: ProviderConfig,
    pub claude: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAI => &self.openai,
            ProviderKind::Claude => &self.claude,
        }
    }
}

/// One provider's settings; unset fields fall back to provider defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model identifier
    pub model: Option<String>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,

    /// File containing the API key, used when the env var is unset
    #[serde(rename = "api-key-file")]
    pub api_key_file: Option<PathBuf>,

    pub enabled: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            api_key_env: None,
            api_key_file: None,
            enabled: true,
        }
    }
}

impl ProviderConfig {
    /// Read the API key from the env var, then the key file
    pub fn get_api_key(&self, kind: ProviderKind) -> Result<String, CredentialsError> {
        let env = self
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.default_api_key_env().to_string());
        debug!(%kind, %env, "get_api_key: called");

        if let Ok(key) = std::env::var(&env) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                debug!("get_api_key: found in environment");
                return Ok(key);
            }
        }

        if let Some(path) = &self.api_key_file {
            let path = expand_home(path);
            let key = fs::read_to_string(&path)
                .map_err(|source| CredentialsError::KeyFile {
                    path: path.clone(),
                    source,
                })?
                .trim()
                .to_string();
            if !key.is_empty() {
                debug!(path = %path.display(), "get_api_key: read from key file");
                return Ok(key);
            }
        }

        Err(CredentialsError::MissingKey { provider: kind, env })
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Everything a provider client needs, with the key already resolved
#[derive(Clone)]
pub struct ResolvedLlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for ResolvedLlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedLlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Prompt library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding one JSON file per user
    #[serde(rename = "store-path")]
    pub store_path: PathBuf,

    /// User whose library is opened by default
    pub user: Option<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            store_path: promptstore::cli::default_store_path(),
            user: None,
        }
    }
}

/// Chat behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Literal that tells the workspace to clear the document
    #[serde(rename = "reset-marker")]
    pub reset_marker: String,

    /// Characters of each section shown to the model as prompt state
    #[serde(rename = "context-preview-chars")]
    pub context_preview_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reset_marker: DEFAULT_RESET_MARKER.to_string(),
            context_preview_chars: 100,
        }
    }
}
