use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::translation::batch::DispatchOrder;
use crate::translation::cache::{DEFAULT_EXPIRY_DAYS, DEFAULT_MAX_ENTRIES};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO, optionally with region)
    pub source_language: String,

    /// Target language code (ISO, optionally with region)
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch planning settings
    #[serde(default)]
    pub batching: BatchingConfig,

    /// Translation cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Swap special whitespace for placeholders before sending text
    #[serde(default = "default_true")]
    pub protect_special_characters: bool,

    /// Time budget for translating one document, unlimited when absent
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent requests, model recommendation when absent
    #[serde(default)]
    pub concurrent_requests: Option<usize>,

    // @field: Max chars per batch request, model budget when absent
    #[serde(default)]
    pub max_chars_per_request: Option<usize>,

    // @field: Max paragraphs per batch request, model limit when absent
    #[serde(default)]
    pub max_batch_size: Option<usize>,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                concurrent_requests: None,
                max_chars_per_request: None,
                max_batch_size: None,
                timeout_secs: default_timeout_secs(),
                rate_limit: default_openai_rate_limit(),
            },
            TranslationProvider::LMStudio => Self {
                provider_type: "lmstudio".to_string(),
                model: default_lmstudio_model(),
                api_key: String::new(),
                endpoint: default_lmstudio_endpoint(),
                concurrent_requests: Some(default_lmstudio_concurrent_requests()),
                max_chars_per_request: None,
                max_batch_size: None,
                timeout_secs: default_lmstudio_timeout_secs(),
                rate_limit: default_lmstudio_rate_limit(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Batch planning settings
///
/// Limits left unset come from the active provider, then from the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchingConfig {
    /// Maximum paragraphs per batch
    #[serde(default)]
    pub max_batch_size: Option<usize>,

    /// Maximum characters per batch
    #[serde(default)]
    pub max_chars_per_batch: Option<usize>,

    /// Keep body, header and footer paragraphs in separate batches
    #[serde(default = "default_true")]
    pub group_by_location: bool,

    /// Order in which batches are sent
    #[serde(default)]
    pub dispatch_order: DispatchOrder,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: None,
            max_chars_per_batch: None,
            group_by_location: true,
            dispatch_order: DispatchOrder::default(),
        }
    }
}

/// Translation cache settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    /// Whether translations are cached at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Snapshot location, `~/.doctwin/translation_cache.json` when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum number of cached translations
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,

    /// Days after which a cached translation is dropped
    #[serde(default = "default_cache_expiry_days")]
    pub expiry_days: i64,

    /// Load the snapshot before a run and write it back after
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_entries: default_cache_max_entries(),
            expiry_days: default_cache_expiry_days(),
            persist: true,
        }
    }
}

impl CacheConfig {
    /// Snapshot location, falling back to the home directory default
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".doctwin")
                .join("translation_cache.json"),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_lmstudio_timeout_secs() -> u64 {
    120
}

fn default_lmstudio_concurrent_requests() -> usize {
    4
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_cache_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_cache_expiry_days() -> i64 {
    DEFAULT_EXPIRY_DAYS
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_lmstudio_model() -> String {
    // Placeholder; users should set to the loaded model name in LM Studio
    "local-model".to_string()
}

fn default_openai_rate_limit() -> Option<u32> {
    None
}

// LM Studio is local; do not enforce rate limiting by default
fn default_lmstudio_rate_limit() -> Option<u32> {
    None
}

impl Config {
    /// Load the configuration from `path`, writing a default file first when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = FileManager::read_to_string(path)?;
            return serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            FileManager::ensure_dir(parent)?;
        }
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_language_code(&self.source_language)
            .with_context(|| format!("Invalid source language: {}", self.source_language))?;
        crate::language_utils::validate_language_code(&self.target_language)
            .with_context(|| format!("Invalid target language: {}", self.target_language))?;

        if self.translation.provider == TranslationProvider::OpenAI && self.translation.get_api_key().is_empty() {
            return Err(anyhow!("Translation API key is required for OpenAI provider"));
        }

        if self.batching.max_batch_size == Some(0) {
            return Err(anyhow!("batching.max_batch_size must be positive"));
        }
        if self.batching.max_chars_per_batch == Some(0) {
            return Err(anyhow!("batching.max_chars_per_batch must be positive"));
        }
        if self.cache.max_entries == 0 {
            return Err(anyhow!("cache.max_entries must be positive"));
        }
        if self.cache.expiry_days <= 0 {
            return Err(anyhow!("cache.expiry_days must be positive"));
        }
        if self.run_timeout_secs == Some(0) {
            return Err(anyhow!("run_timeout_secs must be positive"));
        }
        if let Some(provider) = self.translation.get_active_provider_config() {
            if provider.concurrent_requests == Some(0) {
                return Err(anyhow!("concurrent_requests must be positive"));
            }
        }

        let endpoint = self.translation.get_endpoint();
        let parsed = url::Url::parse(&endpoint).with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("Endpoint must use http or https: {}", endpoint));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "NL".to_string(),
            target_language: "EN-US".to_string(),
            translation: TranslationConfig::default(),
            batching: BatchingConfig::default(),
            cache: CacheConfig::default(),
            protect_special_characters: true,
            run_timeout_secs: None,
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get the active provider configuration for updates
    pub fn get_active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter_mut().find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::LMStudio => default_lmstudio_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // LM Studio doesn't use API keys
        String::new()
    }

    /// Set the API key of the active provider, adding its entry when missing
    pub fn set_api_key(&mut self, api_key: &str) {
        if self.get_active_provider_config().is_none() {
            self.available_providers.push(ProviderConfig::new(self.provider.clone()));
        }
        if let Some(provider_config) = self.get_active_provider_config_mut() {
            provider_config.api_key = api_key.to_string();
        }
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::LMStudio => default_lmstudio_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the rate limit for the active provider
    pub fn get_rate_limit(&self) -> Option<u32> {
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.rate_limit;
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_rate_limit(),
            TranslationProvider::LMStudio => default_lmstudio_rate_limit(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::LMStudio),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
