//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\livedj\config.toml
//! - macOS: ~/Library/Application Support/livedj/config.toml
//! - Linux: ~/.config/livedj/config.toml
//!
//! It holds the chosen providers, one secret per provider, and tuning for the
//! player and scheduler. A session may only start once [`Config::is_complete`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which provider backs each gateway
    pub providers: ProviderConfig,

    /// API secrets keyed by provider
    pub credentials: Credentials,

    /// Playback device settings
    pub player: PlayerConfig,

    /// Scheduler timing and history settings
    pub scheduler: SchedulerConfig,
}

/// Supported recommendation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationProvider {
    #[default]
    Claude,
}

impl RecommendationProvider {
    /// Credential map key
    pub fn key(self) -> &'static str {
        match self {
            Self::Claude => "claude",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Claude => "Claude (Anthropic)",
        }
    }
}

/// Supported media resolution providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionProvider {
    #[default]
    #[serde(rename = "youtube")]
    YouTube,
}

impl ResolutionProvider {
    /// Credential map key
    pub fn key(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
        }
    }
}

impl std::str::FromStr for RecommendationProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            other => Err(format!("unknown recommendation provider '{}' (expected: claude)", other)),
        }
    }
}

impl std::str::FromStr for ResolutionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(Self::YouTube),
            other => Err(format!("unknown resolution provider '{}' (expected: youtube)", other)),
        }
    }
}

/// Provider selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub recommendation: RecommendationProvider,
    pub resolution: ResolutionProvider,
}

/// API secrets, one per provider key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    /// Secret for a provider, ignoring blank entries
    pub fn get(&self, provider: &str) -> Option<&str> {
        self.0
            .get(provider)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, provider: impl Into<String>, secret: impl Into<String>) {
        self.0.insert(provider.into(), secret.into().trim().to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Playback device settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// mpv executable (name on PATH or absolute path)
    pub mpv_path: PathBuf,

    /// Extra command-line arguments passed to mpv
    pub extra_args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mpv_path: PathBuf::from("mpv"),
            extra_args: Vec::new(),
        }
    }
}

/// Scheduler timing and history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum retained history entries (also the history sent per request)
    pub history_limit: usize,

    /// Delay before re-running recommend+resolve after an empty result set
    pub no_results_retry_ms: u64,

    /// Pause before reconciling once every media candidate has failed
    pub reconcile_pause_ms: u64,

    /// Playback position polling cadence
    pub progress_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            no_results_retry_ms: 2000,
            reconcile_pause_ms: 1000,
            progress_interval_ms: 500,
        }
    }
}

impl SchedulerConfig {
    pub fn no_results_retry(&self) -> Duration {
        Duration::from_millis(self.no_results_retry_ms)
    }

    pub fn reconcile_pause(&self) -> Duration {
        Duration::from_millis(self.reconcile_pause_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }
}

impl Config {
    /// Both chosen providers have a credential.
    pub fn is_complete(&self) -> bool {
        self.missing_credentials().is_empty()
    }

    /// Display names of chosen providers that still lack a credential.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.credentials.get(self.providers.recommendation.key()).is_none() {
            missing.push(self.providers.recommendation.name());
        }
        if self.credentials.get(self.providers.resolution.key()).is_none() {
            missing.push(self.providers.resolution.name());
        }
        missing
    }

    /// Apply a settings form: provider choices plus one key for each.
    ///
    /// Existing secrets for other providers are kept. Fails without
    /// modifying `self` unless both chosen providers end up with a key.
    pub fn apply_settings(
        &mut self,
        recommendation: RecommendationProvider,
        recommendation_key: &str,
        resolution: ResolutionProvider,
        resolution_key: &str,
    ) -> Result<(), ConfigError> {
        let mut updated = self.clone();
        updated.providers.recommendation = recommendation;
        updated.providers.resolution = resolution;
        updated.credentials.set(recommendation.key(), recommendation_key);
        updated.credentials.set(resolution.key(), resolution_key);

        if !updated.is_complete() {
            return Err(ConfigError::MissingCredentials(
                updated.missing_credentials().join(", "),
            ));
        }

        *self = updated;
        Ok(())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("livedj"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit path (same fallback rules as [`load`])
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

/// Save configuration to an explicit path
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Both API keys are required (missing: {0})")]
    MissingCredentials(String),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[providers]"));
        assert!(toml.contains("recommendation = \"claude\""));
        assert!(toml.contains("resolution = \"youtube\""));
        assert!(toml.contains("[player]"));
        assert!(toml.contains("[scheduler]"));
    }

    #[test]
    fn test_default_is_incomplete() {
        let config = Config::default();
        assert!(!config.is_complete());
        assert_eq!(
            config.missing_credentials(),
            vec!["Claude (Anthropic)", "YouTube"]
        );
    }

    #[test]
    fn test_blank_credential_does_not_count() {
        let mut config = Config::default();
        config.credentials.set("claude", "   ");
        config.credentials.set("youtube", "AIza");
        assert!(!config.is_complete());
        assert_eq!(config.missing_credentials(), vec!["Claude (Anthropic)"]);
    }

    #[test]
    fn test_apply_settings_requires_both_keys() {
        let mut config = Config::default();
        let err = config
            .apply_settings(
                RecommendationProvider::Claude,
                "sk-1",
                ResolutionProvider::YouTube,
                "",
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials(_)));
        assert!(config.credentials.get("claude").is_none());

        config
            .apply_settings(
                RecommendationProvider::Claude,
                " sk-1 ",
                ResolutionProvider::YouTube,
                "AIza",
            )
            .unwrap();
        assert!(config.is_complete());
        assert_eq!(config.credentials.get("claude"), Some("sk-1"));
    }

    #[test]
    fn test_provider_names_parse() {
        assert_eq!(" Claude ".parse::<RecommendationProvider>(), Ok(RecommendationProvider::Claude));
        assert_eq!("youtube".parse::<ResolutionProvider>(), Ok(ResolutionProvider::YouTube));
        assert!("openai".parse::<RecommendationProvider>().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[credentials]
claude = "sk-abc"
youtube = "AIza-xyz"

[scheduler]
history_limit = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.is_complete());
        assert_eq!(config.scheduler.history_limit, 10);
        assert_eq!(config.scheduler.no_results_retry(), Duration::from_secs(2));
        assert_eq!(config.player.mpv_path, PathBuf::from("mpv"));
        assert_eq!(config.providers.resolution, ResolutionProvider::YouTube);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.credentials.set("claude", "sk-roundtrip");
        config.credentials.set("youtube", "AIza-roundtrip");
        config.player.extra_args.push("--volume=50".to_string());

        save_to(&config, &path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());

        let loaded = load_from(&path);
        assert_eq!(loaded.credentials, config.credentials);
        assert_eq!(loaded.player.extra_args, vec!["--volume=50".to_string()]);
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[providers]\nrecommendation = \"gpt\"\n").unwrap();

        let config = load_from(&path);
        assert_eq!(config.providers.recommendation, RecommendationProvider::Claude);
        assert!(!config.is_complete());
    }
}
