//! Configuration file parser for ~/.config/headlines/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`,
//! and any subset of keys can be specified. The API key can also come from
//! the `HEADLINES_API_KEY` environment variable, which takes precedence over
//! the file.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable consulted before the `api_key` config entry.
pub const API_KEY_ENV: &str = "HEADLINES_API_KEY";

const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `api_key` to prevent secret leakage in logs,
/// error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// News API key (alternative to the HEADLINES_API_KEY env var).
    /// Env var takes precedence over config file.
    pub api_key: Option<String>,

    /// Two-letter country code sent with every request.
    pub country: String,

    /// Category used for the initial load (e.g. "general", "technology").
    pub default_category: String,

    /// Base URL of the headlines service.
    pub endpoint: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            country: "us".to_string(),
            default_category: "general".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Mask api_key in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("country", &self.country)
            .field("default_category", &self.default_category)
            .field("endpoint", &self.endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// A missing or empty file is not an error: both yield the defaults,
    /// since every setting is optional. Malformed TOML and oversized files
    /// are errors. Keys this version does not know are accepted with a
    /// warning, so a config written for a newer release still loads.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // A file past the cap is not a config; refuse it without reading
        // it into memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file absent, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // The file can vanish between the metadata call and the read.
                tracing::debug!(path = %path.display(), "Config file vanished mid-load, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Empty config file, using defaults");
            return Ok(Self::default());
        }

        // Serde drops unmatched keys without a trace; scan the raw table
        // so a misspelled key at least shows up in the log.
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "api_key",
                "country",
                "default_category",
                "endpoint",
                "request_timeout_secs",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Ignoring unrecognized config key");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            country = %config.country,
            default_category = %config.default_category,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Resolve the API key: env var first, then the config file entry.
    ///
    /// Returns `None` when neither source provides a non-empty key.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
            .map(SecretString::from)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.country, "us");
        assert_eq!(config.default_category, "general");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/headlines_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.country, "us");
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("headlines_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_category, "general");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("headlines_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "default_category = \"technology\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_category, "technology");
        assert_eq!(config.country, "us"); // default
        assert_eq!(config.request_timeout_secs, 30); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("headlines_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
api_key = "test-key-123"
country = "gb"
default_category = "business"
endpoint = "https://newsapi.example.com/v2"
request_timeout_secs = 10
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("test-key-123"));
        assert_eq!(config.country, "gb");
        assert_eq!(config.default_category, "business");
        assert_eq!(config.endpoint, "https://newsapi.example.com/v2");
        assert_eq!(config.request_timeout_secs, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("headlines_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("headlines_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
country = "de"
totally_fake_key = "should not fail"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.country, "de");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("headlines_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        // request_timeout_secs should be an integer, not a string
        std::fs::write(&path, "request_timeout_secs = \"soon\"\n").unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("headlines_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::TooLarge(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            api_key: Some("super-secret-key-12345".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(
            !debug_output.contains("super-secret-key-12345"),
            "Debug output should not contain the API key"
        );
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should show [REDACTED] for API key"
        );
    }

    #[test]
    fn test_api_key_from_file_when_env_unset() {
        // Skipped silently if the process env defines HEADLINES_API_KEY,
        // to avoid cross-test interference from mutating the environment.
        let config = Config {
            api_key: Some("file-key".to_string()),
            ..Config::default()
        };
        if std::env::var(API_KEY_ENV).is_err() {
            let key = config.api_key().expect("key should resolve from file");
            assert_eq!(key.expose_secret(), "file-key");
        }
    }

    #[test]
    fn test_api_key_none_when_unconfigured() {
        let config = Config::default();
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(config.api_key().is_none());
        }
    }
}
