//! Configuration file parser for ~/.config/article-composer/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::editor::EditorOptions;

/// Environment variable that overrides `discuss_url` from the config file.
pub const DISCUSS_URL_ENV: &str = "DISCUSS_URL";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the editorial admin API. Route paths are joined onto it.
    pub api_base_url: String,

    /// Base URL of the discussion service used for the post-publish hand-off.
    /// `DISCUSS_URL` env var takes precedence over the config file.
    pub discuss_url: Option<String>,

    /// Per-request timeout for admin API calls, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum number of reference lists kept in the cache.
    pub cache_capacity: usize,

    /// Rich-text editor setup.
    pub editor: EditorOptions,

    /// Route name overrides. Keys are route names (e.g. `admin.languages`),
    /// values are paths relative to `api_base_url`.
    pub routes: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/".to_string(),
            discuss_url: None,
            request_timeout_secs: 20,
            cache_capacity: 64,
            editor: EditorOptions::default(),
            routes: HashMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load `path` and apply the `DISCUSS_URL` override.
    ///
    /// A missing or empty file yields the defaults. Files over 1 MB are
    /// rejected. Unknown keys are logged and ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, std::env::var(DISCUSS_URL_ENV).ok())
    }

    fn load_with_env(path: &Path, discuss_env: Option<String>) -> Result<Self, ConfigError> {
        let mut config = match Self::read_capped(path)? {
            Some(content) => Self::parse(&content)?,
            None => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        };
        config.override_discuss_url(discuss_env);
        Ok(config)
    }

    /// Read at most `MAX_FILE_SIZE` bytes through a single handle. `None`
    /// if the file does not exist.
    fn read_capped(path: &Path) -> Result<Option<String>, ConfigError> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} exceeds {} bytes",
                path.display(),
                Self::MAX_FILE_SIZE
            )));
        }
        Ok(Some(content))
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "api_base_url",
                "discuss_url",
                "request_timeout_secs",
                "cache_capacity",
                "editor",
                "routes",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(api = %config.api_base_url, "Loaded configuration");
        Ok(config)
    }

    /// A non-blank `DISCUSS_URL` value replaces the file's `discuss_url`.
    fn override_discuss_url(&mut self, env: Option<String>) {
        if let Some(url) = env.filter(|v| !v.trim().is_empty()) {
            tracing::debug!(url = %url, "discuss_url taken from {}", DISCUSS_URL_ENV);
            self.discuss_url = Some(url);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8000/api/");
        assert!(config.discuss_url.is_none());
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.cache_capacity, 64);
        assert_eq!(config.editor.element_id, "tinymce-textarea");
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/article_composer_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.cache_capacity, 64);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("article_composer_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 20);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
api_base_url = "https://admin.example.com/api/"
discuss_url = "https://forum.example.com/"
request_timeout_secs = 5
cache_capacity = 8

[editor]
element_id = "body-editor"
height = 600

[routes]
"admin.articles" = "v2/articles"
"#;
        let config = Config::parse(content).unwrap();
        assert_eq!(config.api_base_url, "https://admin.example.com/api/");
        assert_eq!(
            config.discuss_url.as_deref(),
            Some("https://forum.example.com/")
        );
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.editor.element_id, "body-editor");
        assert_eq!(config.editor.height, 600);
        // untouched editor keys keep their defaults
        assert_eq!(config.editor.toolbar, "image");
        assert_eq!(
            config.routes.get("admin.articles").map(String::as_str),
            Some("v2/articles")
        );
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = Config::parse("cache_capacity = = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = Config::parse("colour = \"blue\"\ncache_capacity = 2\n").unwrap();
        assert_eq!(config.cache_capacity, 2);
    }

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_env_discuss_url_takes_precedence() {
        let path = write_config(
            "article_composer_config_test_env",
            "discuss_url = \"https://file.example.com/\"\n",
        );

        let config =
            Config::load_with_env(&path, Some("https://env.example.com/".to_string())).unwrap();
        assert_eq!(config.discuss_url.as_deref(), Some("https://env.example.com/"));

        let config = Config::load_with_env(&path, None).unwrap();
        assert_eq!(config.discuss_url.as_deref(), Some("https://file.example.com/"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_blank_env_discuss_url_falls_back_to_file() {
        let mut config = Config::parse("discuss_url = \"https://file.example.com/\"").unwrap();
        config.override_discuss_url(Some("  ".to_string()));
        assert_eq!(config.discuss_url.as_deref(), Some("https://file.example.com/"));

        let mut bare = Config::default();
        bare.override_discuss_url(None);
        assert_eq!(bare.discuss_url, None);
    }

    #[test]
    fn test_env_applies_without_config_file() {
        let path = Path::new("/tmp/article_composer_test_nonexistent_env_config.toml");
        let config =
            Config::load_with_env(path, Some("https://env.example.com/".to_string())).unwrap();
        assert_eq!(config.discuss_url.as_deref(), Some("https://env.example.com/"));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let padding = format!("# {}\n", "x".repeat(Config::MAX_FILE_SIZE as usize));
        let path = write_config("article_composer_config_test_large", &padding);

        let result = Config::load_with_env(&path, None);
        assert!(matches!(result, Err(ConfigError::TooLarge(_))));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
