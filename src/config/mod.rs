//! Configuration management.
//!
//! Settings are layered: built-in defaults (seeded from `HIANIME_API_BASE`,
//! `USER_AGENT` and `REQUEST_TIMEOUT`), then an optional TOML file, then
//! `HIANIME_MCP_*` environment variables (`__` separates nested keys, e.g.
//! `HIANIME_MCP_HTTP__TIMEOUT_SECS=10`).
//!
//! ```toml
//! [hianime]
//! base_url = "https://hianime-api-b6ix.onrender.com"
//! user_agent = "HiAnime-MCP-Server/1.0"
//!
//! [mal]
//! api_base = "https://api.myanimelist.net/v2"
//! oauth_base = "https://myanimelist.net/v1/oauth2"
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! ```
//!
//! MAL client ids, secrets and tokens are deliberately absent: every MAL tool
//! receives them as call arguments.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_HIANIME_BASE: &str = "https://hianime-api-b6ix.onrender.com";
const DEFAULT_USER_AGENT: &str = "HiAnime-MCP-Server/1.0";
const DEFAULT_MAL_API_BASE: &str = "https://api.myanimelist.net/v2";
const DEFAULT_MAL_OAUTH_BASE: &str = "https://myanimelist.net/v1/oauth2";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HiAnime API settings
    #[serde(default)]
    pub hianime: HiAnimeConfig,

    /// MyAnimeList endpoints
    #[serde(default)]
    pub mal: MalConfig,

    /// HTTP client settings shared by both providers
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Reject settings that would make every upstream call fail
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "http.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "http.connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// HiAnime REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiAnimeConfig {
    /// Base URL of the HiAnime API (no trailing slash)
    #[serde(default = "default_hianime_base")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HiAnimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_hianime_base(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_hianime_base() -> String {
    std::env::var("HIANIME_API_BASE").unwrap_or_else(|_| DEFAULT_HIANIME_BASE.to_string())
}

fn default_user_agent() -> String {
    std::env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string())
}

/// MyAnimeList endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalConfig {
    /// REST API base, e.g. `https://api.myanimelist.net/v2`
    #[serde(default = "default_mal_api_base")]
    pub api_base: String,

    /// OAuth2 base holding the `authorize` and `token` endpoints
    #[serde(default = "default_mal_oauth_base")]
    pub oauth_base: String,
}

impl Default for MalConfig {
    fn default() -> Self {
        Self {
            api_base: default_mal_api_base(),
            oauth_base: default_mal_oauth_base(),
        }
    }
}

fn default_mal_api_base() -> String {
    DEFAULT_MAL_API_BASE.to_string()
}

fn default_mal_oauth_base() -> String {
    DEFAULT_MAL_OAUTH_BASE.to_string()
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    std::env::var("REQUEST_TIMEOUT")
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| *secs >= 1.0)
        .map(|secs| secs.round() as u64)
        .unwrap_or(30)
}

fn default_connect_timeout() -> u64 {
    10
}

/// Load configuration from a file, layered over defaults and under the environment
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    build_config(Some(path))
}

/// Get the configuration from defaults and `HIANIME_MCP_*` environment variables
pub fn get_config() -> Result<Config, config::ConfigError> {
    build_config(None)
}

fn build_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder =
        config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let config: Config = builder
        .add_source(
            config::Environment::with_prefix("HIANIME_MCP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Look for a config file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("hianime-mcp.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("hianime-mcp").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mal.api_base, DEFAULT_MAL_API_BASE);
        assert_eq!(config.mal.oauth_base, DEFAULT_MAL_OAUTH_BASE);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert!(config.http.timeout_secs >= 1);
    }

    #[test]
    fn test_load_config_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[hianime]
base_url = "http://localhost:4000"

[http]
timeout_secs = 5
"#;
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.hianime.base_url, "http://localhost:4000");
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.mal.api_base, DEFAULT_MAL_API_BASE);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\ntimeout_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.http.connect_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/hianime-mcp.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(load_config(&path).is_err());
    }
}
