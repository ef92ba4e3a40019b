use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str =
    "https://www.microburbs.com.au/report_generator/api/suburb/properties";
pub const DEFAULT_TOKEN_ENV: &str = "SUBURB_API_TOKEN";
pub const DEFAULT_PROPERTY_TYPE: &str = "all";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api: ApiSection,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    pub name: String,
    pub base_url: String,
    pub auth_token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    // Optional environment variable name holding the bearer token
    pub env_auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_property_type: String,
}

fn default_timeout_secs() -> u64 {
    20
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_property_type: DEFAULT_PROPERTY_TYPE.to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api: ApiSection {
                name: "microburbs".to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                auth_token: "test".to_string(),
                timeout_secs: default_timeout_secs(),
                env_auth_token: None,
            },
            query: QueryConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read API config file: {}", path))?;

        let mut config: ApiConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse API config file: {}", path))?;

        config.load_token_override();
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to the built-in
    /// Microburbs defaults. The token override is applied either way.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at {}, using built-in defaults", path);
        let mut config = Self::default();
        config.load_token_override();
        Ok(config)
    }

    pub fn load_token_override(&mut self) {
        self.apply_token_override(|name| env::var(name).ok());
    }

    /// Replaces the token with the value `lookup` returns for the configured
    /// variable name, ignoring blank values.
    pub fn apply_token_override(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let token_var = self
            .api
            .env_auth_token
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());

        if let Some(token) = lookup(&token_var) {
            if !token.trim().is_empty() {
                info!("Using bearer token from environment variable {}", token_var);
                self.api.auth_token = token.trim().to_string();
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(anyhow::anyhow!("API base_url cannot be empty"));
        }

        if self.api.auth_token.is_empty() {
            return Err(anyhow::anyhow!("API auth_token cannot be empty"));
        }

        if self.api.timeout_secs == 0 {
            return Err(anyhow::anyhow!("API timeout_secs must be greater than zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.auth_token, "test");
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.query.default_property_type, "all");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_with_defaults_for_optional_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
name = "staging"
base_url = "http://localhost:8080/properties"
auth_token = "abc"
env_auth_token = "SUBURB_INSIGHTS_TEST_UNSET_TOKEN"
"#
        )
        .unwrap();

        let config = ApiConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api.name, "staging");
        assert_eq!(config.api.auth_token, "abc");
        assert_eq!(config.api.timeout_secs, 20);
        assert_eq!(config.query.default_property_type, "all");
    }

    #[test]
    fn test_env_token_override() {
        let vars = HashMap::from([
            ("CUSTOM_TOKEN".to_string(), " from-env ".to_string()),
            (DEFAULT_TOKEN_ENV.to_string(), "default-var".to_string()),
        ]);
        let lookup = |name: &str| vars.get(name).cloned();

        let mut config = ApiConfig::default();
        config.api.env_auth_token = Some("CUSTOM_TOKEN".to_string());
        config.apply_token_override(lookup);
        assert_eq!(config.api.auth_token, "from-env");

        let mut config = ApiConfig::default();
        config.apply_token_override(lookup);
        assert_eq!(config.api.auth_token, "default-var");
    }

    #[test]
    fn test_blank_or_missing_env_token_keeps_configured_one() {
        let vars = HashMap::from([("BLANK_TOKEN".to_string(), "   ".to_string())]);

        let mut config = ApiConfig::default();
        config.api.env_auth_token = Some("BLANK_TOKEN".to_string());
        config.apply_token_override(|name| vars.get(name).cloned());
        assert_eq!(config.api.auth_token, "test");

        config.api.env_auth_token = Some("UNSET_TOKEN".to_string());
        config.apply_token_override(|name| vars.get(name).cloned());
        assert_eq!(config.api.auth_token, "test");
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = ApiConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ApiConfig::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config.api.name, "microburbs");
    }
}
