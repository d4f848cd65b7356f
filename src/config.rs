use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::provider::ProviderKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub sanity: SanitySettings,
    #[serde(default)]
    pub strapi: StrapiSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Config(format!("Unknown environment: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Overrides the environment default when set.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitySettings {
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub dataset: Option<String>,

    #[serde(default = "default_sanity_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_use_cdn")]
    pub use_cdn: bool,

    /// Replaces `https://<project>.api.sanity.io`; used for proxies and tests.
    #[serde(default)]
    pub api_host: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrapiSettings {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {}", path.as_ref().display(), e))
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus `.env` and process environment, no file.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location when it
    /// exists, else from the environment alone.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_with_env(path);
        }

        match Self::config_file() {
            Ok(default) if default.exists() => Self::load_with_env(default),
            _ => Self::from_env(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_seconds == 0 {
            return Err(Error::Config("HTTP timeout must be greater than 0".to_string()));
        }

        if let Some(url) = &self.strapi.url {
            url::Url::parse(url)
                .map_err(|e| Error::Config(format!("Invalid Strapi URL {}: {}", url, e)))?;
        }

        if let Some(host) = &self.sanity.api_host {
            url::Url::parse(host)
                .map_err(|e| Error::Config(format!("Invalid Sanity API host {}: {}", host, e)))?;
        }

        Ok(())
    }

    /// Cache lifetime: explicit setting, else short in development and one
    /// hour in production.
    pub fn cache_ttl(&self) -> Duration {
        let seconds = self.cache.ttl_seconds.unwrap_or(match self.environment {
            Environment::Development => 60,
            Environment::Production => 3600,
        });
        Duration::from_secs(seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // A missing .env file is normal
        let _ = dotenvy::dotenv();

        if let Some(provider) = env_var("CMS_PROVIDER") {
            self.provider = provider.parse()?;
        }

        if let Some(environment) = env_var("APP_ENV") {
            self.environment = environment.parse()?;
        }

        if let Some(ttl) = env_var("CMS_CACHE_TTL") {
            self.cache.ttl_seconds = Some(parse_env("CMS_CACHE_TTL", &ttl)?);
        }

        if let Some(timeout) = env_var("CMS_HTTP_TIMEOUT") {
            self.http.timeout_seconds = parse_env("CMS_HTTP_TIMEOUT", &timeout)?;
        }

        if let Some(project_id) = env_var("SANITY_PROJECT_ID") {
            self.sanity.project_id = Some(project_id);
        }

        if let Some(dataset) = env_var("SANITY_DATASET") {
            self.sanity.dataset = Some(dataset);
        }

        if let Some(api_version) = env_var("SANITY_API_VERSION") {
            self.sanity.api_version = api_version;
        }

        if let Some(token) = env_var("SANITY_API_TOKEN") {
            self.sanity.token = Some(token);
        }

        if let Some(use_cdn) = env_var("SANITY_USE_CDN") {
            self.sanity.use_cdn = parse_env("SANITY_USE_CDN", &use_cdn)?;
        }

        if let Some(host) = env_var("SANITY_API_HOST") {
            self.sanity.api_host = Some(host);
        }

        if let Some(url) = env_var("STRAPI_URL") {
            self.strapi.url = Some(url);
        }

        if let Some(token) = env_var("STRAPI_API_TOKEN") {
            self.strapi.token = Some(token);
        }

        if let Some(level) = env_var("AGRO_CONTENT_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("agro-content"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

/// Held by tests that set process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

/// Non-empty value of an environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", name, value)))
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SanitySettings {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: None,
            api_version: default_sanity_api_version(),
            token: None,
            use_cdn: default_use_cdn(),
            api_host: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_timeout() -> u64 { 30 }
fn default_user_agent() -> String {
    format!("agro-content/{}", env!("CARGO_PKG_VERSION"))
}
fn default_sanity_api_version() -> String { "2024-01-01".to_string() }
fn default_use_cdn() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
