//! Configuration resolution for Scribe.
//!
//! Resolved once at process start, in increasing priority:
//! 1. Built-in defaults
//! 2. Config file (JSON, optional)
//! 3. Environment variables (`SCRIBE_*`)
//! 4. CLI arguments (applied by the binary)
//!
//! The resulting [`Config`] is passed by reference into each component
//! constructor; business logic never reads the environment itself.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Secret used outside production when none is configured.
pub const DEV_JWT_SECRET: &str = "scribe-dev-secret-change-me";

/// Upper bound for any token TTL (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "testing" | "test" => Ok(Self::Testing),
            "production" | "prod" => Ok(Self::Production),
            other => Err(Error::Config(format!("unknown environment '{other}'"))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        };
        f.write_str(name)
    }
}

/// Complete Scribe configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// HTTP server and storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub database_path: Option<PathBuf>,
    /// Origins allowed by CORS. `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".to_string(),
            database_path: None,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60, // 7 days
        }
    }
}

/// Pagination limits for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// The signing secret to use.
    ///
    /// Production requires an explicit secret; other environments fall back
    /// to [`DEV_JWT_SECRET`]. An explicitly empty secret is always rejected.
    pub fn jwt_secret(&self) -> Result<&str> {
        match self.auth.jwt_secret.as_deref() {
            Some("") => Err(Error::Config("JWT secret must not be empty".into())),
            Some(secret) => Ok(secret),
            None if self.environment == Environment::Production => Err(Error::Config(
                "JWT secret must be set in production".into(),
            )),
            None => Ok(DEV_JWT_SECRET),
        }
    }

    /// Check cross-field invariants. Called after all layers are applied.
    pub fn validate(&self) -> Result<()> {
        self.jwt_secret()?;
        for (name, ttl) in [
            ("access", self.auth.access_ttl_secs),
            ("refresh", self.auth.refresh_ttl_secs),
        ] {
            if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
                return Err(Error::Config(format!(
                    "{name} token TTL {ttl}s must be within 1..={MAX_TOKEN_TTL_SECS}"
                )));
            }
        }
        if self.server.cors_origins.is_empty() {
            return Err(Error::Config("at least one CORS origin is required".into()));
        }
        let p = &self.pagination;
        if p.default_page_size == 0 || p.default_page_size > p.max_page_size {
            return Err(Error::Config(format!(
                "default page size {} must be within 1..={}",
                p.default_page_size, p.max_page_size
            )));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(p) => load_config_file(p)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Default database location (`<data dir>/scribe/scribe.db`).
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("scribe").join("scribe.db"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn parse_var<T: FromStr>(key: &str, val: &str) -> Result<T> {
    val.parse()
        .map_err(|_| Error::Config(format!("invalid value for {key}: '{val}'")))
}

/// Apply `SCRIBE_*` overrides read through `lookup`.
///
/// A malformed value is a configuration error.
fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(val) = lookup("SCRIBE_ENV") {
        config.environment = val.parse()?;
    }
    if let Some(val) = lookup("SCRIBE_JWT_SECRET") {
        config.auth.jwt_secret = Some(val);
    }
    if let Some(val) = lookup("SCRIBE_ACCESS_TTL") {
        config.auth.access_ttl_secs = parse_var("SCRIBE_ACCESS_TTL", &val)?;
    }
    if let Some(val) = lookup("SCRIBE_REFRESH_TTL") {
        config.auth.refresh_ttl_secs = parse_var("SCRIBE_REFRESH_TTL", &val)?;
    }
    if let Some(val) = lookup("SCRIBE_ADDR") {
        config.server.addr = val;
    }
    if let Some(val) = lookup("SCRIBE_DATABASE_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = lookup("SCRIBE_CORS_ORIGINS") {
        config.server.cors_origins = val
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(())
}
