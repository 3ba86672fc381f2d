//! # Configuration
//!
//! Layered application settings:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`, or `riskvault.toml` when present)
//! 3. `RISKVAULT_*` environment variables
//! 4. CLI flags (applied by the `cli` module)
//!
//! ## Environment Variables
//!
//! - `RISKVAULT_HOST`, `RISKVAULT_PORT`: bind address of the HTTP server
//! - `RISKVAULT_DATABASE`: path of the redb database
//! - `RISKVAULT_BACKEND`: `redb` or `memory`
//! - `RISKVAULT_CORS_ORIGINS`: comma-separated origins, or `*` for all
//! - `RISKVAULT_RATE_LIMIT`: requests per second, 0 disables limiting
//! - `RISKVAULT_MAX_UPLOAD_BYTES`: request body limit

use riskvault_core::{StorageBackend, VaultError, primitives::MAX_CONTENT_LENGTH};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File read when no `--config` is given and it exists in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "riskvault.toml";

// =============================================================================
// BACKEND KIND
// =============================================================================

/// Which document store to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Volatile, lost on exit.
    Memory,
    /// redb embedded database.
    #[default]
    Redb,
}

impl BackendKind {
    /// Name as accepted on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
        }
    }

    /// Open the store selected by this kind.
    pub fn open(self, database: &Path) -> Result<StorageBackend, VaultError> {
        match self {
            Self::Memory => Ok(StorageBackend::in_memory()),
            Self::Redb => StorageBackend::redb(database),
        }
    }
}

impl FromStr for BackendKind {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redb" => Ok(Self::Redb),
            other => Err(VaultError::InvalidInput(format!(
                "Unknown backend '{}', expected 'memory' or 'redb'",
                other
            ))),
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub backend: BackendKind,
    /// `None` keeps the localhost-only CORS default.
    pub cors_origins: Option<String>,
    pub rate_limit: u32,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: PathBuf::from("riskvault.redb"),
            backend: BackendKind::Redb,
            cors_origins: None,
            rate_limit: 100,
            max_upload_bytes: MAX_CONTENT_LENGTH,
        }
    }
}

impl AppConfig {
    /// Load defaults, then the TOML file, then environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `riskvault.toml` is read
    /// only if present.
    pub fn load(path: Option<&Path>) -> Result<Self, VaultError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, VaultError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            VaultError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "configuration file loaded");
        Ok(config)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, VaultError> {
        toml::from_str(text).map_err(|e| VaultError::InvalidInput(format!("Invalid config: {}", e)))
    }

    /// Apply `RISKVAULT_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), VaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RISKVAULT_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("RISKVAULT_PORT") {
            self.port = parse_env("RISKVAULT_PORT", &port)?;
        }
        if let Some(database) = lookup("RISKVAULT_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(backend) = lookup("RISKVAULT_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(origins) = lookup("RISKVAULT_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        if let Some(rate) = lookup("RISKVAULT_RATE_LIMIT") {
            self.rate_limit = parse_env("RISKVAULT_RATE_LIMIT", &rate)?;
        }
        if let Some(limit) = lookup("RISKVAULT_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_env("RISKVAULT_MAX_UPLOAD_BYTES", &limit)?;
        }
        Ok(())
    }

    /// `host:port` for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, VaultError> {
    value
        .trim()
        .parse()
        .map_err(|_| VaultError::InvalidInput(format!("Invalid value '{}' for {}", value, key)))
}

// =============================================================================
// TESTS
// =============================================================================
