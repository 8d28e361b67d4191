//! Multi-tier TOML configuration for Sift.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use serde::{Deserialize, Serialize};
use sift_api::{ClientConfig, TransportOptions};
use sift_types::{ConfigError, Credential, ErrorPolicy, SearchOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The default streaming search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://sourcegraph.com/.api/search/stream";

/// Resolved configuration for a Sift run.
#[derive(Debug, Clone)]
pub struct SiftConfig {
    pub base_url: String,
    pub credential: Credential,
    pub error_policy: ErrorPolicy,
    /// Idle limit between response chunks, not a deadline for the search.
    pub read_timeout: Option<Duration>,
    pub search: SearchOptions,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub search: SearchOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub oauth_token: Option<String>,
    /// End the call on the first bad frame instead of skipping it.
    pub strict: Option<bool>,
    /// Seconds to wait for the next chunk of a result stream. A search that
    /// keeps producing results is never cut off by this.
    pub timeout_secs: Option<u64>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub oauth_token: Option<String>,
    pub strict: Option<bool>,
}

/// Environment values, read once so resolution stays a pure function.
#[derive(Debug, Clone, Default)]
struct EnvSettings {
    base_url: Option<String>,
    access_token: Option<String>,
    oauth_token: Option<String>,
}

impl EnvSettings {
    fn from_env() -> Self {
        Self {
            base_url: std::env::var("SIFT_BASE_URL").ok(),
            access_token: std::env::var("SIFT_ACCESS_TOKEN").ok(),
            oauth_token: std::env::var("SIFT_OAUTH_TOKEN").ok(),
        }
    }
}

impl SiftConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.sift/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        resolve(overrides, EnvSettings::from_env(), settings, config_dir)
    }

    /// Client configuration for `sift_api::SearchClient`.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone(), self.credential.clone())
            .with_error_policy(self.error_policy)
            .with_transport_options(TransportOptions {
                read_timeout: self.read_timeout,
                user_agent: Some(format!("sift/{}", env!("CARGO_PKG_VERSION"))),
                ..TransportOptions::default()
            })
    }
}

fn resolve(
    overrides: CliOverrides,
    env: EnvSettings,
    settings: SettingsFile,
    config_dir: PathBuf,
) -> Result<SiftConfig, ConfigError> {
    let base_url = overrides
        .base_url
        .or(env.base_url)
        .or(settings.api.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Credentials resolve as a pair from the highest tier that sets either one,
    // so a CLI access token is not combined with an OAuth token from a file.
    // Blank values do not count as set.
    let tiers = [
        (overrides.access_token, overrides.oauth_token),
        (env.access_token, env.oauth_token),
        (settings.api.access_token, settings.api.oauth_token),
    ];
    let (access_token, oauth_token) = tiers
        .into_iter()
        .map(|(access, oauth)| (non_blank(access), non_blank(oauth)))
        .find(|(access, oauth)| access.is_some() || oauth.is_some())
        .unwrap_or_default();
    let credential = Credential::from_parts(access_token, oauth_token).map_err(|e| match e {
        ConfigError::MissingCredential { .. } => ConfigError::MissingCredential {
            hint: "set SIFT_ACCESS_TOKEN or SIFT_OAUTH_TOKEN, or add one to ~/.sift/config.toml"
                .into(),
        },
        other => other,
    })?;

    let strict = overrides.strict.or(settings.api.strict).unwrap_or(false);

    Ok(SiftConfig {
        base_url,
        credential,
        error_policy: ErrorPolicy::from_strict(strict),
        read_timeout: settings.api.timeout_secs.map(Duration::from_secs),
        search: settings.search,
        config_dir,
    })
}

fn non_blank(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

/// Get the Sift config directory path (~/.sift/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SIFT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sift")
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
