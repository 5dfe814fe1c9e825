use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").expect("hostname regex is valid")
});

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "HEALTHGATE";

#[derive(Debug, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub auth: Option<AuthSection>,
    #[serde(default)]
    pub reload: Option<ReloadSection>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub body_limit_bytes: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AuthSection {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ReloadSection {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
pub fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try each enabled format in turn
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub reload: ReloadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct AuthConfig {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub timeout_ms: u64,
}

// Keep secrets out of `{:?}` output, which ends up in logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReloadConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                body_limit_bytes: 64 * 1024,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            auth: AuthConfig {
                username: "admin".to_string(),
                password: Some("admin".to_string()),
                password_hash: None,
                timeout_ms: 5_000,
            },
            reload: ReloadConfig {
                enabled: false,
                interval_secs: 30,
            },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(()),
    }
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
    ($target:expr, $source:expr, wrap) => {
        if let Some(v) = $source {
            $target = Some(v);
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        merge_raw(&mut cfg, raw);
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

/// Overlay the sections present in a parsed file onto `cfg`.
pub fn merge_raw(cfg: &mut Config, raw: RawConfigFile) {
    if let Some(server) = raw.server {
        apply_opt!(cfg.server.host, server.host);
        apply_opt!(cfg.server.port, server.port);
        apply_opt!(cfg.server.body_limit_bytes, server.body_limit_bytes);
    }
    if let Some(logging) = raw.logging {
        apply_opt!(cfg.logging.level, logging.level);
        apply_opt!(cfg.logging.json, logging.json);
    }
    if let Some(auth) = raw.auth {
        apply_opt!(cfg.auth.username, auth.username);
        apply_opt!(cfg.auth.password, auth.password, wrap);
        apply_opt!(cfg.auth.password_hash, auth.password_hash, wrap);
        apply_opt!(cfg.auth.timeout_ms, auth.timeout_ms);
    }
    if let Some(reload) = raw.reload {
        apply_opt!(cfg.reload.enabled, reload.enabled);
        apply_opt!(cfg.reload.interval_secs, reload.interval_secs);
    }
}

#[inline]
fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}_{suffix}")
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(suffix: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let key = env_key(suffix);
    match env::var(&key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Helper to parse env var as bool
#[inline]
fn env_bool(suffix: &str) -> Result<Option<bool>, ConfigError> {
    let key = env_key(suffix);
    match env::var(&key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

#[inline]
fn env_str(suffix: &str) -> Option<String> {
    env::var(env_key(suffix)).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Server
    if let Some(v) = env_str("SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16>("SERVER_PORT")? {
        cfg.server.port = v;
    }
    if let Some(v) = env_parse::<usize>("SERVER_BODY_LIMIT_BYTES")? {
        cfg.server.body_limit_bytes = v;
    }

    // Logging
    if let Some(v) = env_str("LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("LOG_JSON")? {
        cfg.logging.json = v;
    }

    // Auth
    if let Some(v) = env_str("AUTH_USERNAME") {
        cfg.auth.username = v;
    }
    if let Some(v) = env_str("AUTH_PASSWORD") {
        cfg.auth.password = Some(v);
    }
    if let Some(v) = env_str("AUTH_PASSWORD_HASH") {
        cfg.auth.password_hash = Some(v);
    }
    if let Some(v) = env_parse::<u64>("AUTH_TIMEOUT_MS")? {
        cfg.auth.timeout_ms = v;
    }

    // Reload
    if let Some(v) = env_bool("RELOAD_ENABLED")? {
        cfg.reload.enabled = v;
    }
    if let Some(v) = env_parse::<u64>("RELOAD_INTERVAL_SECS")? {
        cfg.reload.interval_secs = v;
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.port == 0 {
        return Err(ConfigError::Validation("server.port must be > 0".into()));
    }
    let host_ok = cfg.server.host.parse::<std::net::IpAddr>().is_ok()
        || HOSTNAME_REGEX.is_match(&cfg.server.host);
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid server.host: {}",
            cfg.server.host
        )));
    }
    if cfg.server.body_limit_bytes == 0 {
        return Err(ConfigError::Validation(
            "server.body_limit_bytes must be > 0".into(),
        ));
    }

    if cfg.auth.username.is_empty() {
        return Err(ConfigError::Validation(
            "auth.username must not be empty".into(),
        ));
    }
    match (&cfg.auth.password, &cfg.auth.password_hash) {
        (_, Some(hash)) if !hash.starts_with("$argon2") => {
            return Err(ConfigError::Validation(
                "auth.password_hash must be an Argon2 PHC string".into(),
            ))
        }
        (None, None) => {
            return Err(ConfigError::Validation(
                "one of auth.password or auth.password_hash must be set".into(),
            ))
        }
        _ => {}
    }
    if cfg.auth.timeout_ms == 0 {
        return Err(ConfigError::Validation("auth.timeout_ms must be > 0".into()));
    }

    if cfg.reload.interval_secs == 0 {
        return Err(ConfigError::Validation(
            "reload.interval_secs must be > 0".into(),
        ));
    }
    Ok(())
}
