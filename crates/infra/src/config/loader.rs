//! Reads [`Config`] from `PLANORA_*` environment variables, or from a JSON or
//! TOML file when the environment does not name a base URL.
//!
//! | Variable | Field |
//! | --- | --- |
//! | `PLANORA_API_BASE_URL` (required) | `api.base_url` |
//! | `PLANORA_API_TIMEOUT_SECS` | `api.timeout_secs` |
//! | `PLANORA_API_USER_AGENT` | `api.user_agent` |
//! | `PLANORA_CACHE_LOOKBACK_DAYS` | `cache.default_lookback_days` |
//! | `PLANORA_CACHE_LOOKAHEAD_DAYS` | `cache.default_lookahead_days` |
//! | `PLANORA_LOG_LEVEL` | `logging.level` |
//! | `PLANORA_LOG_JSON` | `logging.json` |
//!
//! Files are looked up by [`probe_config_paths`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use planora_domain::constants::{
    ENV_API_BASE_URL, ENV_API_TIMEOUT_SECS, ENV_API_USER_AGENT, ENV_CACHE_LOOKAHEAD_DAYS,
    ENV_CACHE_LOOKBACK_DAYS, ENV_LOG_JSON, ENV_LOG_LEVEL,
};
use planora_domain::{ApiConfig, CacheConfig, Config, LoggingConfig, PlanoraError, Result};

/// File names tried in each probed directory, in order.
const CONFIG_FILE_NAMES: [&str; 4] = ["config.json", "config.toml", "planora.json", "planora.toml"];

/// How far up from the working directory (and the executable) to look.
const PARENT_LEVELS: usize = 2;

/// Environment first, then the first config file found on disk.
///
/// # Errors
/// `PlanoraError::Config` when neither source yields a valid config.
pub fn load() -> Result<Config> {
    load_from_env().or_else(|env_err| {
        tracing::debug!(error = %env_err, "environment config incomplete, probing files");
        load_from_file(None)
    })
}

/// Build a config from `PLANORA_*` variables.
///
/// # Errors
/// `PlanoraError::Config` if `PLANORA_API_BASE_URL` is unset or any variable
/// fails to parse.
pub fn load_from_env() -> Result<Config> {
    let api_defaults = ApiConfig::default();
    let cache_defaults = CacheConfig::default();
    let logging_defaults = LoggingConfig::default();

    let base_url = std::env::var(ENV_API_BASE_URL).map_err(|_| {
        PlanoraError::Config(format!("{ENV_API_BASE_URL} is not set"))
    })?;

    let config = Config {
        api: ApiConfig {
            base_url,
            timeout_secs: env_parse(ENV_API_TIMEOUT_SECS, api_defaults.timeout_secs)?,
            user_agent: std::env::var(ENV_API_USER_AGENT).ok(),
        },
        cache: CacheConfig {
            default_lookback_days: env_parse(
                ENV_CACHE_LOOKBACK_DAYS,
                cache_defaults.default_lookback_days,
            )?,
            default_lookahead_days: env_parse(
                ENV_CACHE_LOOKAHEAD_DAYS,
                cache_defaults.default_lookahead_days,
            )?,
        },
        logging: LoggingConfig {
            level: std::env::var(ENV_LOG_LEVEL).unwrap_or(logging_defaults.level),
            json: env_bool(ENV_LOG_JSON, logging_defaults.json),
        },
    };

    tracing::info!("configuration loaded from environment");
    validate(config)
}

/// Read a config file. `None` means "use [`probe_config_paths`]".
///
/// # Errors
/// `PlanoraError::Config` if the file is missing, unreadable, in an unknown
/// format, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) if path.exists() => path,
        Some(path) => {
            return Err(PlanoraError::Config(format!(
                "config file not found: {}",
                path.display()
            )))
        }
        None => probe_config_paths().ok_or_else(|| {
            PlanoraError::Config("no config file found in any probed directory".to_string())
        })?,
    };

    tracing::info!(path = %path.display(), "loading configuration file");
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        PlanoraError::Config(format!("cannot read {}: {e}", path.display()))
    })?;

    validate(parse_config(&contents, &path)?)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(contents)
            .map_err(|e| PlanoraError::Config(format!("invalid TOML in {}: {e}", path.display()))),
        Some("json") | None => serde_json::from_str(contents)
            .map_err(|e| PlanoraError::Config(format!("invalid JSON in {}: {e}", path.display()))),
        Some(other) => Err(PlanoraError::Config(format!("unsupported config format: {other}"))),
    }
}

/// Reject values the client cannot run with.
fn validate(config: Config) -> Result<Config> {
    let url = url::Url::parse(&config.api.base_url).map_err(|e| {
        PlanoraError::Config(format!("invalid API base URL {:?}: {e}", config.api.base_url))
    })?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(PlanoraError::Config(format!(
            "API base URL must be http(s), got {}",
            url.scheme()
        )));
    }
    if config.api.timeout_secs == 0 {
        return Err(PlanoraError::Config("API timeout must be at least one second".into()));
    }
    if config.logging.level.trim().is_empty() {
        return Err(PlanoraError::Config("log level must not be empty".into()));
    }
    Ok(config)
}

/// First existing config file, searching the working directory, its
/// parents, then the executable's directory and its parents.
pub fn probe_config_paths() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf));
    let roots = std::env::current_dir().ok().into_iter().chain(exe_dir);

    roots
        .flat_map(|root| {
            root.ancestors().take(PARENT_LEVELS + 1).map(Path::to_path_buf).collect::<Vec<_>>()
        })
        .flat_map(|dir| CONFIG_FILE_NAMES.map(|name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else set is
/// false.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

/// Parse an optional environment variable, falling back to `default`.
///
/// # Errors
/// Returns `PlanoraError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| PlanoraError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
