//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Remote schedule service
pub const DEFAULT_API_BASE_URL: &str = "https://api.planora.app";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// Endpoint paths, relative to the API base URL
pub const ENDPOINT_FETCH: &str = "fetch";
pub const ENDPOINT_CREATE: &str = "create";
pub const ENDPOINT_UPDATE: &str = "update";
pub const ENDPOINT_DELETE: &str = "delete";
pub const ENDPOINT_RESCHEDULE: &str = "reschedule";

// Environment variables read by the config loader
pub const ENV_API_BASE_URL: &str = "PLANORA_API_BASE_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "PLANORA_API_TIMEOUT_SECS";
pub const ENV_API_USER_AGENT: &str = "PLANORA_API_USER_AGENT";
pub const ENV_CACHE_LOOKBACK_DAYS: &str = "PLANORA_CACHE_LOOKBACK_DAYS";
pub const ENV_CACHE_LOOKAHEAD_DAYS: &str = "PLANORA_CACHE_LOOKAHEAD_DAYS";
pub const ENV_LOG_LEVEL: &str = "PLANORA_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "PLANORA_LOG_JSON";

// Initial window around "now" when a session is primed
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 28;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

// View projections
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
pub const DAY_LABEL_FORMAT: &str = "%a %-d";
pub const DAYS_PER_WEEK: usize = 7;
