// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::token::ApiToken;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SGNL_CONFIG_PATH";

/// Config file location when neither an explicit path nor the env var is set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sgnl/config.json";

const DEFAULT_USER_AGENT: &str = "SGNL-Client/1.0";
const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];
const MAX_RETRY_COUNT: u32 = 10;

/// Transport settings. Timeouts are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
	pub timeout: u64,
	pub connect_timeout: u64,
	pub ssl_verify_peer: bool,
	pub ssl_verify_host: bool,
	pub user_agent: String,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			timeout: 10,
			connect_timeout: 3,
			ssl_verify_peer: true,
			ssl_verify_host: true,
			user_agent: DEFAULT_USER_AGENT.to_string(),
		}
	}
}

/// Extra attempts on transient failures. `count = 0` disables retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
	pub count: u32,
	pub delay_ms: u64,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			count: 0,
			delay_ms: 1000,
		}
	}
}

impl RetryConfig {
	pub fn delay(&self) -> Duration {
		Duration::from_millis(self.delay_ms)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SudoConfig {
	/// Emit an "access granted" message when a command is allowed.
	pub access_msg: bool,
}

impl Default for SudoConfig {
	fn default() -> Self {
		Self { access_msg: true }
	}
}

/// A boolean that may also be written as the string `"true"` or `"1"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
	Bool(bool),
	Text(String),
}

impl Flag {
	fn enabled(&self) -> bool {
		match self {
			Flag::Bool(b) => *b,
			Flag::Text(s) => s == "true" || s == "1",
		}
	}
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSudo {
	access_msg: Option<Flag>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawConfig {
	api_url: Option<String>,
	api_token: Option<String>,
	protected_system_token: Option<String>,
	tenant: Option<String>,
	debug: Option<Flag>,
	log_level: Option<String>,
	timeout_seconds: Option<u64>,
	http: HttpConfig,
	retry: RetryConfig,
	sudo: RawSudo,
}

impl From<RawConfig> for Config {
	fn from(raw: RawConfig) -> Self {
		let mut http = raw.http;
		if let Some(timeout) = raw.timeout_seconds {
			http.timeout = timeout;
		}

		let defaults = SudoConfig::default();
		let sudo = SudoConfig {
			access_msg: raw
				.sudo
				.access_msg
				.map(|f| f.enabled())
				.unwrap_or(defaults.access_msg),
		};

		Self {
			api_url: raw.api_url.unwrap_or_default(),
			api_token: ApiToken::new(
				raw.api_token
					.or(raw.protected_system_token)
					.unwrap_or_default(),
			),
			tenant: raw.tenant.unwrap_or_default(),
			debug: raw.debug.map(|f| f.enabled()).unwrap_or(false),
			log_level: raw.log_level.unwrap_or_else(|| "info".to_string()),
			http,
			retry: raw.retry,
			sudo,
		}
	}
}

/// Resolves the config file location.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
	if let Some(path) = explicit {
		return path.to_path_buf();
	}
	match std::env::var(CONFIG_PATH_ENV) {
		Ok(path) if !path.is_empty() => PathBuf::from(path),
		_ => PathBuf::from(DEFAULT_CONFIG_PATH),
	}
}

/// Validated client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	api_url: String,
	api_token: ApiToken,
	tenant: String,
	debug: bool,
	log_level: String,
	http: HttpConfig,
	retry: RetryConfig,
	sudo: SudoConfig,
}

impl Config {
	/// Settings with every optional field at its default. Not validated.
	pub fn new(api_url: impl Into<String>, api_token: impl Into<ApiToken>) -> Self {
		Self {
			api_url: api_url.into(),
			api_token: api_token.into(),
			tenant: String::new(),
			debug: false,
			log_level: "info".to_string(),
			http: HttpConfig::default(),
			retry: RetryConfig::default(),
			sudo: SudoConfig::default(),
		}
	}

	/// Loads and validates the config file at the resolved path.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let path = resolve_path(path);
		debug!(path = %path.display(), "loading configuration");

		let contents = std::fs::read_to_string(&path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				ConfigError::NotFound(path.clone())
			} else {
				ConfigError::Io {
					path: path.clone(),
					source: e,
				}
			}
		})?;

		let config = Self::parse(&contents).map_err(|e| match e {
			ConfigError::InvalidJson { source, .. } => ConfigError::InvalidJson {
				path: path.clone(),
				source,
			},
			other => other,
		})?;

		info!(
			path = %path.display(),
			api_url = %config.api_url,
			tenant = %config.tenant,
			debug = config.debug,
			"configuration loaded"
		);
		Ok(config)
	}

	/// Parses and validates a JSON document.
	pub fn parse(json: &str) -> Result<Self> {
		let raw: RawConfig =
			serde_json::from_str(json).map_err(|source| ConfigError::InvalidJson {
				path: PathBuf::from("<inline>"),
				source,
			})?;
		let config = Config::from(raw);
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.api_url.is_empty() {
			return Err(ConfigError::missing_field("api_url"));
		}
		if self.api_token.is_empty() {
			return Err(ConfigError::missing_field("api_token"));
		}
		if !(1..=300).contains(&self.http.timeout) {
			return Err(ConfigError::invalid_value(
				"http.timeout",
				"must be between 1 and 300 seconds",
			));
		}
		if !(1..=60).contains(&self.http.connect_timeout) {
			return Err(ConfigError::invalid_value(
				"http.connect_timeout",
				"must be between 1 and 60 seconds",
			));
		}
		if !LOG_LEVELS.contains(&self.log_level.as_str()) {
			return Err(ConfigError::invalid_value(
				"log_level",
				format!("'{}' is not one of debug, info, warn, error", self.log_level),
			));
		}
		if self.retry.count > MAX_RETRY_COUNT {
			return Err(ConfigError::invalid_value(
				"retry.count",
				format!("must be at most {MAX_RETRY_COUNT}"),
			));
		}
		Ok(())
	}

	pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
		self.tenant = tenant.into();
		self
	}

	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn with_http(mut self, http: HttpConfig) -> Self {
		self.http = http;
		self
	}

	pub fn with_retry(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;
		self
	}

	pub fn with_sudo(mut self, sudo: SudoConfig) -> Self {
		self.sudo = sudo;
		self
	}

	pub fn api_url(&self) -> &str {
		&self.api_url
	}

	pub fn api_token(&self) -> &ApiToken {
		&self.api_token
	}

	pub fn tenant(&self) -> &str {
		&self.tenant
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.http.timeout)
	}

	pub fn connect_timeout(&self) -> Duration {
		Duration::from_secs(self.http.connect_timeout)
	}

	pub fn user_agent(&self) -> &str {
		&self.http.user_agent
	}

	pub fn ssl_verify_peer(&self) -> bool {
		self.http.ssl_verify_peer
	}

	pub fn ssl_verify_host(&self) -> bool {
		self.http.ssl_verify_host
	}

	pub fn is_debug_enabled(&self) -> bool {
		self.debug
	}

	pub fn log_level(&self) -> &str {
		&self.log_level
	}

	pub fn retry(&self) -> RetryConfig {
		self.retry
	}

	pub fn sudo(&self) -> &SudoConfig {
		&self.sudo
	}
}
