// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client construction from access-client settings.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// User agent sent when the configuration does not override it.
pub const DEFAULT_USER_AGENT: &str = "SGNL-Client/1.0";

/// Transport settings for the policy service connection.
///
/// TLS peer and host verification are explicit settings; nothing in this
/// crate turns them off on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
	pub timeout: Duration,
	pub connect_timeout: Duration,
	pub verify_peer: bool,
	pub verify_host: bool,
	pub user_agent: String,
}

impl Default for HttpSettings {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(10),
			connect_timeout: Duration::from_secs(3),
			verify_peer: true,
			verify_host: true,
			user_agent: DEFAULT_USER_AGENT.to_string(),
		}
	}
}

/// Creates a client builder with timeouts, user agent and TLS checks applied.
///
/// Use this when you need to customize the client further.
///
/// # Example
/// ```ignore
/// let client = sgnl_common_http::builder(&HttpSettings::default())
///     .pool_max_idle_per_host(0)
///     .build()?;
/// ```
pub fn builder(settings: &HttpSettings) -> ClientBuilder {
	Client::builder()
		.user_agent(settings.user_agent.clone())
		.timeout(settings.timeout)
		.connect_timeout(settings.connect_timeout)
		.danger_accept_invalid_certs(!settings.verify_peer)
		.danger_accept_invalid_hostnames(!settings.verify_host)
}

/// Builds a client from `settings`.
pub fn build_client(settings: &HttpSettings) -> Result<Client, reqwest::Error> {
	builder(settings).build()
}
