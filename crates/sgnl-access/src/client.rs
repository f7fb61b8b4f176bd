// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access evaluation client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use sgnl_access_core::{
	allowed_asset_ids, resolve_decisions, resolve_single, search_request, validate_principal_id,
	AccessResult, DecisionResponse, EvaluationRequest, Principal, Query, ResultContext, ResultKind,
	SearchResult, DEFAULT_ACTION, DEFAULT_SEARCH_ACTION,
};
use sgnl_common_http::{HttpSettings, RetryConfig};
use sgnl_config::{ApiToken, Config};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result, TransportError};
use crate::identity::{DeviceIdentity, ProcessIdentity};
use crate::request_id::new_request_id;

pub const EVALUATIONS_PATH: &str = "/access/v2/evaluations";
pub const SEARCH_PATH: &str = "/access/v2/search";

const REQUEST_ID_HEADER: &str = "X-Request-Id";
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Builds the endpoint base from tenant and API host.
///
/// `https://{tenant}.{api_url}`, or just `api_url` when `tenant` is empty. An
/// `api_url` that already carries an `http://` or `https://` scheme keeps it.
pub fn endpoint_base(tenant: &str, api_url: &str) -> String {
	let api_url = api_url.trim_end_matches('/');
	let (scheme, host) = match api_url.split_once("://") {
		Some((scheme, host)) if scheme == "http" || scheme == "https" => (scheme, host),
		_ => ("https", api_url),
	};

	if tenant.is_empty() {
		format!("{scheme}://{host}")
	} else {
		format!("{scheme}://{tenant}.{host}")
	}
}

/// Builder for constructing an [`AccessClient`].
pub struct AccessClientBuilder {
	api_url: Option<String>,
	api_token: Option<ApiToken>,
	tenant: String,
	http: HttpSettings,
	retry: RetryConfig,
	debug: bool,
	identity: Option<Arc<dyn DeviceIdentity>>,
}

impl AccessClientBuilder {
	pub fn new() -> Self {
		Self {
			api_url: None,
			api_token: None,
			tenant: String::new(),
			http: HttpSettings::default(),
			retry: RetryConfig::disabled(),
			debug: false,
			identity: None,
		}
	}

	/// Sets the API host, e.g. `sgnlapis.cloud`.
	pub fn api_url(mut self, url: impl Into<String>) -> Self {
		self.api_url = Some(url.into());
		self
	}

	/// Sets the bearer token.
	pub fn api_token(mut self, token: impl Into<ApiToken>) -> Self {
		self.api_token = Some(token.into());
		self
	}

	/// Sets the tenant subdomain.
	pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
		self.tenant = tenant.into();
		self
	}

	/// Sets the HTTP transport settings.
	pub fn http_settings(mut self, settings: HttpSettings) -> Self {
		self.http = settings;
		self
	}

	/// Sets the whole-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.http.timeout = timeout;
		self
	}

	/// Sets the connect timeout.
	pub fn connect_timeout(mut self, timeout: Duration) -> Self {
		self.http.connect_timeout = timeout;
		self
	}

	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.http.user_agent = user_agent.into();
		self
	}

	/// Sets the retry policy for transient failures.
	pub fn retry(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;
		self
	}

	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	/// Overrides the device identity provider.
	pub fn device_identity(mut self, identity: impl DeviceIdentity + 'static) -> Self {
		self.identity = Some(Arc::new(identity));
		self
	}

	/// Builds the AccessClient.
	pub fn build(self) -> Result<AccessClient> {
		let api_url = self
			.api_url
			.filter(|u| !u.is_empty())
			.ok_or(ClientError::MissingApiUrl)?;
		let api_token = self
			.api_token
			.filter(|t| !t.is_empty())
			.ok_or(ClientError::MissingApiToken)?;

		let base_url = endpoint_base(&self.tenant, &api_url);
		let http = sgnl_common_http::build_client(&self.http)?;

		if !self.http.verify_peer || !self.http.verify_host {
			warn!(
				verify_peer = self.http.verify_peer,
				verify_host = self.http.verify_host,
				"TLS verification disabled by configuration"
			);
		}

		info!(
			base_url = %base_url,
			timeout_secs = self.http.timeout.as_secs(),
			retries = self.retry.max_retries,
			"Access client initialized"
		);

		Ok(AccessClient {
			inner: Arc::new(AccessClientInner {
				http,
				base_url,
				api_token,
				retry: self.retry,
				debug: self.debug,
				identity: self.identity.unwrap_or_else(|| Arc::new(ProcessIdentity)),
				closed: AtomicBool::new(false),
				last_request_id: Mutex::new(None),
				last_error: Mutex::new(None),
			}),
		})
	}
}

impl Default for AccessClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct AccessClientInner {
	http: Client,
	base_url: String,
	api_token: ApiToken,
	retry: RetryConfig,
	debug: bool,
	identity: Arc<dyn DeviceIdentity>,
	closed: AtomicBool,
	last_request_id: Mutex<Option<String>>,
	last_error: Mutex<Option<String>>,
}

/// Client for the SGNL access evaluation API.
///
/// Cheap to clone; clones share one connection pool and one closed flag.
/// Evaluations never return `Err`: transport, HTTP and parse failures are
/// reported through [`AccessResult::outcome`], or as `None` on the batch
/// and search paths.
///
/// # Example
///
/// ```ignore
/// use sgnl_access::AccessClient;
///
/// let client = AccessClient::builder()
///     .api_url("sgnlapis.cloud")
///     .tenant("acme")
///     .api_token(token)
///     .build()?;
///
/// let result = client.evaluate_one("alice", Some("sshd"), None).await;
/// if result.is_allowed() {
///     // ...
/// }
/// ```
#[derive(Clone)]
pub struct AccessClient {
	inner: Arc<AccessClientInner>,
}

impl AccessClient {
	pub fn builder() -> AccessClientBuilder {
		AccessClientBuilder::new()
	}

	/// Builds a client from loaded settings.
	pub fn from_config(config: &Config) -> Result<Self> {
		config.validate()?;

		let retry = config.retry();
		Self::builder()
			.api_url(config.api_url())
			.api_token(config.api_token().clone())
			.tenant(config.tenant())
			.http_settings(HttpSettings {
				timeout: config.timeout(),
				connect_timeout: config.connect_timeout(),
				verify_peer: config.ssl_verify_peer(),
				verify_host: config.ssl_verify_host(),
				user_agent: config.user_agent().to_string(),
			})
			.retry(RetryConfig {
				max_retries: retry.count,
				base_delay: retry.delay(),
				max_delay: MAX_RETRY_DELAY,
				..RetryConfig::default()
			})
			.debug(config.is_debug_enabled())
			.build()
	}

	/// Evaluates one (principal, asset, action) query.
	///
	/// `action` defaults to `"execute"`. Always returns a fully populated
	/// result; an invalid principal and a closed client are reported without any
	/// network I/O.
	pub async fn evaluate_one(
		&self,
		principal_id: &str,
		asset_id: Option<&str>,
		action: Option<&str>,
	) -> AccessResult {
		let query = Query::with_default_action(asset_id, action);
		let request_id = new_request_id();
		let ctx = ResultContext::new(principal_id, &request_id);

		if self.is_closed() {
			return ctx
				.pending(&query)
				.fail(ResultKind::Error, "Client not initialized");
		}
		if !validate_principal_id(principal_id) {
			return ctx
				.pending(&query)
				.fail(ResultKind::InvalidRequest, "Invalid principal ID");
		}

		self.set_last_request_id(&request_id);
		let request = EvaluationRequest::new(self.principal(principal_id), vec![query.clone()]);

		debug!(
			request_id = %request_id,
			principal_id = %principal_id,
			asset_id = ?query.asset_id,
			action = %query.action,
			"Evaluating access"
		);

		let result = match self.exchange(EVALUATIONS_PATH, &request, &request_id).await {
			Ok(body) => resolve_single(&ctx, &query, &body),
			Err(e) => transport_failure(ctx.pending(&query), &e),
		};

		self.record_outcome(&result);
		result
	}

	/// Evaluates several queries for one principal in a single request.
	///
	/// `actions[i]` defaults to `"execute"` when `actions` is `None`. Returns
	/// `None` for invalid input (closed client, bad principal, no assets,
	/// mismatched action count) and when the service gives no usable answer
	/// (transport failure, non-200, unparsable body, missing `decisions`).
	/// Otherwise returns exactly one result per asset, in order.
	pub async fn evaluate_batch(
		&self,
		principal_id: &str,
		asset_ids: &[&str],
		actions: Option<&[&str]>,
	) -> Option<Vec<AccessResult>> {
		if asset_ids.is_empty() || actions.is_some_and(|a| a.len() != asset_ids.len()) {
			debug!(
				assets = asset_ids.len(),
				actions = ?actions.map(|a| a.len()),
				"Rejecting malformed batch"
			);
			return None;
		}

		let queries = asset_ids
			.iter()
			.enumerate()
			.map(|(i, asset)| {
				let action = actions.map(|a| a[i]).unwrap_or(DEFAULT_ACTION);
				Query::new(Some(*asset), action)
			})
			.collect();

		self.evaluate_queries(principal_id, queries).await
	}

	/// Evaluates prebuilt queries. Same contract as [`Self::evaluate_batch`].
	pub async fn evaluate_queries(
		&self,
		principal_id: &str,
		queries: Vec<Query>,
	) -> Option<Vec<AccessResult>> {
		if self.is_closed() || queries.is_empty() || !validate_principal_id(principal_id) {
			return None;
		}

		let request_id = new_request_id();
		self.set_last_request_id(&request_id);
		let ctx = ResultContext::new(principal_id, &request_id);
		let request = EvaluationRequest::new(self.principal(principal_id), queries);

		debug!(
			request_id = %request_id,
			principal_id = %principal_id,
			queries = request.queries.len(),
			"Evaluating batch"
		);

		let body = match self.exchange(EVALUATIONS_PATH, &request, &request_id).await {
			Ok(body) => body,
			Err(e) => {
				warn!(request_id = %request_id, error = %e, "Batch evaluation failed");
				self.set_last_error(Some(e.to_string()));
				return None;
			}
		};

		let response = match DecisionResponse::parse(&body) {
			Ok(response) => response,
			Err(e) => {
				warn!(request_id = %request_id, error = %e, "Batch response unusable");
				self.set_last_error(Some(e.to_string()));
				return None;
			}
		};

		if response.len() < request.queries.len() {
			debug!(
				request_id = %request_id,
				decisions = response.len(),
				queries = request.queries.len(),
				"Short decision list, denying unanswered queries"
			);
		}

		self.set_last_error(None);
		Some(resolve_decisions(&ctx, &request.queries, &response))
	}

	/// Convenience wrapper returning only the outcome.
	pub async fn check_access(
		&self,
		principal_id: &str,
		asset_id: &str,
		action: Option<&str>,
	) -> ResultKind {
		self.evaluate_one(principal_id, Some(asset_id), action)
			.await
			.outcome
	}

	/// Lists the asset ids the principal is allowed to use for `action`
	/// (default `"list"`).
	pub async fn search_assets(
		&self,
		principal_id: &str,
		action: Option<&str>,
	) -> Option<Vec<String>> {
		if self.is_closed() || !validate_principal_id(principal_id) {
			return None;
		}

		let request_id = new_request_id();
		self.set_last_request_id(&request_id);
		let request = search_request(self.principal(principal_id), action);

		debug!(
			request_id = %request_id,
			principal_id = %principal_id,
			action = action.unwrap_or(DEFAULT_SEARCH_ACTION),
			"Searching assets"
		);

		let parsed = match self.exchange(SEARCH_PATH, &request, &request_id).await {
			Ok(body) => DecisionResponse::parse(&body).map_err(|e| e.to_string()),
			Err(e) => Err(e.to_string()),
		};

		match parsed {
			Ok(response) => {
				self.set_last_error(None);
				Some(allowed_asset_ids(&response))
			}
			Err(message) => {
				warn!(request_id = %request_id, error = %message, "Asset search failed");
				self.set_last_error(Some(message));
				None
			}
		}
	}

	/// Paged search. Paging is not supported by the service yet, so this
	/// always returns a single empty final page.
	pub async fn search_assets_detailed(
		&self,
		principal_id: &str,
		action: Option<&str>,
		page_token: Option<&str>,
		page_size: u32,
	) -> SearchResult {
		let request_id = new_request_id();
		debug!(
			request_id = %request_id,
			principal_id = %principal_id,
			page_token = ?page_token,
			page_size,
			"Detailed search requested"
		);
		SearchResult::empty(
			principal_id,
			action.unwrap_or(DEFAULT_SEARCH_ACTION),
			request_id,
		)
	}

	/// Checks the handle is usable.
	pub fn validate(&self) -> ResultKind {
		if self.is_closed() {
			return ResultKind::Error;
		}
		if self.inner.base_url.is_empty() || self.inner.api_token.is_empty() {
			return ResultKind::ConfigError;
		}
		ResultKind::Ok
	}

	/// Marks the client closed. Later evaluations fail without I/O.
	pub fn close(&self) {
		if !self.inner.closed.swap(true, Ordering::SeqCst) {
			info!("Access client closed");
		}
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	pub fn is_debug_enabled(&self) -> bool {
		self.inner.debug
	}

	pub fn base_url(&self) -> &str {
		&self.inner.base_url
	}

	/// Id of the most recent request sent by any clone of this handle.
	pub fn last_request_id(&self) -> Option<String> {
		lock(&self.inner.last_request_id).clone()
	}

	/// Message of the most recent failed evaluation, cleared on success.
	pub fn last_error(&self) -> Option<String> {
		lock(&self.inner.last_error).clone()
	}

	fn principal(&self, principal_id: &str) -> Principal {
		Principal::new(principal_id, self.inner.identity.device_id())
	}

	fn set_last_request_id(&self, request_id: &str) {
		*lock(&self.inner.last_request_id) = Some(request_id.to_string());
	}

	fn set_last_error(&self, message: Option<String>) {
		*lock(&self.inner.last_error) = message;
	}

	fn record_outcome(&self, result: &AccessResult) {
		match result.outcome {
			ResultKind::Allowed | ResultKind::Denied => {
				debug!(
					request_id = %result.request_id,
					outcome = %result.outcome,
					reason = ?result.reason,
					"Access decision"
				);
				self.set_last_error(None);
			}
			_ => {
				warn!(
					request_id = %result.request_id,
					outcome = %result.outcome,
					error = ?result.error_message,
					"Access evaluation failed"
				);
				self.set_last_error(result.error_message.clone());
			}
		}
	}

	/// POSTs `request` and returns the body of a 200 response.
	async fn exchange(
		&self,
		path: &str,
		request: &EvaluationRequest,
		request_id: &str,
	) -> std::result::Result<String, TransportError> {
		let url = format!("{}{}", self.inner.base_url, path);
		let body = request.to_json()?;
		let bearer = format!("Bearer {}", self.inner.api_token.expose());

		let http = &self.inner.http;
		let (url, body, bearer) = (url.as_str(), body.as_str(), bearer.as_str());

		sgnl_common_http::retry(&self.inner.retry, move || async move {
			let response = http
				.post(url)
				.header(ACCEPT, "application/json")
				.header(CONTENT_TYPE, "application/json")
				.header(AUTHORIZATION, bearer)
				.header(REQUEST_ID_HEADER, request_id)
				.body(body.to_owned())
				.send()
				.await
				.map_err(TransportError::from_reqwest)?;

			let status = response.status();
			if status != StatusCode::OK {
				return Err(TransportError::from_status(status));
			}

			response.text().await.map_err(TransportError::from_reqwest)
		})
		.await
	}
}

fn transport_failure(pending: AccessResult, err: &TransportError) -> AccessResult {
	let result = pending.fail(err.kind(), err.to_string());
	match err.status() {
		Some(status) => result.with_error_code(status),
		None => result,
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::identity::StaticDeviceIdentity;

	fn client() -> AccessClient {
		AccessClient::builder()
			.api_url("http://127.0.0.1:9")
			.api_token("token")
			.device_identity(StaticDeviceIdentity::new("dev-1"))
			.build()
			.unwrap()
	}

	#[test]
	fn endpoint_with_tenant() {
		assert_eq!(
			endpoint_base("acme", "sgnlapis.cloud"),
			"https://acme.sgnlapis.cloud"
		);
	}

	#[test]
	fn endpoint_without_tenant() {
		assert_eq!(endpoint_base("", "sgnlapis.cloud/"), "https://sgnlapis.cloud");
	}

	#[test]
	fn endpoint_keeps_explicit_scheme() {
		assert_eq!(
			endpoint_base("", "http://127.0.0.1:8080"),
			"http://127.0.0.1:8080"
		);
		assert_eq!(
			endpoint_base("acme", "https://sgnlapis.cloud"),
			"https://acme.sgnlapis.cloud"
		);
	}

	#[test]
	fn build_requires_url_and_token() {
		assert!(matches!(
			AccessClient::builder().api_token("t").build(),
			Err(ClientError::MissingApiUrl)
		));
		assert!(matches!(
			AccessClient::builder().api_url("x").build(),
			Err(ClientError::MissingApiToken)
		));
		assert!(matches!(
			AccessClient::builder().api_url("x").api_token("").build(),
			Err(ClientError::MissingApiToken)
		));
	}

	#[test]
	fn from_config_applies_settings() {
		let config = Config::new("sgnlapis.cloud", "tok")
			.with_tenant("acme")
			.with_debug(true);
		let client = AccessClient::from_config(&config).unwrap();
		assert_eq!(client.base_url(), "https://acme.sgnlapis.cloud");
		assert!(client.is_debug_enabled());
		assert_eq!(client.validate(), ResultKind::Ok);
	}

	#[test]
	fn from_config_rejects_invalid_settings() {
		let err = AccessClient::from_config(&Config::new("", "tok")).err().unwrap();
		assert_eq!(err.kind(), ResultKind::ConfigError);
	}

	#[tokio::test]
	async fn empty_principal_is_invalid_request() {
		let client = client();
		let result = client.evaluate_one("", Some("sshd"), None).await;
		assert_eq!(result.outcome, ResultKind::InvalidRequest);
		assert_eq!(result.action, DEFAULT_ACTION);
		assert!(client.last_request_id().is_none());
	}

	#[tokio::test]
	async fn oversized_principal_is_invalid_request() {
		let principal = "a".repeat(256);
		let result = client().evaluate_one(&principal, Some("sshd"), None).await;
		assert_eq!(result.outcome, ResultKind::InvalidRequest);
	}

	#[tokio::test]
	async fn closed_client_fails_without_io() {
		let client = client();
		client.close();
		assert_eq!(client.validate(), ResultKind::Error);

		let result = client.evaluate_one("alice", Some("sshd"), None).await;
		assert_eq!(result.outcome, ResultKind::Error);
		assert_eq!(result.error_message.as_deref(), Some("Client not initialized"));
		assert!(client.evaluate_batch("alice", &["a"], None).await.is_none());
		assert!(client.search_assets("alice", None).await.is_none());
	}

	#[tokio::test]
	async fn malformed_batches_return_none() {
		let client = client();
		assert!(client.evaluate_batch("alice", &[], None).await.is_none());
		assert!(client.evaluate_batch("", &["a"], None).await.is_none());
		assert!(client
			.evaluate_batch("alice", &["a", "b"], Some(&["read"][..]))
			.await
			.is_none());
	}

	#[tokio::test]
	async fn detailed_search_is_an_empty_page() {
		let result = client()
			.search_assets_detailed("alice", None, Some("next"), 50)
			.await;
		assert_eq!(result.outcome, ResultKind::Ok);
		assert_eq!(result.action, DEFAULT_SEARCH_ACTION);
		assert_eq!(result.principal_id, "alice");
		assert!(result.asset_ids.is_empty());
		assert!(!result.has_more_pages);
	}

	#[test]
	fn clones_share_state() {
		let client = client();
		let clone = client.clone();
		clone.close();
		assert!(client.is_closed());
	}
}
