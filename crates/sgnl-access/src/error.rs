// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the access client.

use sgnl_access_core::{classify_status, ResultKind};
use sgnl_common_http::RetryableError;
use sgnl_config::ConfigError;
use thiserror::Error;

/// Result type for client construction.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that prevent a client from being built.
#[derive(Debug, Error)]
pub enum ClientError {
	/// Missing API URL.
	#[error("missing API URL")]
	MissingApiUrl,

	/// Missing API token.
	#[error("missing API token")]
	MissingApiToken,

	/// Settings failed validation.
	#[error("invalid configuration: {0}")]
	Config(#[from] ConfigError),

	/// The HTTP transport could not be built.
	#[error("failed to build HTTP client: {0}")]
	Http(#[from] reqwest::Error),
}

impl ClientError {
	pub fn kind(&self) -> ResultKind {
		match self {
			ClientError::MissingApiUrl | ClientError::MissingApiToken | ClientError::Config(_) => {
				ResultKind::ConfigError
			}
			ClientError::Http(_) => ResultKind::Error,
		}
	}
}

/// Failure of a single HTTP exchange with the policy service.
///
/// Never crosses the public evaluation API: it is folded into an
/// `AccessResult` or a `None` batch.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("request timed out: {0}")]
	Timeout(#[source] reqwest::Error),

	#[error("request failed: {0}")]
	Network(#[source] reqwest::Error),

	#[error("HTTP {status}: {message}")]
	Status { status: u16, message: String },

	#[error("failed to encode request: {0}")]
	Encode(#[from] serde_json::Error),
}

impl TransportError {
	pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			TransportError::Timeout(err)
		} else {
			TransportError::Network(err)
		}
	}

	pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
		TransportError::Status {
			status: status.as_u16(),
			message: status
				.canonical_reason()
				.unwrap_or("Unknown error")
				.to_string(),
		}
	}

	pub fn kind(&self) -> ResultKind {
		match self {
			TransportError::Timeout(_) => ResultKind::TimeoutError,
			TransportError::Network(_) => ResultKind::NetworkError,
			TransportError::Status { status, .. } => {
				classify_status(*status).unwrap_or(ResultKind::Error)
			}
			TransportError::Encode(_) => ResultKind::Error,
		}
	}

	/// The HTTP status, when the service answered.
	pub fn status(&self) -> Option<u16> {
		match self {
			TransportError::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

impl RetryableError for TransportError {
	fn is_retryable(&self) -> bool {
		matches!(
			self.kind(),
			ResultKind::NetworkError | ResultKind::TimeoutError
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn status(code: u16) -> TransportError {
		TransportError::from_status(reqwest::StatusCode::from_u16(code).unwrap())
	}

	#[test]
	fn status_messages_use_canonical_reason() {
		assert_eq!(status(404).to_string(), "HTTP 404: Not Found");
		assert_eq!(status(599).to_string(), "HTTP 599: Unknown error");
	}

	#[test]
	fn status_kinds() {
		assert_eq!(status(401).kind(), ResultKind::AuthError);
		assert_eq!(status(403).kind(), ResultKind::AuthError);
		assert_eq!(status(503).kind(), ResultKind::NetworkError);
		assert_eq!(status(404).kind(), ResultKind::Error);
		assert_eq!(status(404).status(), Some(404));
	}

	#[test]
	fn only_server_failures_retry() {
		assert!(status(500).is_retryable());
		assert!(status(502).is_retryable());
		assert!(!status(401).is_retryable());
		assert!(!status(403).is_retryable());
		assert!(!status(400).is_retryable());
	}

	#[test]
	fn construction_errors_are_config_errors() {
		assert_eq!(ClientError::MissingApiUrl.kind(), ResultKind::ConfigError);
		assert_eq!(ClientError::MissingApiToken.kind(), ResultKind::ConfigError);
	}
}
