// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! PAM account management backed by SGNL access evaluations.
//!
//! The PAM service name is the asset and the user is the principal. Only a
//! genuine policy denial is reported as "permission denied"; every failure to
//! reach a decision is reported as "auth info unavailable" so infrastructure
//! problems are not mistaken for policy.

use std::fmt;
use std::path::Path;

use sgnl_access::AccessClient;
use sgnl_access_core::ResultKind;
use sgnl_config::Config;
use tracing::{error, info, warn};

/// Account management verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PamVerdict {
	Success,
	PermissionDenied,
	AuthInfoUnavailable,
}

impl PamVerdict {
	/// Maps an evaluation outcome to a verdict.
	pub fn from_outcome(outcome: ResultKind) -> Self {
		match outcome {
			ResultKind::Allowed => PamVerdict::Success,
			ResultKind::Denied => PamVerdict::PermissionDenied,
			_ => PamVerdict::AuthInfoUnavailable,
		}
	}

	/// Linux-PAM return code (`PAM_SUCCESS`, `PAM_PERM_DENIED`,
	/// `PAM_AUTHINFO_UNAVAIL`).
	pub fn code(&self) -> i32 {
		match self {
			PamVerdict::Success => 0,
			PamVerdict::PermissionDenied => 6,
			PamVerdict::AuthInfoUnavailable => 9,
		}
	}
}

impl fmt::Display for PamVerdict {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			PamVerdict::Success => "success",
			PamVerdict::PermissionDenied => "permission denied",
			PamVerdict::AuthInfoUnavailable => "authentication information unavailable",
		})
	}
}

/// Decides whether `username` may use the PAM `service`.
pub async fn check_account(
	client: &AccessClient,
	username: Option<&str>,
	service: Option<&str>,
) -> PamVerdict {
	let (Some(username), Some(service)) = (
		username.filter(|u| !u.is_empty()),
		service.filter(|s| !s.is_empty()),
	) else {
		warn!("missing username or service");
		return PamVerdict::AuthInfoUnavailable;
	};

	let result = client.evaluate_one(username, Some(service), None).await;
	let verdict = PamVerdict::from_outcome(result.outcome);

	match verdict {
		PamVerdict::Success => info!(user = %username, service = %service, "access allowed"),
		PamVerdict::PermissionDenied => {
			warn!(user = %username, service = %service, reason = ?result.reason, "access denied")
		}
		PamVerdict::AuthInfoUnavailable => error!(
			user = %username,
			service = %service,
			outcome = %result.outcome,
			error = ?result.error_message,
			"access service unavailable"
		),
	}

	verdict
}

/// Account module state: one client per process, built from the config file.
pub struct AccountModule {
	client: Option<AccessClient>,
}

impl AccountModule {
	/// Loads the config and builds the client. A failure leaves the module
	/// without a client, and every check then reports unavailable.
	pub fn open(config_path: Option<&Path>) -> Self {
		let client = Config::load(config_path)
			.map_err(|e| e.to_string())
			.and_then(|config| AccessClient::from_config(&config).map_err(|e| e.to_string()));

		match client {
			Ok(client) => Self {
				client: Some(client),
			},
			Err(e) => {
				error!(error = %e, "failed to initialize access client");
				Self { client: None }
			}
		}
	}

	pub fn with_client(client: AccessClient) -> Self {
		Self {
			client: Some(client),
		}
	}

	pub async fn acct_mgmt(&self, username: Option<&str>, service: Option<&str>) -> PamVerdict {
		match &self.client {
			Some(client) if client.validate() == ResultKind::Ok => {
				check_account(client, username, service).await
			}
			_ => PamVerdict::AuthInfoUnavailable,
		}
	}

	/// Credentials are not managed here.
	pub fn setcred(&self) -> PamVerdict {
		PamVerdict::Success
	}

	/// Authentication is left to other modules in the stack.
	pub fn authenticate(&self) -> PamVerdict {
		PamVerdict::Success
	}

	pub fn close(&mut self) {
		if let Some(client) = self.client.take() {
			client.close();
		}
	}
}
