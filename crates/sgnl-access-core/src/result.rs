// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller-facing evaluation results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::Query;
use crate::response::Verdict;

/// Outcome of one evaluation. Exactly one kind is assigned per result and it
/// is the only thing callers should branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
	Ok,
	Allowed,
	Denied,
	Error,
	ConfigError,
	NetworkError,
	AuthError,
	TimeoutError,
	InvalidRequest,
	MemoryError,
}

impl ResultKind {
	/// Stable integer code for front-ends that report numeric statuses.
	pub fn code(&self) -> i32 {
		match self {
			ResultKind::Ok => 0,
			ResultKind::Denied => 1,
			ResultKind::Allowed => 2,
			ResultKind::Error => 3,
			ResultKind::ConfigError => 4,
			ResultKind::NetworkError => 5,
			ResultKind::AuthError => 6,
			ResultKind::TimeoutError => 7,
			ResultKind::InvalidRequest => 8,
			ResultKind::MemoryError => 9,
		}
	}

	pub fn from_code(code: i32) -> Option<Self> {
		Some(match code {
			0 => ResultKind::Ok,
			1 => ResultKind::Denied,
			2 => ResultKind::Allowed,
			3 => ResultKind::Error,
			4 => ResultKind::ConfigError,
			5 => ResultKind::NetworkError,
			6 => ResultKind::AuthError,
			7 => ResultKind::TimeoutError,
			8 => ResultKind::InvalidRequest,
			9 => ResultKind::MemoryError,
			_ => return None,
		})
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ResultKind::Ok => "Success",
			ResultKind::Allowed => "Access Allowed",
			ResultKind::Denied => "Access Denied",
			ResultKind::Error => "Error",
			ResultKind::ConfigError => "Configuration Error",
			ResultKind::NetworkError => "Network Error",
			ResultKind::AuthError => "Authentication Error",
			ResultKind::TimeoutError => "Timeout Error",
			ResultKind::InvalidRequest => "Invalid Request",
			ResultKind::MemoryError => "Memory Error",
		}
	}

	pub fn is_allowed(&self) -> bool {
		matches!(self, ResultKind::Allowed)
	}

	pub fn is_denied(&self) -> bool {
		matches!(self, ResultKind::Denied)
	}

	/// True when the service could not give an answer, as opposed to
	/// answering with a denial. Front-ends report these as "service
	/// unavailable" rather than "denied".
	pub fn is_service_unavailable(&self) -> bool {
		!matches!(
			self,
			ResultKind::Ok | ResultKind::Allowed | ResultKind::Denied
		)
	}
}

impl fmt::Display for ResultKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One evaluated query.
///
/// Every field is populated on every path, including failures: optional
/// fields are `None` rather than left unset, so reading any of them is safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResult {
	pub outcome: ResultKind,
	pub decision: Option<Verdict>,
	pub reason: Option<String>,
	pub asset_id: Option<String>,
	pub action: String,
	pub principal_id: String,
	pub timestamp: DateTime<Utc>,
	pub request_id: String,
	pub error_message: Option<String>,
	pub error_code: Option<u16>,
}

impl AccessResult {
	/// Result for `query` before any answer is known. Starts as
	/// [`ResultKind::Error`] so an early return can never look permissive.
	pub fn pending(
		principal_id: impl Into<String>,
		request_id: impl Into<String>,
		query: &Query,
	) -> Self {
		Self {
			outcome: ResultKind::Error,
			decision: None,
			reason: None,
			asset_id: query.asset_id.clone(),
			action: query.action.clone(),
			principal_id: principal_id.into(),
			timestamp: Utc::now(),
			request_id: request_id.into(),
			error_message: None,
			error_code: None,
		}
	}

	/// Marks the result as failed with `kind`.
	pub fn fail(mut self, kind: ResultKind, message: impl Into<String>) -> Self {
		self.outcome = kind;
		self.decision = None;
		self.error_message = Some(message.into());
		self
	}

	pub fn with_error_code(mut self, code: u16) -> Self {
		self.error_code = Some(code);
		self
	}

	/// Applies a decision. `reason` is copied through verbatim.
	pub fn decide(mut self, verdict: Verdict, reason: Option<String>) -> Self {
		self.outcome = if verdict.is_allow() {
			ResultKind::Allowed
		} else {
			ResultKind::Denied
		};
		self.decision = Some(verdict);
		self.reason = reason;
		self.error_message = None;
		self.error_code = None;
		self
	}

	pub fn is_allowed(&self) -> bool {
		self.outcome.is_allowed()
	}
}
