// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation response envelope.
//!
//! The service answers with `{"decisions": [{"decision": "Allow", ...}]}` or
//! `{"error": {"message": "..."}}`. Decision values are strings on the wire;
//! they are normalized into [`Verdict`] as soon as a decision is parsed so
//! nothing downstream compares raw strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Normalized decision for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
	Allow,
	Deny,
}

impl Verdict {
	/// Only the exact, case-sensitive string `"Allow"` grants access.
	pub fn from_wire(value: Option<&str>) -> Self {
		match value {
			Some("Allow") => Verdict::Allow,
			_ => Verdict::Deny,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Verdict::Allow => "Allow",
			Verdict::Deny => "Deny",
		}
	}

	pub fn is_allow(&self) -> bool {
		matches!(self, Verdict::Allow)
	}
}

impl fmt::Display for Verdict {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One decision as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
	pub verdict: Verdict,
	/// Raw wire value, kept for diagnostics only.
	pub raw: Option<String>,
	pub reason: Option<String>,
	/// Informational; never used for correlation.
	pub asset_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
	#[serde(default)]
	decision: Option<String>,
	#[serde(default)]
	reason: Option<String>,
	#[serde(default)]
	asset_id: Option<String>,
}

impl Decision {
	/// Parses a single array element. Elements that are not objects, or whose
	/// fields have the wrong type, become a bare deny.
	fn from_value(value: Value) -> Self {
		let raw: RawDecision = serde_json::from_value(value).unwrap_or_default();
		Self {
			verdict: Verdict::from_wire(raw.decision.as_deref()),
			raw: raw.decision,
			reason: raw.reason,
			asset_id: raw.asset_id,
		}
	}
}

/// Error object the service may return instead of decisions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
	#[serde(default)]
	pub message: Option<String>,
}

/// Reasons a 200 response could not be turned into decisions.
#[derive(Debug, Error)]
pub enum ResponseError {
	#[error("Failed to parse JSON response: {0}")]
	Malformed(#[from] serde_json::Error),

	#[error("{}", .message.as_deref().unwrap_or("Service returned an error"))]
	Service { message: Option<String> },

	#[error("No decisions in response")]
	MissingDecisions,
}

/// Successfully parsed evaluation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionResponse {
	pub decisions: Vec<Decision>,
}

impl DecisionResponse {
	/// Parses a response body.
	///
	/// A top-level `error` object short-circuits to [`ResponseError::Service`].
	/// A missing or non-array `decisions` field is [`ResponseError::MissingDecisions`],
	/// which callers must keep distinct from an empty (deny-all) array.
	pub fn parse(body: &str) -> Result<Self, ResponseError> {
		let mut root: Value = serde_json::from_str(body)?;

		if let Some(error) = root.get("error").filter(|e| !e.is_null()) {
			let message = serde_json::from_value::<ApiError>(error.clone())
				.ok()
				.and_then(|e| e.message);
			return Err(ResponseError::Service { message });
		}

		match root.get_mut("decisions").map(Value::take) {
			Some(Value::Array(items)) => Ok(Self {
				decisions: items.into_iter().map(Decision::from_value).collect(),
			}),
			_ => Err(ResponseError::MissingDecisions),
		}
	}

	pub fn len(&self) -> usize {
		self.decisions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.decisions.is_empty()
	}
}
