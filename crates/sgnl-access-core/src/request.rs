// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation request payload.

use serde::Serialize;

/// Action used when a caller does not name one.
pub const DEFAULT_ACTION: &str = "execute";

/// Exclusive upper bound on principal and asset identifier length.
pub const MAX_ID_LEN: usize = 256;

/// The actor whose access is being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
	pub id: String,
	pub device_id: String,
}

impl Principal {
	pub fn new(id: impl Into<String>, device_id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			device_id: device_id.into(),
		}
	}
}

/// One authorization question.
///
/// Queries are correlated with decisions by position, so the order in which
/// they are pushed into an [`EvaluationRequest`] matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_id: Option<String>,
	pub action: String,
}

impl Query {
	pub fn new(asset_id: Option<impl Into<String>>, action: impl Into<String>) -> Self {
		Self {
			asset_id: asset_id.map(Into::into),
			action: action.into(),
		}
	}

	/// Builds a query, falling back to [`DEFAULT_ACTION`] when `action` is absent.
	pub fn with_default_action(asset_id: Option<&str>, action: Option<&str>) -> Self {
		Self {
			asset_id: asset_id.map(str::to_string),
			action: action.unwrap_or(DEFAULT_ACTION).to_string(),
		}
	}
}

/// Body of `POST /access/v2/evaluations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationRequest {
	pub principal: Principal,
	pub queries: Vec<Query>,
}

impl EvaluationRequest {
	pub fn new(principal: Principal, queries: Vec<Query>) -> Self {
		Self { principal, queries }
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}

/// Returns true if `principal_id` is non-empty and shorter than [`MAX_ID_LEN`].
pub fn validate_principal_id(principal_id: &str) -> bool {
	!principal_id.is_empty() && principal_id.len() < MAX_ID_LEN
}
