// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Asset search types.
//!
//! Search reuses the evaluation envelope with a single asset-less query; the
//! service answers with one decision per asset it considered.

use serde::{Deserialize, Serialize};

use crate::request::{EvaluationRequest, Principal, Query};
use crate::response::DecisionResponse;
use crate::result::ResultKind;

/// Action used for searches when the caller does not name one.
pub const DEFAULT_SEARCH_ACTION: &str = "list";

/// Body of `POST /access/v2/search`.
pub fn search_request(principal: Principal, action: Option<&str>) -> EvaluationRequest {
	EvaluationRequest::new(
		principal,
		vec![Query::new(
			None::<String>,
			action.unwrap_or(DEFAULT_SEARCH_ACTION),
		)],
	)
}

/// Asset ids of every allowed decision, in response order. Allowed decisions
/// that carry no `assetId` are skipped.
pub fn allowed_asset_ids(response: &DecisionResponse) -> Vec<String> {
	response
		.decisions
		.iter()
		.filter(|d| d.verdict.is_allow())
		.filter_map(|d| d.asset_id.clone())
		.collect()
}

/// Paged search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
	pub outcome: ResultKind,
	pub asset_ids: Vec<String>,
	pub next_page_token: Option<String>,
	pub has_more_pages: bool,
	pub principal_id: String,
	pub action: String,
	pub request_id: String,
	pub error_message: Option<String>,
	pub error_code: Option<u16>,
}

impl SearchResult {
	/// An empty, final page.
	pub fn empty(
		principal_id: impl Into<String>,
		action: impl Into<String>,
		request_id: impl Into<String>,
	) -> Self {
		Self {
			outcome: ResultKind::Ok,
			asset_ids: Vec::new(),
			next_page_token: None,
			has_more_pages: false,
			principal_id: principal_id.into(),
			action: action.into(),
			request_id: request_id.into(),
			error_message: None,
			error_code: None,
		}
	}

	pub fn asset_count(&self) -> usize {
		self.asset_ids.len()
	}
}
