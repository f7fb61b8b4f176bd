// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Positional correlation of decisions to queries.
//!
//! Decision `i` answers query `i`. The decision's own `assetId` is never
//! consulted. When the service returns fewer decisions than queries, the
//! remaining queries are denied with no reason: an incomplete answer is never
//! treated as permissive. Extra decisions are ignored.

use crate::request::Query;
use crate::response::{Decision, DecisionResponse, Verdict};
use crate::result::{AccessResult, ResultKind};

/// Per-evaluation values copied into every result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultContext {
	pub principal_id: String,
	pub request_id: String,
}

impl ResultContext {
	pub fn new(principal_id: impl Into<String>, request_id: impl Into<String>) -> Self {
		Self {
			principal_id: principal_id.into(),
			request_id: request_id.into(),
		}
	}

	pub fn pending(&self, query: &Query) -> AccessResult {
		AccessResult::pending(&self.principal_id, &self.request_id, query)
	}
}

fn apply(result: AccessResult, decision: Option<&Decision>) -> AccessResult {
	match decision {
		Some(d) => result.decide(d.verdict, d.reason.clone()),
		None => result.decide(Verdict::Deny, None),
	}
}

/// Produces exactly one result per query, in query order.
pub fn resolve_decisions(
	ctx: &ResultContext,
	queries: &[Query],
	response: &DecisionResponse,
) -> Vec<AccessResult> {
	queries
		.iter()
		.enumerate()
		.map(|(i, query)| apply(ctx.pending(query), response.decisions.get(i)))
		.collect()
}

/// Resolves a single-query response body.
///
/// Unlike the batch path, parse failures and a missing `decisions` array
/// produce an [`ResultKind::Error`] result rather than no result. An empty
/// array denies.
pub fn resolve_single(ctx: &ResultContext, query: &Query, body: &str) -> AccessResult {
	match DecisionResponse::parse(body) {
		Ok(response) => apply(ctx.pending(query), response.decisions.first()),
		Err(e) => ctx.pending(query).fail(ResultKind::Error, e.to_string()),
	}
}
