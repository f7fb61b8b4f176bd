// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for SGNL access evaluation.
//!
//! This crate holds everything about an evaluation that does not touch the
//! network: the request payload sent to the policy service, the response
//! envelope it returns, the caller-facing [`AccessResult`], and the
//! positional correlation that turns a decision list back into one result per
//! submitted query. It is shared by the client SDK (`sgnl-access`) and the
//! front-ends built on top of it.
//!
//! # Example
//!
//! ```
//! use sgnl_access_core::{
//!     resolve_decisions, DecisionResponse, EvaluationRequest, Principal, Query, ResultContext,
//!     ResultKind,
//! };
//!
//! let request = EvaluationRequest::new(
//!     Principal::new("alice", "host-1"),
//!     vec![Query::new(Some("cat"), "sudo"), Query::new(Some("/etc/passwd"), "cat")],
//! );
//! let response = DecisionResponse::parse(r#"{"decisions":[{"decision":"Allow"}]}"#).unwrap();
//! let ctx = ResultContext::new("alice", "sgnl-00000000-0000-0000");
//!
//! let results = resolve_decisions(&ctx, &request.queries, &response);
//! assert_eq!(results[0].outcome, ResultKind::Allowed);
//! // Missing decisions are denied.
//! assert_eq!(results[1].outcome, ResultKind::Denied);
//! ```

pub mod request;
pub mod resolver;
pub mod response;
pub mod result;
pub mod search;
pub mod status;

pub use request::{
	validate_principal_id, EvaluationRequest, Principal, Query, DEFAULT_ACTION, MAX_ID_LEN,
};
pub use resolver::{resolve_decisions, resolve_single, ResultContext};
pub use response::{ApiError, Decision, DecisionResponse, ResponseError, Verdict};
pub use result::{AccessResult, ResultKind};
pub use search::{allowed_asset_ids, search_request, SearchResult, DEFAULT_SEARCH_ACTION};
pub use status::classify_status;
