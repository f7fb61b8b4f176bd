// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sgnl_access::AccessClient;
use sgnl_access_core::{AccessResult, Query, ResultKind};
use tracing::debug;

/// Action used for the command query.
pub const SUDO_ACTION: &str = "sudo";

/// Expands an argv into its authorization queries.
///
/// `argv[0]` becomes `{assetId: argv[0], action: "sudo"}`; every non-empty
/// argument after it becomes `{assetId: arg, action: argv[0]}`.
pub fn build_queries<S: AsRef<str>>(argv: &[S]) -> Vec<Query> {
	let Some((command, args)) = argv.split_first() else {
		return Vec::new();
	};
	let command = command.as_ref();

	std::iter::once(Query::new(Some(command), SUDO_ACTION))
		.chain(
			args.iter()
				.map(|s| s.as_ref())
				.filter(|arg| !arg.is_empty())
				.map(|arg| Query::new(Some(arg), command)),
		)
		.collect()
}

/// First outcome that is not `Allowed`, or `Allowed` if there is none.
pub fn reduce_outcomes(results: &[AccessResult]) -> ResultKind {
	results
		.iter()
		.map(|r| r.outcome)
		.find(|kind| *kind != ResultKind::Allowed)
		.unwrap_or(ResultKind::Allowed)
}

/// Authorizes running `argv` as `principal_id`.
///
/// A bare command is a single evaluation; a command with arguments is one
/// batch. A batch that yields no results is an `Error`.
pub async fn authorize_sudo_invocation<S: AsRef<str>>(
	client: &AccessClient,
	principal_id: &str,
	argv: &[S],
) -> ResultKind {
	let queries = build_queries(argv);
	let Some(first) = queries.first() else {
		return ResultKind::Error;
	};
	if first.asset_id.as_deref().map_or(true, str::is_empty) {
		return ResultKind::Error;
	}

	if queries.len() == 1 {
		return client
			.evaluate_one(principal_id, first.asset_id.as_deref(), Some(SUDO_ACTION))
			.await
			.outcome;
	}

	debug!(
		principal_id = %principal_id,
		queries = queries.len(),
		"Authorizing sudo invocation with arguments"
	);

	match client.evaluate_queries(principal_id, queries).await {
		Some(results) => reduce_outcomes(&results),
		None => ResultKind::Error,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sgnl_access_core::Verdict;

	fn result(kind: ResultKind) -> AccessResult {
		let pending = AccessResult::pending("alice", "req", &Query::new(Some("x"), "sudo"));
		match kind {
			ResultKind::Allowed => pending.decide(Verdict::Allow, None),
			ResultKind::Denied => pending.decide(Verdict::Deny, None),
			other => pending.fail(other, "failed"),
		}
	}

	#[test]
	fn command_only() {
		assert_eq!(build_queries(&["ls"]), vec![Query::new(Some("ls"), "sudo")]);
	}

	#[test]
	fn arguments_are_scoped_to_command() {
		assert_eq!(
			build_queries(&["cat", "/etc/passwd"]),
			vec![
				Query::new(Some("cat"), "sudo"),
				Query::new(Some("/etc/passwd"), "cat"),
			]
		);
	}

	#[test]
	fn empty_arguments_are_skipped() {
		let queries = build_queries(&["cp", "", "a", "", "b"]);
		let assets: Vec<_> = queries.iter().map(|q| q.asset_id.clone().unwrap()).collect();
		assert_eq!(assets, vec!["cp", "a", "b"]);
	}

	#[test]
	fn empty_argv_builds_nothing() {
		assert!(build_queries::<&str>(&[]).is_empty());
	}

	#[test]
	fn all_allowed() {
		let results = [result(ResultKind::Allowed), result(ResultKind::Allowed)];
		assert_eq!(reduce_outcomes(&results), ResultKind::Allowed);
	}

	#[test]
	fn first_failure_wins() {
		let results = [
			result(ResultKind::Allowed),
			result(ResultKind::NetworkError),
			result(ResultKind::Denied),
		];
		assert_eq!(reduce_outcomes(&results), ResultKind::NetworkError);

		let results = [result(ResultKind::Denied), result(ResultKind::AuthError)];
		assert_eq!(reduce_outcomes(&results), ResultKind::Denied);
	}
}
