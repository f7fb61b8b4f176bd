// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sgnl_access::AccessClient;
use sgnl_access_core::{ResultKind, DEFAULT_ACTION};
use sgnl_config::SudoConfig;
use tracing::{error, info, warn};

use crate::command::{resolve_command_path, CommandInfo};
use crate::composer::authorize_sudo_invocation;

/// Answer to a sudo policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
	/// Run the command. `message` is shown to the user when access messages
	/// are enabled.
	Accept {
		command_info: CommandInfo,
		message: Option<String>,
	},
	/// The command must not run.
	Reject { message: String },
	/// The check itself could not be carried out.
	Error { message: String },
}

impl PolicyDecision {
	pub fn is_accept(&self) -> bool {
		matches!(self, PolicyDecision::Accept { .. })
	}
}

/// Sudo policy backed by access evaluations.
pub struct SudoPolicy {
	client: AccessClient,
	settings: SudoConfig,
	search_path: Option<String>,
}

impl SudoPolicy {
	pub fn new(client: AccessClient, settings: SudoConfig) -> Self {
		Self {
			client,
			settings,
			search_path: std::env::var("PATH").ok(),
		}
	}

	/// Overrides the directories searched when resolving a bare command name.
	pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
		self.search_path = Some(search_path.into());
		self
	}

	/// Decides whether `user` may run `argv`.
	pub async fn check<S: AsRef<str>>(&self, user: &str, argv: &[S]) -> PolicyDecision {
		let Some(command) = argv.first().map(|s| s.as_ref()).filter(|c| !c.is_empty()) else {
			return PolicyDecision::Reject {
				message: "No command specified".to_string(),
			};
		};
		if user.is_empty() {
			return PolicyDecision::Error {
				message: "Cannot determine username".to_string(),
			};
		}

		let outcome = authorize_sudo_invocation(&self.client, user, argv).await;
		if outcome != ResultKind::Allowed {
			let command_line = argv.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(" ");
			if outcome.is_service_unavailable() {
				error!(
					user = %user,
					command = %command,
					outcome = %outcome,
					"access service unavailable"
				);
				return PolicyDecision::Error {
					message: format!(
						"Access service unavailable for {user} to run '{command_line}': {outcome}"
					),
				};
			}

			warn!(user = %user, command = %command, outcome = %outcome, "sudo rejected");
			return PolicyDecision::Reject {
				message: format!("Access denied for {user} to run '{command_line}': {outcome}"),
			};
		}

		let Some(path) = resolve_command_path(command, self.search_path.as_deref()) else {
			warn!(command = %command, "sudo command not found");
			return PolicyDecision::Reject {
				message: format!("Command not found: {command}"),
			};
		};

		info!(user = %user, command = %path.display(), "sudo accepted");
		PolicyDecision::Accept {
			command_info: CommandInfo::new(path),
			message: self
				.settings
				.access_msg
				.then(|| format!("Access granted for {user} to run {command}")),
		}
	}

	/// Describes what `user` may run: a verdict for `command` when given,
	/// otherwise the list of allowed commands.
	pub async fn list(&self, user: &str, command: Option<&str>) -> String {
		if let Some(command) = command {
			let outcome = self
				.client
				.check_access(user, command, Some(DEFAULT_ACTION))
				.await;
			return if outcome == ResultKind::Allowed {
				format!("You are allowed to execute '{command}'")
			} else {
				format!("You are NOT allowed to execute '{command}'")
			};
		}

		match self.client.search_assets(user, Some(DEFAULT_ACTION)).await {
			Some(assets) if !assets.is_empty() => {
				let mut listing = String::from("Allowed commands:");
				for asset in assets {
					listing.push_str("\n  - ");
					listing.push_str(&asset);
				}
				listing
			}
			_ => "No commands are currently allowed.".to_string(),
		}
	}

	pub fn version() -> String {
		format!(
			"SGNL sudo policy plugin version {}",
			env!("CARGO_PKG_VERSION")
		)
	}
}
