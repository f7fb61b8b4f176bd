// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command resolution and the command info handed back to sudo.

use std::path::{Path, PathBuf};

/// Search path used when `PATH` is unset.
pub const DEFAULT_SEARCH_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

const COMMAND_TIMEOUT_SECS: u32 = 300;

/// Resolves `command` to an executable path.
///
/// A command containing `/` is returned as given. Otherwise each directory
/// of `search_path` (or [`DEFAULT_SEARCH_PATH`]) is tried in order.
pub fn resolve_command_path(command: &str, search_path: Option<&str>) -> Option<PathBuf> {
	if command.is_empty() {
		return None;
	}
	if command.contains('/') {
		return Some(PathBuf::from(command));
	}

	search_path
		.unwrap_or(DEFAULT_SEARCH_PATH)
		.split(':')
		.filter(|dir| !dir.is_empty())
		.map(|dir| Path::new(dir).join(command))
		.find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
	use std::os::unix::fs::PermissionsExt;
	path.metadata()
		.map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
		.unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
	path.is_file()
}

/// The invoking user: the `user=` entry of sudo's user info, then
/// `SUDO_USER`, then `USER`, else `"unknown"`.
pub fn resolve_username<S: AsRef<str>>(user_info: &[S]) -> String {
	username_from(user_info, |key| std::env::var(key).ok())
}

fn username_from<S, F>(user_info: &[S], env: F) -> String
where
	S: AsRef<str>,
	F: Fn(&str) -> Option<String>,
{
	user_info
		.iter()
		.find_map(|entry| entry.as_ref().strip_prefix("user="))
		.filter(|user| !user.is_empty())
		.map(str::to_string)
		.or_else(|| env("SUDO_USER").filter(|u| !u.is_empty()))
		.or_else(|| env("USER").filter(|u| !u.is_empty()))
		.unwrap_or_else(|| "unknown".to_string())
}

/// What sudo should run once a command is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
	pub command: PathBuf,
	pub runas_uid: u32,
	pub runas_gid: u32,
	pub cwd: Option<PathBuf>,
	pub timeout: u32,
}

impl CommandInfo {
	/// Runs `command` as root from the current directory.
	pub fn new(command: PathBuf) -> Self {
		Self {
			command,
			runas_uid: 0,
			runas_gid: 0,
			cwd: std::env::current_dir().ok(),
			timeout: COMMAND_TIMEOUT_SECS,
		}
	}

	/// `key=value` entries in the order sudo expects them.
	pub fn to_strings(&self) -> Vec<String> {
		let mut info = vec![
			format!("command={}", self.command.display()),
			format!("runas_uid={}", self.runas_uid),
			format!("runas_gid={}", self.runas_gid),
		];
		if let Some(cwd) = &self.cwd {
			info.push(format!("cwd={}", cwd.display()));
		}
		info.push(format!("timeout={}", self.timeout));
		info
	}
}
