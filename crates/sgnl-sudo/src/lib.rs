// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sudo authorization on top of the SGNL access client.
//!
//! A sudo invocation is authorized only if every part of it is: the command
//! itself (action `"sudo"`), and each non-empty argument as an asset acted on
//! by that command (action = the command name). The first query that is not
//! allowed decides the outcome.

mod command;
mod composer;
mod policy;

pub use command::{resolve_command_path, resolve_username, CommandInfo, DEFAULT_SEARCH_PATH};
pub use composer::{authorize_sudo_invocation, build_queries, reduce_outcomes, SUDO_ACTION};
pub use policy::{PolicyDecision, SudoPolicy};
