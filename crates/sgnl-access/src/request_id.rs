// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request ids sent as `X-Request-Id`.
//!
//! Format: `sgnl-{time:08x}-{pid:04x}-{mixed:04x}`, where `time` is the low 32
//! bits of the unix time in seconds, `pid` the low 16 bits of the process id,
//! and `mixed` the low 16 bits of the sub-second nanoseconds xor the pid.
//! Ids are for tracing only and are not secret.

use chrono::Utc;

pub const REQUEST_ID_PREFIX: &str = "sgnl-";

/// Mints a new request id from the current time and process id.
pub fn new_request_id() -> String {
	let now = Utc::now();
	format_request_id(
		now.timestamp() as u32,
		now.timestamp_subsec_nanos(),
		std::process::id(),
	)
}

fn format_request_id(secs: u32, nanos: u32, pid: u32) -> String {
	format!(
		"{REQUEST_ID_PREFIX}{:08x}-{:04x}-{:04x}",
		secs,
		pid & 0xFFFF,
		(nanos ^ pid) & 0xFFFF
	)
}
