// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::result::ResultKind;

/// Classifies an HTTP status before any body is parsed.
///
/// Returns `None` for 200, meaning the body should be parsed for decisions.
/// Every other status maps to a failure kind.
pub fn classify_status(status: u16) -> Option<ResultKind> {
	match status {
		200 => None,
		401 | 403 => Some(ResultKind::AuthError),
		s if s >= 500 => Some(ResultKind::NetworkError),
		_ => Some(ResultKind::Error),
	}
}
