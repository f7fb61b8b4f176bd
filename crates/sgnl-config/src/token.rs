// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for the policy service bearer token.

use std::fmt;
use zeroize::Zeroize;

const REDACTED: &str = "[REDACTED]";

/// The API token used as a bearer credential.
///
/// Debug and Display print `[REDACTED]`, and the bytes are zeroed on drop.
/// There is no `Deref`; call [`ApiToken::expose`] where the raw value is
/// needed (building the `Authorization` header).
#[derive(Clone, Default, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct ApiToken(String);

impl ApiToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for ApiToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ApiToken").field(&REDACTED).finish()
	}
}

impl fmt::Display for ApiToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for ApiToken {
	fn from(token: String) -> Self {
		Self(token)
	}
}

impl From<&str> for ApiToken {
	fn from(token: &str) -> Self {
		Self(token.to_string())
	}
}
