// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for SGNL access clients.
//!
//! Settings are read from a JSON file. The path is resolved in this order:
//!
//! 1. An explicit path passed to [`Config::load`]
//! 2. The `SGNL_CONFIG_PATH` environment variable
//! 3. `/etc/sgnl/config.json`
//!
//! Missing optional fields take their defaults. The loaded config is validated
//! before it is returned, so a [`Config`] value is always usable.

mod error;
mod settings;
mod token;

pub use error::{ConfigError, Result};
pub use settings::{
	resolve_path, Config, HttpConfig, RetryConfig, SudoConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH,
};
pub use token::ApiToken;
