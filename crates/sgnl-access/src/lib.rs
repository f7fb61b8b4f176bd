// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client SDK for the SGNL access evaluation API.
//!
//! [`AccessClient`] sends (principal, asset, action) queries to the policy
//! service and returns one [`AccessResult`] per query. Every request carries
//! the host's device id and a fresh request id for tracing.
//!
//! # Example
//!
//! ```ignore
//! use sgnl_access::AccessClient;
//! use sgnl_config::Config;
//!
//! let config = Config::load(None)?;
//! let client = AccessClient::from_config(&config)?;
//!
//! let results = client
//!     .evaluate_batch("alice", &["cat", "/etc/passwd"], Some(&["sudo", "cat"]))
//!     .await;
//! ```

mod client;
mod error;
pub mod identity;
mod request_id;

pub use client::{endpoint_base, AccessClient, AccessClientBuilder, EVALUATIONS_PATH, SEARCH_PATH};
pub use error::{ClientError, Result, TransportError};
pub use identity::{
	resolve_device_id, DeviceIdentity, HostIdentity, ProcessIdentity, StaticDeviceIdentity,
	UNKNOWN_DEVICE,
};
pub use request_id::{new_request_id, REQUEST_ID_PREFIX};

pub use sgnl_access_core::{AccessResult, Query, ResultKind, SearchResult, Verdict};
pub use sgnl_common_http::RetryConfig;
pub use sgnl_config::{ApiToken, Config};
