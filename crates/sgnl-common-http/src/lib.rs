// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for SGNL access clients.
//!
//! This crate provides:
//! - An HTTP client builder driven by [`HttpSettings`] (user agent, timeouts,
//!   TLS verification)
//! - Bounded retry with exponential backoff for transient failures

mod client;
mod retry;

pub use client::{build_client, builder, HttpSettings, DEFAULT_USER_AGENT};
pub use retry::{retry, RetryConfig, RetryableError};
