// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded retry with exponential backoff.

use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
	/// Extra attempts after the first one. Zero disables retry.
	pub max_retries: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 0,
			base_delay: Duration::from_millis(1000),
			max_delay: Duration::from_secs(30),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	pub fn new(max_retries: u32, base_delay: Duration) -> Self {
		Self {
			max_retries,
			base_delay,
			..Self::default()
		}
	}

	/// A config that never retries.
	pub fn disabled() -> Self {
		Self::default()
	}
}

pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

/// Backoff before retry number `attempt + 1`: `base * factor^attempt`,
/// capped at `max_delay`, then scaled into `[0.5, 1.5)` when jitter is on.
fn calculate_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
	let backoff = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(attempt as i32);
	let capped = backoff.min(cfg.max_delay.as_secs_f64());
	let scale = if cfg.jitter { 0.5 + fastrand::f64() } else { 1.0 };
	Duration::from_secs_f64(capped * scale)
}

/// Runs `f` until it succeeds, fails with a non-retryable error, or
/// `cfg.max_retries` extra attempts have been spent.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: std::future::Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let mut attempt = 0;
	loop {
		let err = match f().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};

		if !err.is_retryable() || attempt >= cfg.max_retries {
			if attempt > 0 {
				debug!(error = ?err, attempts = attempt + 1, "giving up");
			}
			return Err(err);
		}

		let delay = calculate_delay(cfg, attempt);
		attempt += 1;
		debug!(
			error = ?err,
			attempt,
			delay_ms = delay.as_millis() as u64,
			"transient failure, backing off"
		);
		tokio::time::sleep(delay).await;
	}
}
