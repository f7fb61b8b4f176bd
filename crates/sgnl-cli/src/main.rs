// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `sgnl` - diagnostic command line for SGNL access evaluations.
//!
//! Exit status: 0 when access is allowed (or the command succeeded), 1 when
//! it is denied, 2 on any error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sgnl_access::{new_request_id, resolve_device_id, AccessClient, AccessResult, ResultKind};
use sgnl_config::Config;
use sgnl_pam::{check_account, PamVerdict};
use sgnl_sudo::authorize_sudo_invocation;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// SGNL access evaluation client
#[derive(Parser, Debug)]
#[command(name = "sgnl", version, about, long_about = None)]
struct Args {
	/// Path to the configuration file
	#[arg(short, long, global = true, env = "SGNL_CONFIG_PATH")]
	config: Option<PathBuf>,

	/// Enable debug logging
	#[arg(short, long, global = true)]
	verbose: bool,

	/// Output logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	/// Print results as JSON
	#[arg(long, global = true)]
	json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Evaluate a single query
	Check {
		principal: String,
		asset: String,
		/// Action to evaluate (default: execute)
		#[arg(short, long)]
		action: Option<String>,
	},
	/// Evaluate several queries in one request
	Batch {
		principal: String,
		/// Query as ASSET or ASSET:ACTION
		#[arg(short, long = "query", value_name = "ASSET[:ACTION]", required = true)]
		queries: Vec<String>,
	},
	/// Authorize a sudo invocation
	Sudo {
		principal: String,
		/// Command and arguments
		#[arg(last = true, required = true)]
		argv: Vec<String>,
	},
	/// Run the PAM account check
	Pam { user: String, service: String },
	/// List assets the principal is allowed to use
	Search {
		principal: String,
		/// Action to search for (default: list)
		#[arg(short, long)]
		action: Option<String>,
	},
	/// Print this host's device id
	DeviceId,
	/// Print a fresh request id
	RequestId,
}

const EXIT_ALLOWED: u8 = 0;
const EXIT_DENIED: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn init_tracing(level: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("sgnl={level}")));

	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.init();
	}
}

fn exit_status(outcome: ResultKind) -> u8 {
	match outcome {
		ResultKind::Allowed | ResultKind::Ok => EXIT_ALLOWED,
		ResultKind::Denied => EXIT_DENIED,
		_ => EXIT_ERROR,
	}
}

fn exit_for(outcome: ResultKind) -> ExitCode {
	ExitCode::from(exit_status(outcome))
}

/// Splits `asset[:action]` at the last colon.
fn parse_query(raw: &str) -> Result<(String, Option<String>)> {
	let (asset, action) = match raw.rsplit_once(':') {
		Some((asset, action)) => (asset, Some(action)),
		None => (raw, None),
	};
	if asset.is_empty() {
		bail!("query '{raw}' has an empty asset");
	}
	if action == Some("") {
		bail!("query '{raw}' has an empty action");
	}
	Ok((asset.to_string(), action.map(str::to_string)))
}

fn print_result(result: &AccessResult, json: bool) -> Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(result)?);
		return Ok(());
	}

	let asset = result.asset_id.as_deref().unwrap_or("-");
	match (&result.reason, &result.error_message) {
		(_, Some(error)) => println!("{asset} {}: {} ({error})", result.action, result.outcome),
		(Some(reason), None) => {
			println!("{asset} {}: {} ({reason})", result.action, result.outcome)
		}
		(None, None) => println!("{asset} {}: {}", result.action, result.outcome),
	}
	Ok(())
}

fn connect(args: &Args) -> Result<AccessClient> {
	let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
	let level = if args.verbose || config.is_debug_enabled() {
		"debug"
	} else {
		config.log_level()
	};
	init_tracing(level, args.json_logs);

	AccessClient::from_config(&config).context("failed to create access client")
}

async fn run(args: Args) -> Result<ExitCode> {
	match &args.command {
		Command::DeviceId => {
			println!("{}", resolve_device_id());
			return Ok(ExitCode::SUCCESS);
		}
		Command::RequestId => {
			println!("{}", new_request_id());
			return Ok(ExitCode::SUCCESS);
		}
		_ => {}
	}

	let client = connect(&args)?;
	debug!(base_url = %client.base_url(), "client ready");

	let code = match &args.command {
		Command::Check {
			principal,
			asset,
			action,
		} => {
			let result = client
				.evaluate_one(principal, Some(asset.as_str()), action.as_deref())
				.await;
			print_result(&result, args.json)?;
			exit_for(result.outcome)
		}
		Command::Batch {
			principal,
			queries,
		} => {
			let parsed = queries
				.iter()
				.map(String::as_str)
				.map(parse_query)
				.collect::<Result<Vec<_>>>()?;
			let assets: Vec<&str> = parsed.iter().map(|(a, _)| a.as_str()).collect();
			let actions: Vec<&str> = parsed
				.iter()
				.map(|(_, action)| action.as_deref().unwrap_or(sgnl_access_core::DEFAULT_ACTION))
				.collect();

			let Some(results) = client
				.evaluate_batch(principal, &assets, Some(actions.as_slice()))
				.await
			else {
				bail!(
					"batch evaluation failed: {}",
					client.last_error().unwrap_or_else(|| "no result".to_string())
				);
			};

			for result in &results {
				print_result(result, args.json)?;
			}
			let overall = results
				.iter()
				.map(|r| r.outcome)
				.find(|k| *k != ResultKind::Allowed)
				.unwrap_or(ResultKind::Allowed);
			exit_for(overall)
		}
		Command::Sudo { principal, argv } => {
			let outcome = authorize_sudo_invocation(&client, principal, argv.as_slice()).await;
			println!("{}: {outcome}", argv.join(" "));
			exit_for(outcome)
		}
		Command::Pam { user, service } => {
			let verdict = check_account(&client, Some(user.as_str()), Some(service.as_str())).await;
			println!("{verdict}");
			ExitCode::from(match verdict {
				PamVerdict::Success => EXIT_ALLOWED,
				PamVerdict::PermissionDenied => EXIT_DENIED,
				PamVerdict::AuthInfoUnavailable => EXIT_ERROR,
			})
		}
		Command::Search { principal, action } => {
			let Some(assets) = client.search_assets(principal, action.as_deref()).await else {
				bail!(
					"search failed: {}",
					client.last_error().unwrap_or_else(|| "no result".to_string())
				);
			};
			if args.json {
				println!("{}", serde_json::to_string_pretty(&assets)?);
			} else {
				for asset in &assets {
					println!("{asset}");
				}
			}
			ExitCode::SUCCESS
		}
		Command::DeviceId | Command::RequestId => ExitCode::SUCCESS,
	};

	client.close();
	Ok(code)
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();
	match run(args).await {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::from(EXIT_ERROR)
		}
	}
}
