// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device identity for the evaluation principal.
//!
//! The host identity is resolved through a fallback chain, first usable value
//! wins:
//!
//! 1. The machine id file (`/etc/machine-id`), trailing newline stripped
//! 2. The network hostname
//! 3. The hardware address of `eth0`, then `wlan0`, then any other
//!    non-loopback interface under `/sys/class/net`
//! 4. The sentinel [`UNKNOWN_DEVICE`]
//!
//! Resolution never fails. [`ProcessIdentity`] resolves once per process and
//! caches the answer; tests inject a [`StaticDeviceIdentity`] instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Returned when no host source yields an identifier.
pub const UNKNOWN_DEVICE: &str = "unknown-device";

const MACHINE_ID_PATH: &str = "/etc/machine-id";
const NET_CLASS_DIR: &str = "/sys/class/net";
const PREFERRED_INTERFACES: [&str; 2] = ["eth0", "wlan0"];

/// Supplies the `deviceId` sent with every principal.
pub trait DeviceIdentity: Send + Sync {
	fn device_id(&self) -> String;
}

/// Reads the host's identity sources on every call.
#[derive(Debug, Clone)]
pub struct HostIdentity {
	machine_id_path: PathBuf,
	net_class_dir: PathBuf,
	use_hostname: bool,
}

impl Default for HostIdentity {
	fn default() -> Self {
		Self {
			machine_id_path: PathBuf::from(MACHINE_ID_PATH),
			net_class_dir: PathBuf::from(NET_CLASS_DIR),
			use_hostname: true,
		}
	}
}

impl HostIdentity {
	/// Uses alternative locations for the machine id file and the network
	/// class directory.
	pub fn with_roots(machine_id_path: impl Into<PathBuf>, net_class_dir: impl Into<PathBuf>) -> Self {
		Self {
			machine_id_path: machine_id_path.into(),
			net_class_dir: net_class_dir.into(),
			use_hostname: true,
		}
	}

	/// Skips the hostname step.
	pub fn without_hostname(mut self) -> Self {
		self.use_hostname = false;
		self
	}

	pub fn resolve(&self) -> String {
		if let Some(id) = read_first_line(&self.machine_id_path) {
			debug!(source = "machine-id", "resolved device id");
			return id;
		}

		if self.use_hostname {
			if let Some(name) = hostname::get()
				.ok()
				.map(|h| h.to_string_lossy().to_string())
				.filter(|h| !h.is_empty())
			{
				debug!(source = "hostname", "resolved device id");
				return name;
			}
		}

		if let Some(mac) = self.interface_address() {
			debug!(source = "interface", "resolved device id");
			return mac;
		}

		debug!("no host identity source available");
		UNKNOWN_DEVICE.to_string()
	}

	fn interface_address(&self) -> Option<String> {
		for iface in PREFERRED_INTERFACES {
			if let Some(mac) = read_first_line(&self.net_class_dir.join(iface).join("address")) {
				return Some(mac);
			}
		}

		let mut names: Vec<String> = fs::read_dir(&self.net_class_dir)
			.ok()?
			.filter_map(|entry| entry.ok())
			.map(|entry| entry.file_name().to_string_lossy().to_string())
			.filter(|name| name != "lo" && !name.starts_with('.'))
			.collect();
		names.sort();

		names
			.iter()
			.find_map(|name| read_first_line(&self.net_class_dir.join(name).join("address")))
	}
}

impl DeviceIdentity for HostIdentity {
	fn device_id(&self) -> String {
		self.resolve()
	}
}

fn read_first_line(path: &Path) -> Option<String> {
	let contents = fs::read_to_string(path).ok()?;
	let line = contents.lines().next()?.trim_end();
	if line.is_empty() {
		None
	} else {
		Some(line.to_string())
	}
}

static PROCESS_DEVICE_ID: OnceLock<String> = OnceLock::new();

/// Resolves the host identity once and returns the cached value afterwards.
pub fn resolve_device_id() -> String {
	PROCESS_DEVICE_ID
		.get_or_init(|| HostIdentity::default().resolve())
		.clone()
}

/// The default provider: the host identity, cached for the process lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessIdentity;

impl DeviceIdentity for ProcessIdentity {
	fn device_id(&self) -> String {
		resolve_device_id()
	}
}

/// A fixed device id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDeviceIdentity(String);

impl StaticDeviceIdentity {
	pub fn new(device_id: impl Into<String>) -> Self {
		Self(device_id.into())
	}
}

impl DeviceIdentity for StaticDeviceIdentity {
	fn device_id(&self) -> String {
		self.0.clone()
	}
}
