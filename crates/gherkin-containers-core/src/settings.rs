//! Environment-driven settings.
//!
//! # Environment Variables
//! - `GHERKIN_CONTAINERS_DISCOVERY`: enable link-time plugin discovery in the
//!   global registry (default: true)
//! - `GHERKIN_CONTAINERS_STOP_FORCE`: skip the graceful stop before removing a
//!   container (default: true)
//! - `GHERKIN_CONTAINERS_DELETE_VOLUMES`: remove volumes with the container
//!   (default: true)
//! - `GHERKIN_CONTAINERS_STARTUP_TIMEOUT_SECS`: upper bound for adapters'
//!   readiness waits (default: 120)

use std::time::Duration;

pub const DISCOVERY_ENV: &str = "GHERKIN_CONTAINERS_DISCOVERY";
pub const STOP_FORCE_ENV: &str = "GHERKIN_CONTAINERS_STOP_FORCE";
pub const DELETE_VOLUMES_ENV: &str = "GHERKIN_CONTAINERS_DELETE_VOLUMES";
pub const STARTUP_TIMEOUT_ENV: &str = "GHERKIN_CONTAINERS_STARTUP_TIMEOUT_SECS";

const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 120;

/// Flags forwarded to `ResourceHandle::stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOptions {
	pub force: bool,
	pub delete_volume: bool,
}

impl Default for StopOptions {
	fn default() -> Self {
		Self {
			force: true,
			delete_volume: true,
		}
	}
}

/// Runtime settings for registries, managers and adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSettings {
	pub discovery: bool,
	pub stop: StopOptions,
	pub startup_timeout: Duration,
}

impl Default for ContainerSettings {
	fn default() -> Self {
		Self {
			discovery: true,
			stop: StopOptions::default(),
			startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
		}
	}
}

impl ContainerSettings {
	/// Read settings from the environment, falling back to defaults for unset
	/// or unparsable values.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Same as [`ContainerSettings::from_env`] with a custom variable source.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let defaults = Self::default();
		let flag = |key: &str, default: bool| {
			lookup(key)
				.and_then(|value| parse_flag(&value))
				.unwrap_or(default)
		};

		let startup_timeout = lookup(STARTUP_TIMEOUT_ENV)
			.and_then(|value| value.trim().parse::<u64>().ok())
			.map(Duration::from_secs)
			.unwrap_or(defaults.startup_timeout);

		Self {
			discovery: flag(DISCOVERY_ENV, defaults.discovery),
			stop: StopOptions {
				force: flag(STOP_FORCE_ENV, defaults.stop.force),
				delete_volume: flag(DELETE_VOLUMES_ENV, defaults.stop.delete_volume),
			},
			startup_timeout,
		}
	}
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}
