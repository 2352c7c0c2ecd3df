//! Google Cloud Pub/Sub emulator adapter.
//!
//! Client libraries pick the emulator up from `PUBSUB_EMULATOR_HOST`;
//! [`PubSubConnection::env_var`] returns that pair.
//!
//! # Options
//! - `image` / `tag`: image reference
//!   (default `gcr.io/google.com/cloudsdktool/google-cloud-cli:emulators`)
//! - `project`: project id the emulator serves (default `test-project`)

use crate::docker::DockerResource;
use crate::error::{AdapterError, AdapterResult};
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ContainerSettings, ResourceHandle, StopOptions,
};
use serde::Deserialize;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::{GenericImage, ImageExt};

pub const KIND: &str = "google_pubsub";
pub const PUBSUB_PORT: u16 = 8085;
pub const EMULATOR_HOST_VAR: &str = "PUBSUB_EMULATOR_HOST";

const READY_MESSAGE: &str = "Server started, listening on";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PubSubOptions {
	pub image: String,
	pub tag: String,
	pub project: String,
}

impl Default for PubSubOptions {
	fn default() -> Self {
		Self {
			image: "gcr.io/google.com/cloudsdktool/google-cloud-cli".to_string(),
			tag: "emulators".to_string(),
			project: "test-project".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubConnection {
	pub project: String,
	/// `host:port`
	pub emulator_host: String,
}

impl PubSubConnection {
	pub fn env_var(&self) -> (&'static str, &str) {
		(EMULATOR_HOST_VAR, &self.emulator_host)
	}
}

#[derive(Debug)]
pub struct PubSubContainer {
	resource: DockerResource<GenericImage>,
	project: String,
}

impl PubSubContainer {
	pub fn new(options: PubSubOptions, settings: &ContainerSettings) -> Self {
		let request = GenericImage::new(options.image, options.tag)
			.with_exposed_port(PUBSUB_PORT.tcp())
			.with_wait_for(WaitFor::message_on_stderr(READY_MESSAGE))
			.with_cmd(emulator_command(&options.project))
			.with_startup_timeout(settings.startup_timeout);
		Self {
			resource: DockerResource::new(KIND, request),
			project: options.project,
		}
	}

	pub fn connection(&self) -> AdapterResult<PubSubConnection> {
		Ok(PubSubConnection {
			project: self.project.clone(),
			emulator_host: self.resource.address(PUBSUB_PORT)?,
		})
	}
}

fn emulator_command(project: &str) -> Vec<String> {
	vec![
		"gcloud".to_string(),
		"beta".to_string(),
		"emulators".to_string(),
		"pubsub".to_string(),
		"start".to_string(),
		format!("--host-port=0.0.0.0:{}", PUBSUB_PORT),
		format!("--project={}", project),
	]
}

impl ResourceHandle for PubSubContainer {
	fn start(&mut self) -> Result<(), BoxError> {
		self.resource.start()
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.resource.stop(options)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PubSubPlugin;

impl ContainerPlugin for PubSubPlugin {
	type Handle = PubSubContainer;
	type Client = PubSubConnection;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<PubSubContainer, BoxError> {
		Ok(PubSubContainer::new(
			options.parse()?,
			&ContainerSettings::from_env(),
		))
	}

	fn get_client(&self, handle: &PubSubContainer) -> Result<PubSubConnection, BoxError> {
		handle.connection().map_err(AdapterError::boxed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_emulator_command_binds_all_interfaces() {
		let command = emulator_command("orders");
		assert_eq!(command[..5], ["gcloud", "beta", "emulators", "pubsub", "start"]);
		assert!(command.contains(&"--host-port=0.0.0.0:8085".to_string()));
		assert!(command.contains(&"--project=orders".to_string()));
	}

	#[rstest]
	fn test_env_var_points_at_emulator() {
		let connection = PubSubConnection {
			project: "test-project".to_string(),
			emulator_host: "localhost:32771".to_string(),
		};
		assert_eq!(
			connection.env_var(),
			("PUBSUB_EMULATOR_HOST", "localhost:32771")
		);
	}

	#[rstest]
	#[ignore = "Requires Docker"]
	fn test_pubsub_emulator_starts() {
		let plugin = PubSubPlugin;
		let mut handle = plugin.create_container(&ContainerOptions::new()).unwrap();
		handle.start().unwrap();

		let connection = plugin.get_client(&handle).unwrap();
		assert_eq!(connection.project, "test-project");

		handle.stop(StopOptions::default()).unwrap();
	}
}
