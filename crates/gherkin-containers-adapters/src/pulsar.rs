//! Apache Pulsar adapter running a standalone broker.
//!
//! # Options
//! - `image` / `tag`: image reference (default `apachepulsar/pulsar:3.0.0`)

use crate::docker::DockerResource;
use crate::error::{AdapterError, AdapterResult};
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ContainerSettings, ResourceHandle, StopOptions,
};
use serde::Deserialize;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::{GenericImage, ImageExt};

pub const KIND: &str = "pulsar";
pub const BROKER_PORT: u16 = 6650;
pub const ADMIN_PORT: u16 = 8080;

const READY_MESSAGE: &str = "messaging service is ready";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PulsarOptions {
	pub image: String,
	pub tag: String,
}

impl Default for PulsarOptions {
	fn default() -> Self {
		Self {
			image: "apachepulsar/pulsar".to_string(),
			tag: "3.0.0".to_string(),
		}
	}
}

/// Broker and admin endpoints of a running standalone instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulsarConnection {
	/// `pulsar://host:port`
	pub broker_url: String,
	/// `http://host:port`
	pub admin_url: String,
}

impl PulsarConnection {
	pub fn new(host: &str, broker_port: u16, admin_port: u16) -> Self {
		Self {
			broker_url: format!("pulsar://{}:{}", host, broker_port),
			admin_url: format!("http://{}:{}", host, admin_port),
		}
	}
}

#[derive(Debug)]
pub struct PulsarContainer {
	resource: DockerResource<GenericImage>,
}

impl PulsarContainer {
	pub fn new(options: PulsarOptions, settings: &ContainerSettings) -> Self {
		let request = GenericImage::new(options.image, options.tag)
			.with_exposed_port(BROKER_PORT.tcp())
			.with_exposed_port(ADMIN_PORT.tcp())
			.with_wait_for(WaitFor::message_on_stdout(READY_MESSAGE))
			.with_cmd(["bin/pulsar", "standalone"])
			.with_startup_timeout(settings.startup_timeout);
		Self {
			resource: DockerResource::new(KIND, request),
		}
	}

	pub fn connection(&self) -> AdapterResult<PulsarConnection> {
		Ok(PulsarConnection::new(
			&self.resource.host()?,
			self.resource.host_port(BROKER_PORT)?,
			self.resource.host_port(ADMIN_PORT)?,
		))
	}
}

impl ResourceHandle for PulsarContainer {
	fn start(&mut self) -> Result<(), BoxError> {
		self.resource.start()
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.resource.stop(options)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PulsarPlugin;

impl ContainerPlugin for PulsarPlugin {
	type Handle = PulsarContainer;
	type Client = PulsarConnection;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<PulsarContainer, BoxError> {
		Ok(PulsarContainer::new(
			options.parse()?,
			&ContainerSettings::from_env(),
		))
	}

	fn get_client(&self, handle: &PulsarContainer) -> Result<PulsarConnection, BoxError> {
		handle.connection().map_err(AdapterError::boxed)
	}
}
