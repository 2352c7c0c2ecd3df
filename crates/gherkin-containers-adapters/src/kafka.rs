//! Kafka adapter on the `testcontainers-modules` Apache Kafka image.
//!
//! The client is a connection descriptor; steps bring their own Kafka
//! client library and point it at [`KafkaConnection::bootstrap_servers`].
//!
//! # Options
//! - `tag`: image tag override

use crate::docker::DockerResource;
use crate::error::{AdapterError, AdapterResult};
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ContainerSettings, ResourceHandle, StopOptions,
};
use serde::Deserialize;
use testcontainers::{ContainerRequest, ImageExt};
use testcontainers_modules::kafka::apache::Kafka;

pub const KIND: &str = "kafka";
/// Listener advertised to clients outside the container network
pub const KAFKA_PORT: u16 = 9092;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KafkaOptions {
	pub tag: Option<String>,
}

/// Where to reach the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaConnection {
	pub bootstrap_servers: String,
}

#[derive(Debug)]
pub struct KafkaContainer {
	resource: DockerResource<Kafka>,
}

impl KafkaContainer {
	pub fn new(options: KafkaOptions, settings: &ContainerSettings) -> Self {
		let mut request: ContainerRequest<Kafka> = Kafka::default().into();
		if let Some(tag) = options.tag {
			request = request.with_tag(tag);
		}
		Self {
			resource: DockerResource::new(KIND, request.with_startup_timeout(settings.startup_timeout)),
		}
	}

	pub fn bootstrap_servers(&self) -> AdapterResult<String> {
		self.resource.address(KAFKA_PORT)
	}
}

impl ResourceHandle for KafkaContainer {
	fn start(&mut self) -> Result<(), BoxError> {
		self.resource.start()
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.resource.stop(options)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KafkaPlugin;

impl ContainerPlugin for KafkaPlugin {
	type Handle = KafkaContainer;
	type Client = KafkaConnection;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<KafkaContainer, BoxError> {
		Ok(KafkaContainer::new(
			options.parse()?,
			&ContainerSettings::from_env(),
		))
	}

	fn get_client(&self, handle: &KafkaContainer) -> Result<KafkaConnection, BoxError> {
		let bootstrap_servers = handle.bootstrap_servers().map_err(AdapterError::boxed)?;
		Ok(KafkaConnection { bootstrap_servers })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_client_requires_started_broker() {
		let plugin = KafkaPlugin;
		let handle = plugin
			.create_container(&ContainerOptions::new().with("tag", "3.8.0"))
			.unwrap();
		let err = plugin.get_client(&handle).err().unwrap();
		assert!(matches!(
			err.downcast_ref::<AdapterError>(),
			Some(AdapterError::NotStarted(KIND))
		));
	}

	#[rstest]
	#[ignore = "Requires Docker"]
	fn test_kafka_bootstrap_servers() {
		let plugin = KafkaPlugin;
		let mut handle = plugin.create_container(&ContainerOptions::new()).unwrap();
		handle.start().unwrap();

		let connection = plugin.get_client(&handle).unwrap();
		let (_, port) = connection.bootstrap_servers.rsplit_once(':').unwrap();
		assert!(port.parse::<u16>().unwrap() > 0);

		handle.stop(StopOptions::default()).unwrap();
	}
}
