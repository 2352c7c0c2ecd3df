//! Iggy message streaming adapter.
//!
//! # Options
//! - `image` / `tag`: image reference (default `iggyrs/iggy:latest`)

use crate::docker::DockerResource;
use crate::error::{AdapterError, AdapterResult};
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ContainerSettings, ResourceHandle, StopOptions,
};
use serde::Deserialize;
use testcontainers::core::IntoContainerPort;
use testcontainers::{GenericImage, ImageExt};

pub const KIND: &str = "iggy";
pub const HTTP_PORT: u16 = 8080;
pub const TCP_PORT: u16 = 8090;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IggyOptions {
	pub image: String,
	pub tag: String,
}

impl Default for IggyOptions {
	fn default() -> Self {
		Self {
			image: "iggyrs/iggy".to_string(),
			tag: "latest".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IggyConnection {
	pub host: String,
	pub tcp_port: u16,
	pub http_port: u16,
}

impl IggyConnection {
	/// `host:port` of the binary TCP transport.
	pub fn tcp_address(&self) -> String {
		format!("{}:{}", self.host, self.tcp_port)
	}

	pub fn http_url(&self) -> String {
		format!("http://{}:{}", self.host, self.http_port)
	}
}

#[derive(Debug)]
pub struct IggyContainer {
	resource: DockerResource<GenericImage>,
}

impl IggyContainer {
	pub fn new(options: IggyOptions, settings: &ContainerSettings) -> Self {
		let request = GenericImage::new(options.image, options.tag)
			.with_exposed_port(HTTP_PORT.tcp())
			.with_exposed_port(TCP_PORT.tcp())
			.with_startup_timeout(settings.startup_timeout);
		Self {
			resource: DockerResource::new(KIND, request),
		}
	}

	pub fn connection(&self) -> AdapterResult<IggyConnection> {
		Ok(IggyConnection {
			host: self.resource.host()?,
			tcp_port: self.resource.host_port(TCP_PORT)?,
			http_port: self.resource.host_port(HTTP_PORT)?,
		})
	}
}

impl ResourceHandle for IggyContainer {
	fn start(&mut self) -> Result<(), BoxError> {
		self.resource.start()
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.resource.stop(options)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IggyPlugin;

impl ContainerPlugin for IggyPlugin {
	type Handle = IggyContainer;
	type Client = IggyConnection;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<IggyContainer, BoxError> {
		Ok(IggyContainer::new(
			options.parse()?,
			&ContainerSettings::from_env(),
		))
	}

	fn get_client(&self, handle: &IggyContainer) -> Result<IggyConnection, BoxError> {
		handle.connection().map_err(AdapterError::boxed)
	}
}
