//! Oracle Database Free adapter.
//!
//! There is no Oracle driver in the stack, so the client is the connection
//! data a test hands to its own driver.
//!
//! # Options
//! - `image` / `tag`: image reference (default `gvenzl/oracle-free:slim-faststart`)
//! - `user`, `password`: application user created in `FREEPDB1`

use crate::docker::DockerResource;
use crate::error::{AdapterError, AdapterResult};
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ContainerSettings, ResourceHandle, StopOptions,
};
use serde::Deserialize;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::{GenericImage, ImageExt};

pub const KIND: &str = "oracle";
pub const ORACLE_PORT: u16 = 1521;
pub const SERVICE_NAME: &str = "FREEPDB1";

const READY_MESSAGE: &str = "DATABASE IS READY TO USE!";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleOptions {
	pub image: String,
	pub tag: String,
	pub user: String,
	pub password: String,
}

impl Default for OracleOptions {
	fn default() -> Self {
		Self {
			image: "gvenzl/oracle-free".to_string(),
			tag: "slim-faststart".to_string(),
			user: "test".to_string(),
			password: "test".to_string(),
		}
	}
}

/// Credentials and easy-connect DSN of the application user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConnection {
	pub user: String,
	pub password: String,
	/// `host:port/FREEPDB1`
	pub dsn: String,
}

impl OracleConnection {
	pub fn new(options: &OracleOptions, host: &str, port: u16) -> Self {
		Self {
			user: options.user.clone(),
			password: options.password.clone(),
			dsn: format!("{}:{}/{}", host, port, SERVICE_NAME),
		}
	}
}

#[derive(Debug)]
pub struct OracleContainer {
	resource: DockerResource<GenericImage>,
	options: OracleOptions,
}

impl OracleContainer {
	pub fn new(options: OracleOptions, settings: &ContainerSettings) -> Self {
		let request = GenericImage::new(options.image.as_str(), options.tag.as_str())
			.with_exposed_port(ORACLE_PORT.tcp())
			.with_wait_for(WaitFor::message_on_stdout(READY_MESSAGE))
			.with_env_var("ORACLE_PASSWORD", options.password.as_str())
			.with_env_var("APP_USER", options.user.as_str())
			.with_env_var("APP_USER_PASSWORD", options.password.as_str())
			.with_startup_timeout(settings.startup_timeout);
		Self {
			resource: DockerResource::new(KIND, request),
			options,
		}
	}

	pub fn connection(&self) -> AdapterResult<OracleConnection> {
		Ok(OracleConnection::new(
			&self.options,
			&self.resource.host()?,
			self.resource.host_port(ORACLE_PORT)?,
		))
	}
}

impl ResourceHandle for OracleContainer {
	fn start(&mut self) -> Result<(), BoxError> {
		self.resource.start()
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.resource.stop(options)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OraclePlugin;

impl ContainerPlugin for OraclePlugin {
	type Handle = OracleContainer;
	type Client = OracleConnection;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<OracleContainer, BoxError> {
		Ok(OracleContainer::new(
			options.parse()?,
			&ContainerSettings::from_env(),
		))
	}

	fn get_client(&self, handle: &OracleContainer) -> Result<OracleConnection, BoxError> {
		handle.connection().map_err(AdapterError::boxed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_connection_uses_easy_connect_dsn() {
		let options = OracleOptions {
			user: "shop".to_string(),
			..Default::default()
		};
		let connection = OracleConnection::new(&options, "localhost", 32770);
		assert_eq!(connection.user, "shop");
		assert_eq!(connection.password, "test");
		assert_eq!(connection.dsn, "localhost:32770/FREEPDB1");
	}

	#[rstest]
	fn test_unknown_option_is_rejected() {
		let options = ContainerOptions::new().with("dbname", "XE");
		assert!(OraclePlugin.create_container(&options).is_err());
	}

	#[rstest]
	#[ignore = "Requires Docker"]
	fn test_oracle_starts() {
		let plugin = OraclePlugin;
		let mut handle = plugin.create_container(&ContainerOptions::new()).unwrap();
		handle.start().unwrap();

		let connection = plugin.get_client(&handle).unwrap();
		assert!(connection.dsn.ends_with("/FREEPDB1"));

		handle.stop(StopOptions::default()).unwrap();
	}
}
