//! PostgreSQL adapter on the `testcontainers-modules` image.
//!
//! # Options
//! - `image` / `tag`: image reference (default `postgres:16-alpine`)
//! - `user`, `password`, `database`: credentials baked into the container

use crate::docker::DockerResource;
use crate::error::{AdapterError, AdapterResult};
use crate::sql::SqlClient;
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ContainerSettings, ResourceHandle, StopOptions,
};
use serde::Deserialize;
use testcontainers::ImageExt;
use testcontainers_modules::postgres::Postgres;

pub const KIND: &str = "postgres";
pub const POSTGRES_PORT: u16 = 5432;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresOptions {
	pub image: String,
	pub tag: String,
	pub user: String,
	pub password: String,
	pub database: String,
}

impl Default for PostgresOptions {
	fn default() -> Self {
		Self {
			image: "postgres".to_string(),
			tag: "16-alpine".to_string(),
			user: "postgres".to_string(),
			password: "postgres".to_string(),
			database: "test".to_string(),
		}
	}
}

impl PostgresOptions {
	pub fn connection_url(&self, host: &str, port: u16) -> String {
		format!(
			"postgres://{}:{}@{}:{}/{}",
			self.user, self.password, host, port, self.database
		)
	}
}

#[derive(Debug)]
pub struct PostgresContainer {
	resource: DockerResource<Postgres>,
	options: PostgresOptions,
}

impl PostgresContainer {
	pub fn new(options: PostgresOptions, settings: &ContainerSettings) -> Self {
		let request = Postgres::default()
			.with_name(options.image.as_str())
			.with_tag(options.tag.as_str())
			.with_env_var("POSTGRES_USER", options.user.as_str())
			.with_env_var("POSTGRES_PASSWORD", options.password.as_str())
			.with_env_var("POSTGRES_DB", options.database.as_str())
			.with_startup_timeout(settings.startup_timeout);
		Self {
			resource: DockerResource::new(KIND, request),
			options,
		}
	}

	pub fn options(&self) -> &PostgresOptions {
		&self.options
	}

	pub fn port(&self) -> AdapterResult<u16> {
		self.resource.host_port(POSTGRES_PORT)
	}

	pub fn connection_url(&self) -> AdapterResult<String> {
		Ok(self
			.options
			.connection_url(&self.resource.host()?, self.port()?))
	}
}

impl ResourceHandle for PostgresContainer {
	fn start(&mut self) -> Result<(), BoxError> {
		self.resource.start()
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.resource.stop(options)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresPlugin;

impl ContainerPlugin for PostgresPlugin {
	type Handle = PostgresContainer;
	type Client = SqlClient;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<PostgresContainer, BoxError> {
		Ok(PostgresContainer::new(
			options.parse()?,
			&ContainerSettings::from_env(),
		))
	}

	fn get_client(&self, handle: &PostgresContainer) -> Result<SqlClient, BoxError> {
		let url = handle.connection_url().map_err(AdapterError::boxed)?;
		SqlClient::connect(KIND, &url)
	}
}
