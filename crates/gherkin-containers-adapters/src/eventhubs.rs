//! Azure Event Hubs emulator adapter.
//!
//! The emulator needs Azurite for blob and metadata storage and a JSON file
//! describing the namespace it should serve. Starting an [`EventHubsEmulator`]
//! therefore:
//!
//! 1. writes the generated config to a temporary file,
//! 2. starts Azurite on a private Docker network under a unique name,
//! 3. starts the emulator on the same network with the config mounted
//!    read-only.
//!
//! `stop` undoes this in reverse order and keeps going when a step fails.
//! The network is created by testcontainers for the first container that joins
//! it and removed once its last container is gone.
//!
//! # Options
//! - `image` / `tag`: emulator image
//! - `namespace`, `eventhub`, `partition_count`, `consumer_group`: the entity
//!   written to the emulator config
//! - `azurite_image` / `azurite_tag`: storage image

use crate::docker::DockerResource;
use crate::error::{AdapterError, AdapterResult};
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ContainerSettings, ResourceHandle, StopOptions,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use tempfile::TempPath;
use testcontainers::core::{AccessMode, IntoContainerPort, Mount, WaitFor};
use testcontainers::{GenericImage, ImageExt};

pub const KIND: &str = "eventhubs";
pub const AMQP_PORT: u16 = 5672;
pub const SHARED_ACCESS_KEY_NAME: &str = "RootManageSharedAccessKey";
pub const SHARED_ACCESS_KEY: &str = "SAS_KEY_VALUE";

const AZURITE_KIND: &str = "azurite";
const CONFIG_MOUNT: &str = "/Eventhubs_Emulator/ConfigFiles/Config.json";
const EMULATOR_READY: &str = "Emulator Service is Successfully Up!";
const AZURITE_READY: &str = "Azurite Blob service is successfully listening";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventHubsOptions {
	pub image: String,
	pub tag: String,
	pub namespace: String,
	pub eventhub: String,
	pub partition_count: u32,
	pub consumer_group: String,
	pub azurite_image: String,
	pub azurite_tag: String,
}

impl Default for EventHubsOptions {
	fn default() -> Self {
		Self {
			image: "mcr.microsoft.com/azure-messaging/eventhubs-emulator".to_string(),
			tag: "latest".to_string(),
			namespace: "emulatorNs1".to_string(),
			eventhub: "eh1".to_string(),
			partition_count: 2,
			consumer_group: "cg1".to_string(),
			azurite_image: "mcr.microsoft.com/azure-storage/azurite".to_string(),
			azurite_tag: "latest".to_string(),
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EmulatorConfig<'a> {
	user_config: UserConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UserConfig<'a> {
	namespace_config: Vec<NamespaceConfig<'a>>,
	logging_config: LoggingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct NamespaceConfig<'a> {
	#[serde(rename = "Type")]
	kind: &'static str,
	name: &'a str,
	entities: Vec<EntityConfig<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EntityConfig<'a> {
	name: &'a str,
	partition_count: u32,
	consumer_groups: Vec<NameConfig<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct NameConfig<'a> {
	name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoggingConfig {
	#[serde(rename = "Type")]
	kind: &'static str,
}

impl EventHubsOptions {
	/// Emulator `Config.json` serving one event hub.
	pub fn emulator_config(&self) -> serde_json::Result<serde_json::Value> {
		let config = EmulatorConfig {
			user_config: UserConfig {
				namespace_config: vec![NamespaceConfig {
					kind: "EventHub",
					name: &self.namespace,
					entities: vec![EntityConfig {
						name: &self.eventhub,
						partition_count: self.partition_count,
						consumer_groups: vec![NameConfig {
							name: &self.consumer_group,
						}],
					}],
				}],
				logging_config: LoggingConfig { kind: "File" },
			},
		};
		serde_json::to_value(config)
	}
}

/// Connection string for the emulator's AMQP endpoint.
pub fn connection_string(host: &str, port: u16, eventhub: &str) -> String {
	format!(
		"Endpoint=sb://{}:{};SharedAccessKeyName={};SharedAccessKey={};EntityPath={};UseDevelopmentEmulator=true;",
		host, port, SHARED_ACCESS_KEY_NAME, SHARED_ACCESS_KEY, eventhub
	)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHubsConnection {
	pub connection_string: String,
	pub namespace: String,
	pub eventhub: String,
	pub consumer_group: String,
}

/// Emulator plus its Azurite storage, network and config file.
#[derive(Debug)]
pub struct EventHubsEmulator {
	options: EventHubsOptions,
	startup_timeout: Duration,
	network: String,
	azurite_name: String,
	config: Option<TempPath>,
	azurite: Option<DockerResource<GenericImage>>,
	emulator: Option<DockerResource<GenericImage>>,
}

impl EventHubsEmulator {
	pub fn new(options: EventHubsOptions, settings: &ContainerSettings) -> Self {
		let suffix = uuid::Uuid::new_v4().simple().to_string();
		Self {
			options,
			startup_timeout: settings.startup_timeout,
			network: format!("gherkin-eventhubs-{}", suffix),
			azurite_name: format!("azurite-{}", suffix),
			config: None,
			azurite: None,
			emulator: None,
		}
	}

	pub fn options(&self) -> &EventHubsOptions {
		&self.options
	}

	/// Private network shared by the emulator and Azurite.
	pub fn network(&self) -> &str {
		&self.network
	}

	/// Name Azurite is reachable under on [`EventHubsEmulator::network`].
	pub fn azurite_name(&self) -> &str {
		&self.azurite_name
	}

	pub fn connection_string(&self) -> AdapterResult<String> {
		let emulator = self.emulator.as_ref().ok_or(AdapterError::NotStarted(KIND))?;
		Ok(connection_string(
			&emulator.host()?,
			emulator.host_port(AMQP_PORT)?,
			&self.options.eventhub,
		))
	}

	fn write_config(&self) -> AdapterResult<TempPath> {
		let mut file = tempfile::Builder::new()
			.prefix("eventhubs-")
			.suffix(".json")
			.tempfile()?;
		serde_json::to_writer_pretty(file.as_file_mut(), &self.options.emulator_config()?)?;
		file.as_file_mut().flush()?;
		Ok(file.into_temp_path())
	}

	fn azurite_resource(&self) -> DockerResource<GenericImage> {
		let request = GenericImage::new(
			self.options.azurite_image.as_str(),
			self.options.azurite_tag.as_str(),
		)
		.with_wait_for(WaitFor::message_on_stdout(AZURITE_READY))
		.with_network(self.network.as_str())
		.with_container_name(self.azurite_name.as_str())
		.with_startup_timeout(self.startup_timeout);
		DockerResource::new(AZURITE_KIND, request)
	}

	fn emulator_resource(&self, config: &TempPath) -> DockerResource<GenericImage> {
		let mount = Mount::bind_mount(config.to_string_lossy(), CONFIG_MOUNT)
			.with_access_mode(AccessMode::ReadOnly);
		let request = GenericImage::new(self.options.image.as_str(), self.options.tag.as_str())
			.with_exposed_port(AMQP_PORT.tcp())
			.with_wait_for(WaitFor::message_on_stdout(EMULATOR_READY))
			.with_env_var("ACCEPT_EULA", "Y")
			.with_env_var("BLOB_SERVER", self.azurite_name.as_str())
			.with_env_var("METADATA_SERVER", self.azurite_name.as_str())
			.with_network(self.network.as_str())
			.with_mount(mount)
			.with_startup_timeout(self.startup_timeout);
		DockerResource::new(KIND, request)
	}

	fn start_all(&mut self) -> AdapterResult<()> {
		if self.config.is_some() {
			return Err(AdapterError::AlreadyStarted(KIND));
		}

		let config = self.write_config()?;
		let mut azurite = self.azurite_resource();
		// on failure `config` is dropped, which deletes the file
		azurite.start_container()?;
		let mut emulator = self.emulator_resource(&config);
		self.config = Some(config);
		self.azurite = Some(azurite);

		if let Err(e) = emulator.start_container() {
			if let Err(cleanup) = self.stop_all(StopOptions::default()) {
				tracing::warn!(error = %cleanup, "cleanup after failed emulator start failed");
			}
			return Err(e);
		}
		self.emulator = Some(emulator);
		tracing::info!(network = %self.network, "event hubs emulator ready");
		Ok(())
	}

	fn stop_all(&mut self, options: StopOptions) -> AdapterResult<()> {
		let mut failures = Vec::new();

		if let Some(mut emulator) = self.emulator.take()
			&& let Err(e) = emulator.stop_container(options)
		{
			failures.push(format!("emulator: {}", e));
		}
		if let Some(mut azurite) = self.azurite.take()
			&& let Err(e) = azurite.stop_container(options)
		{
			failures.push(format!("azurite: {}", e));
		}
		if let Some(config) = self.config.take()
			&& let Err(e) = config.close()
		{
			failures.push(format!("config file: {}", e));
		}

		if failures.is_empty() {
			Ok(())
		} else {
			Err(AdapterError::Cleanup {
				kind: KIND,
				failures,
			})
		}
	}
}

impl ResourceHandle for EventHubsEmulator {
	fn start(&mut self) -> Result<(), BoxError> {
		self.start_all().map_err(AdapterError::boxed)
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.stop_all(options).map_err(AdapterError::boxed)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EventHubsPlugin;

impl ContainerPlugin for EventHubsPlugin {
	type Handle = EventHubsEmulator;
	type Client = EventHubsConnection;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<EventHubsEmulator, BoxError> {
		Ok(EventHubsEmulator::new(
			options.parse()?,
			&ContainerSettings::from_env(),
		))
	}

	fn get_client(&self, handle: &EventHubsEmulator) -> Result<EventHubsConnection, BoxError> {
		let options = handle.options();
		Ok(EventHubsConnection {
			connection_string: handle.connection_string().map_err(AdapterError::boxed)?,
			namespace: options.namespace.clone(),
			eventhub: options.eventhub.clone(),
			consumer_group: options.consumer_group.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_default_emulator_config() {
		assert_eq!(
			EventHubsOptions::default().emulator_config().unwrap(),
			json!({
				"UserConfig": {
					"NamespaceConfig": [{
						"Type": "EventHub",
						"Name": "emulatorNs1",
						"Entities": [{
							"Name": "eh1",
							"PartitionCount": 2,
							"ConsumerGroups": [{ "Name": "cg1" }]
						}]
					}],
					"LoggingConfig": { "Type": "File" }
				}
			})
		);
	}

	#[rstest]
	fn test_connection_string_grammar() {
		assert_eq!(
			connection_string("localhost", 5672, "orders"),
			"Endpoint=sb://localhost:5672;SharedAccessKeyName=RootManageSharedAccessKey;SharedAccessKey=SAS_KEY_VALUE;EntityPath=orders;UseDevelopmentEmulator=true;"
		);
	}

	#[rstest]
	fn test_each_emulator_gets_its_own_network() {
		let settings = ContainerSettings::default();
		let first = EventHubsEmulator::new(EventHubsOptions::default(), &settings);
		let second = EventHubsEmulator::new(EventHubsOptions::default(), &settings);

		assert_ne!(first.network(), second.network());
		assert!(first.azurite_name().starts_with("azurite-"));
		assert!(matches!(
			first.connection_string(),
			Err(AdapterError::NotStarted(KIND))
		));
	}

	#[rstest]
	fn test_config_file_is_written_and_removed() {
		let mut emulator = EventHubsEmulator::new(
			EventHubsOptions {
				eventhub: "payments".to_string(),
				..EventHubsOptions::default()
			},
			&ContainerSettings::default(),
		);
		let config = emulator.write_config().unwrap();
		let written: serde_json::Value =
			serde_json::from_str(&std::fs::read_to_string(&config).unwrap()).unwrap();
		assert_eq!(
			written["UserConfig"]["NamespaceConfig"][0]["Entities"][0]["Name"],
			"payments"
		);

		let path = config.to_path_buf();
		emulator.config = Some(config);
		emulator.stop_all(StopOptions::default()).unwrap();
		assert!(!path.exists());
	}

	#[rstest]
	#[ignore = "Requires Docker"]
	fn test_emulator_with_azurite() {
		let plugin = EventHubsPlugin;
		let mut handle = plugin.create_container(&ContainerOptions::new()).unwrap();
		handle.start().unwrap();

		let connection = plugin.get_client(&handle).unwrap();
		assert!(connection.connection_string.starts_with("Endpoint=sb://"));
		assert!(connection.connection_string.ends_with("EntityPath=eh1;UseDevelopmentEmulator=true;"));

		handle.stop(StopOptions::default()).unwrap();
	}
}
