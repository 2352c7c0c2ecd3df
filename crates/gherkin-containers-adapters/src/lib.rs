//! Built-in resource adapters for gherkin-containers
//!
//! Every adapter sits behind a Cargo feature of the same name and registers
//! itself for link-time discovery, so enabling the feature is enough for
//! `PluginRegistry::global()` to find it. [`register_builtin`] registers the
//! compiled-in adapters explicitly on any registry.
//!
//! | Kind        | Feature     | Client                |
//! |-------------|-------------|-----------------------|
//! | `sqlite`    | `sqlite`    | [`SqlClient`]         |
//! | `postgres`  | `postgres`  | [`SqlClient`]         |
//! | `mariadb`   | `mariadb`   | [`SqlClient`]         |
//! | `kafka`     | `kafka`     | `KafkaConnection`     |
//! | `pulsar`    | `pulsar`    | `PulsarConnection`    |
//! | `iggy`      | `iggy`      | `IggyConnection`      |
//! | `eventhubs` | `eventhubs` | `EventHubsConnection` |
//! | `oracle`    | `oracle`    | `OracleConnection`    |
//! | `google_pubsub` | `google_pubsub` | `PubSubConnection` |
//!
//! [`SqlClient`] needs the `sqlx` feature; without it the database adapters
//! fail at `get_client` with `ContainerError::MissingDependency`.
//!
//! Container-backed adapters run on the `testcontainers` synchronous runner
//! and need a reachable Docker daemon.

pub mod error;
pub mod sql;

#[cfg(feature = "docker")]
pub mod docker;

#[cfg(feature = "eventhubs")]
pub mod eventhubs;
#[cfg(feature = "google_pubsub")]
pub mod google_pubsub;
#[cfg(feature = "iggy")]
pub mod iggy;
#[cfg(feature = "kafka")]
pub mod kafka;
#[cfg(feature = "mariadb")]
pub mod mariadb;
#[cfg(feature = "oracle")]
pub mod oracle;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "pulsar")]
pub mod pulsar;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{AdapterError, AdapterResult};
pub use sql::{SqlClient, SqlValue};

#[cfg(feature = "docker")]
pub use docker::DockerResource;

use gherkin_containers_core::{ContainerResult, PluginRegistry};

#[cfg(feature = "sqlite")]
gherkin_containers_core::submit_plugin!("sqlite", sqlite::SqlitePlugin);
#[cfg(feature = "postgres")]
gherkin_containers_core::submit_plugin!("postgres", postgres::PostgresPlugin);
#[cfg(feature = "mariadb")]
gherkin_containers_core::submit_plugin!("mariadb", mariadb::MariadbPlugin);
#[cfg(feature = "kafka")]
gherkin_containers_core::submit_plugin!("kafka", kafka::KafkaPlugin);
#[cfg(feature = "pulsar")]
gherkin_containers_core::submit_plugin!("pulsar", pulsar::PulsarPlugin);
#[cfg(feature = "iggy")]
gherkin_containers_core::submit_plugin!("iggy", iggy::IggyPlugin);
#[cfg(feature = "eventhubs")]
gherkin_containers_core::submit_plugin!("eventhubs", eventhubs::EventHubsPlugin);
#[cfg(feature = "oracle")]
gherkin_containers_core::submit_plugin!("oracle", oracle::OraclePlugin);
#[cfg(feature = "google_pubsub")]
gherkin_containers_core::submit_plugin!("google_pubsub", google_pubsub::PubSubPlugin);

/// Kinds compiled into this build, in registration order.
pub fn builtin_kinds() -> Vec<&'static str> {
	#[allow(unused_mut)]
	let mut kinds = Vec::new();
	#[cfg(feature = "sqlite")]
	kinds.push(sqlite::KIND);
	#[cfg(feature = "postgres")]
	kinds.push(postgres::KIND);
	#[cfg(feature = "mariadb")]
	kinds.push(mariadb::KIND);
	#[cfg(feature = "kafka")]
	kinds.push(kafka::KIND);
	#[cfg(feature = "pulsar")]
	kinds.push(pulsar::KIND);
	#[cfg(feature = "iggy")]
	kinds.push(iggy::KIND);
	#[cfg(feature = "eventhubs")]
	kinds.push(eventhubs::KIND);
	#[cfg(feature = "oracle")]
	kinds.push(oracle::KIND);
	#[cfg(feature = "google_pubsub")]
	kinds.push(google_pubsub::KIND);
	kinds
}

/// Register every compiled-in adapter on `registry`.
///
/// Useful for registries built without discovery. Existing registrations under
/// the same names are replaced.
pub fn register_builtin(registry: &PluginRegistry) -> ContainerResult<()> {
	#[cfg(feature = "sqlite")]
	registry.register::<sqlite::SqlitePlugin>(sqlite::KIND)?;
	#[cfg(feature = "postgres")]
	registry.register::<postgres::PostgresPlugin>(postgres::KIND)?;
	#[cfg(feature = "mariadb")]
	registry.register::<mariadb::MariadbPlugin>(mariadb::KIND)?;
	#[cfg(feature = "kafka")]
	registry.register::<kafka::KafkaPlugin>(kafka::KIND)?;
	#[cfg(feature = "pulsar")]
	registry.register::<pulsar::PulsarPlugin>(pulsar::KIND)?;
	#[cfg(feature = "iggy")]
	registry.register::<iggy::IggyPlugin>(iggy::KIND)?;
	#[cfg(feature = "eventhubs")]
	registry.register::<eventhubs::EventHubsPlugin>(eventhubs::KIND)?;
	#[cfg(feature = "oracle")]
	registry.register::<oracle::OraclePlugin>(oracle::KIND)?;
	#[cfg(feature = "google_pubsub")]
	registry.register::<google_pubsub::PubSubPlugin>(google_pubsub::KIND)?;

	tracing::debug!(kinds = ?builtin_kinds(), "built-in adapters registered");
	// unused when no adapter feature is enabled
	let _ = registry;
	Ok(())
}
