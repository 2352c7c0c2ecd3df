//! # gherkin-containers
//!
//! On-demand backing services for behaviour-driven test scenarios.
//!
//! A step asks for a resource kind ("postgres", "kafka", ...). The scenario's
//! [`ContainerManager`] starts it on first use through the registered plugin,
//! hands every later step the same client, and stops everything when the
//! scenario ends, whether it passed, failed or panicked.
//!
//! ## Feature Flags
//!
//! - `sqlite` (default), `postgres`, `mariadb`, `kafka`, `pulsar`, `iggy`,
//!   `eventhubs`, `oracle`, `google_pubsub` - built-in adapters
//! - `sqlx` (default) - blocking [`SqlClient`](adapters::SqlClient) for the
//!   database adapters; without it their `get_client` fails with
//!   [`ContainerError::MissingDependency`]
//! - `testing` - call-recording fake plugin for tests
//! - `full` - everything above except `testing`
//!
//! ## Environment Variables
//!
//! - `GHERKIN_CONTAINERS_DISCOVERY` - link-time plugin discovery (default: true)
//! - `GHERKIN_CONTAINERS_STOP_FORCE` - skip the graceful stop (default: true)
//! - `GHERKIN_CONTAINERS_DELETE_VOLUMES` - remove volumes (default: true)
//! - `GHERKIN_CONTAINERS_STARTUP_TIMEOUT_SECS` - readiness bound (default: 120)
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use gherkin_containers::prelude::*;
//! use gherkin_containers::adapters::SqlClient;
//! use std::sync::Arc;
//!
//! #[use_container("postgres", tag = "16-alpine")]
//! fn a_user_exists(ctx: &mut ScenarioContext, postgres_client: Arc<SqlClient>) {
//!     postgres_client
//!         .execute("INSERT INTO users (name) VALUES (?)", &["alice".into()])
//!         .unwrap();
//! }
//!
//! let mut hooks = ScenarioHooks::new();
//! setup_hooks(&mut hooks);
//!
//! let mut ctx = ScenarioContext::new();
//! hooks
//!     .run(&mut ctx, &Scenario::new("signup"), |ctx| a_user_exists(ctx))
//!     .into_result()
//!     .unwrap();
//! ```

pub mod core;
pub mod scenario;

#[cfg(feature = "adapters")]
pub mod adapters;

pub use gherkin_containers_core::{
	BoxError, ContainerError, ContainerManager, ContainerOptions, ContainerPlugin,
	ContainerResult, ContainerSettings, LifecycleStage, PLUGIN_GROUP, PluginRegistry,
	ResourceHandle, StopOptions, submit_plugin,
};
pub use gherkin_containers_macros::use_container;

#[cfg(feature = "testing")]
pub use gherkin_containers_core::testing;

/// Everything a step module usually needs.
pub mod prelude {
	pub use crate::scenario::{
		ContainerWorld, Scenario, ScenarioContext, ScenarioHooks, TeardownGuard, inject_client,
		setup_hooks,
	};
	pub use crate::{
		ContainerError, ContainerManager, ContainerOptions, ContainerPlugin, PluginRegistry,
		ResourceHandle, use_container,
	};
}
