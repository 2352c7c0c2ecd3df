//! # gherkin-containers-scenario
//!
//! Binds the container lifecycle to behaviour-driven scenarios.
//!
//! ## Overview
//!
//! - [`ContainerWorld`] / [`ScenarioContext`]: where a scenario keeps its
//!   container manager
//! - [`ScenarioHooks`] and [`setup_hooks`]: attach a manager before each
//!   scenario, stop everything after it
//! - [`TeardownGuard`]: the same cleanup for plain rstest tests
//! - [`inject_client`]: what `#[use_container]` expands to

pub mod context;
pub mod hooks;
pub mod inject;
pub mod logging;
pub mod resource;

pub use context::{ContainerWorld, ScenarioContext};
pub use hooks::{
	Hook, Scenario, ScenarioError, ScenarioHooks, ScenarioReport, setup_hooks, setup_hooks_with,
};
pub use inject::inject_client;
pub use logging::init_test_logging;
pub use resource::{TeardownGuard, TestResource};
