//! Test resource management with automatic setup and teardown
//!
//! ## Overview
//!
//! - `TestResource`: Per-test setup/teardown (BeforeEach/AfterEach pattern)
//! - `TeardownGuard`: RAII guard for automatic resource cleanup
//!
//! [`ScenarioContext`] is itself a `TestResource`, so an rstest fixture can
//! give every test its own context whose containers are stopped when the test
//! ends, pass or panic.
//!
//! ## Examples
//!
//! ```rust
//! use gherkin_containers_scenario::{ContainerWorld, ScenarioContext, TeardownGuard};
//! use rstest::*;
//!
//! #[fixture]
//! fn ctx() -> TeardownGuard<ScenarioContext> {
//!     TeardownGuard::new()
//! }
//!
//! #[rstest]
//! fn test_something(mut ctx: TeardownGuard<ScenarioContext>) {
//!     assert!(ctx.has_containers());
//!     // containers started through ctx are stopped when ctx goes out of scope
//! }
//! ```

use crate::context::{ContainerWorld, ScenarioContext};
use gherkin_containers_core::PluginRegistry;
use std::ops::{Deref, DerefMut};

/// Per-test resource with setup and teardown hooks
pub trait TestResource: Sized {
	/// Setup hook called before each test (BeforeEach)
	fn setup() -> Self;

	/// Teardown hook called after each test (AfterEach)
	///
	/// This is called automatically by `TeardownGuard::drop`,
	/// ensuring cleanup even if the test panics.
	fn teardown(&mut self);
}

/// RAII guard for automatic test resource cleanup
///
/// This guard ensures `teardown()` is called when the guard
/// goes out of scope, even if the test panics.
pub struct TeardownGuard<F: TestResource>(F);

impl<F: TestResource> TeardownGuard<F> {
	/// Create a new teardown guard with resource setup
	pub fn new() -> Self {
		Self(F::setup())
	}

	/// Guard an already built resource
	pub fn from_resource(resource: F) -> Self {
		Self(resource)
	}
}

impl<F: TestResource> Default for TeardownGuard<F> {
	fn default() -> Self {
		Self::new()
	}
}

impl<F: TestResource> Drop for TeardownGuard<F> {
	fn drop(&mut self) {
		self.0.teardown();
	}
}

impl<F: TestResource> Deref for TeardownGuard<F> {
	type Target = F;

	fn deref(&self) -> &F {
		&self.0
	}
}

impl<F: TestResource> DerefMut for TeardownGuard<F> {
	fn deref_mut(&mut self) -> &mut F {
		&mut self.0
	}
}

impl TestResource for ScenarioContext {
	fn setup() -> Self {
		ScenarioContext::with_registry(PluginRegistry::global())
	}

	fn teardown(&mut self) {
		let Some(mut manager) = self.containers_slot().take() else {
			return;
		};
		if let Err(e) = manager.stop_all() {
			tracing::error!(scenario = ?self.name(), error = %e, "scenario teardown failed");
		}
	}
}
