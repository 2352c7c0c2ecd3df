//! Scenario binding module.
//!
//! Hooks, the scenario context and client injection. `#[use_container]`
//! expands to calls into this module.
//!
//! # Examples
//!
//! ```rust,no_run
//! use gherkin_containers::scenario::{ScenarioContext, ScenarioHooks, setup_hooks};
//! ```

pub use gherkin_containers_scenario::*;
