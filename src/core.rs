//! Plugin contract, registry and lifecycle manager module.
//!
//! The most used items are also re-exported at the crate root.
//!
//! # Examples
//!
//! ```rust,no_run
//! use gherkin_containers::core::{ContainerManager, PluginRegistry};
//! use gherkin_containers::core::settings::STOP_FORCE_ENV;
//! ```

pub use gherkin_containers_core::*;
