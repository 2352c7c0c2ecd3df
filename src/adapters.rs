//! Built-in resource adapters module.
//!
//! Each kind is a Cargo feature of this crate (`sqlite`, `postgres`,
//! `mariadb`, `kafka`, `pulsar`, `iggy`, `eventhubs`); `sqlx` adds the
//! blocking SQL client used by the database kinds.
//!
//! # Examples
//!
//! ```rust,no_run
//! use gherkin_containers::adapters::{SqlClient, register_builtin};
//! ```

pub use gherkin_containers_adapters::*;
