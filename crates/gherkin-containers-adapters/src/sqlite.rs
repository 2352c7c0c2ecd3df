//! SQLite adapter: a database file that lives for one scenario.
//!
//! No container is involved. `start` creates a temporary `.db` file unless a
//! `db_path` option names one, and `stop` deletes the file either way.
//!
//! # Options
//! - `db_path`: database file to use instead of a fresh temporary file

use crate::error::{AdapterError, AdapterResult};
use crate::sql::SqlClient;
use gherkin_containers_core::{
	BoxError, ContainerOptions, ContainerPlugin, ResourceHandle, StopOptions,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

pub const KIND: &str = "sqlite";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteOptions {
	pub db_path: Option<PathBuf>,
}

/// Database file handle.
#[derive(Debug)]
pub struct SqliteDatabase {
	path: Option<PathBuf>,
	temp: Option<TempPath>,
	started: bool,
}

impl SqliteDatabase {
	pub fn new(options: SqliteOptions) -> Self {
		Self {
			path: options.db_path,
			temp: None,
			started: false,
		}
	}

	/// Database file, once known.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// `sqlite://` URL that creates the file on first connect.
	pub fn url(&self) -> AdapterResult<String> {
		match (&self.path, self.started) {
			(Some(path), true) => Ok(format!("sqlite://{}?mode=rwc", path.display())),
			_ => Err(AdapterError::NotStarted(KIND)),
		}
	}

	fn create_file(&mut self) -> AdapterResult<()> {
		if self.started {
			return Err(AdapterError::AlreadyStarted(KIND));
		}
		if self.path.is_none() {
			let temp = tempfile::Builder::new()
				.prefix("gherkin-")
				.suffix(".db")
				.tempfile()?
				.into_temp_path();
			self.path = Some(temp.to_path_buf());
			self.temp = Some(temp);
		}
		self.started = true;
		tracing::info!(path = ?self.path, "sqlite database ready");
		Ok(())
	}

	fn remove_file(&mut self) -> AdapterResult<()> {
		if !self.started {
			return Ok(());
		}
		self.started = false;
		if let Some(temp) = self.temp.take() {
			temp.close()?;
		} else if let Some(path) = &self.path {
			match std::fs::remove_file(path) {
				Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
				_ => {}
			}
		}
		tracing::info!(path = ?self.path, "sqlite database removed");
		Ok(())
	}
}

impl ResourceHandle for SqliteDatabase {
	fn start(&mut self) -> Result<(), BoxError> {
		self.create_file().map_err(AdapterError::boxed)
	}

	fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> {
		self.remove_file().map_err(AdapterError::boxed)
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlitePlugin;

impl ContainerPlugin for SqlitePlugin {
	type Handle = SqliteDatabase;
	type Client = SqlClient;

	fn name(&self) -> &str {
		KIND
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<SqliteDatabase, BoxError> {
		Ok(SqliteDatabase::new(options.parse()?))
	}

	fn get_client(&self, handle: &SqliteDatabase) -> Result<SqlClient, BoxError> {
		let url = handle.url().map_err(AdapterError::boxed)?;
		SqlClient::connect(KIND, &url)
	}
}
