//! Blocking SQL client handed to steps by the database adapters.
//!
//! Scenario steps are synchronous, so [`SqlClient`] owns a current-thread
//! tokio runtime and drives an `sqlx` [`AnyPool`](sqlx::AnyPool) on it. The
//! client is only available with the `sqlx` feature; without it
//! [`SqlClient::connect`] fails with `ContainerError::MissingDependency`, which
//! surfaces as a `get_client` startup failure.
//!
//! A client must not be used or dropped from inside an async runtime.

use gherkin_containers_core::BoxError;
#[cfg(not(feature = "sqlx"))]
use gherkin_containers_core::ContainerError;
use std::fmt;

#[cfg(feature = "sqlx")]
use crate::error::AdapterResult;
#[cfg(feature = "sqlx")]
use sqlx::{Any, AnyPool, Row, any::AnyArguments, query::Query};

/// Bind parameter for [`SqlClient`] queries.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
}

impl From<bool> for SqlValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i32> for SqlValue {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}

impl From<i64> for SqlValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<f64> for SqlValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for SqlValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for SqlValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Connection pool to a scenario database.
pub struct SqlClient {
	url: String,
	#[cfg(feature = "sqlx")]
	runtime: tokio::runtime::Runtime,
	#[cfg(feature = "sqlx")]
	pool: AnyPool,
}

impl SqlClient {
	/// Open a pool for `url` on behalf of resource `kind`.
	#[cfg(feature = "sqlx")]
	pub fn connect(kind: &str, url: &str) -> Result<Self, BoxError> {
		use sqlx::any::AnyPoolOptions;

		sqlx::any::install_default_drivers();
		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.build()?;
		let pool = runtime.block_on(
			AnyPoolOptions::new()
				.max_connections(1)
				.acquire_timeout(std::time::Duration::from_secs(60))
				.connect(url),
		)?;
		tracing::debug!(kind, "sql pool connected");

		Ok(Self {
			url: url.to_string(),
			runtime,
			pool,
		})
	}

	#[cfg(not(feature = "sqlx"))]
	pub fn connect(kind: &str, url: &str) -> Result<Self, BoxError> {
		let _ = url;
		Err(Box::new(ContainerError::MissingDependency {
			kind: kind.to_string(),
			dependency: "sqlx".to_string(),
			feature: "sqlx".to_string(),
		}))
	}

	/// Connection URL the pool was opened with.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Run a statement and return the number of affected rows.
	#[cfg(feature = "sqlx")]
	pub fn execute(&self, sql: &str, params: &[SqlValue]) -> AdapterResult<u64> {
		let result = self
			.runtime
			.block_on(bind_params(sql, params).execute(&self.pool))?;
		Ok(result.rows_affected())
	}

	/// First column of the first row, if any row matches.
	///
	/// The column must be text; a SQL `NULL` reads as `None`.
	#[cfg(feature = "sqlx")]
	pub fn fetch_optional_string(
		&self,
		sql: &str,
		params: &[SqlValue],
	) -> AdapterResult<Option<String>> {
		let row = self
			.runtime
			.block_on(bind_params(sql, params).fetch_optional(&self.pool))?;
		match row {
			Some(row) => Ok(row.try_get::<Option<String>, _>(0)?),
			None => Ok(None),
		}
	}

	/// First column of every row. `NULL`s are skipped.
	#[cfg(feature = "sqlx")]
	pub fn fetch_all_strings(&self, sql: &str, params: &[SqlValue]) -> AdapterResult<Vec<String>> {
		let rows = self
			.runtime
			.block_on(bind_params(sql, params).fetch_all(&self.pool))?;
		let mut values = Vec::with_capacity(rows.len());
		for row in rows {
			if let Some(value) = row.try_get::<Option<String>, _>(0)? {
				values.push(value);
			}
		}
		Ok(values)
	}
}

#[cfg(feature = "sqlx")]
fn bind_params<'q>(sql: &'q str, params: &[SqlValue]) -> Query<'q, Any, AnyArguments<'q>> {
	params
		.iter()
		.fold(sqlx::query::<Any>(sql), |query, param| match param.clone() {
			SqlValue::Null => query.bind(None::<String>),
			SqlValue::Bool(value) => query.bind(value),
			SqlValue::Int(value) => query.bind(value),
			SqlValue::Float(value) => query.bind(value),
			SqlValue::Text(value) => query.bind(value),
		})
}

#[cfg(feature = "sqlx")]
impl Drop for SqlClient {
	fn drop(&mut self) {
		self.runtime.block_on(self.pool.close());
	}
}

impl fmt::Debug for SqlClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SqlClient").field("url", &self.url).finish()
	}
}
