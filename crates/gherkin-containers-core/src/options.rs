//! Creation options passed from a step to a plugin's `create_container`.

use crate::error::{ContainerError, ContainerResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Key/value bag of creation parameters.
///
/// Options are forwarded to the plugin untouched; each adapter decides which
/// keys it understands, usually by deserializing into its own config struct
/// with [`ContainerOptions::parse`].
///
/// # Examples
///
/// ```rust
/// use gherkin_containers_core::ContainerOptions;
///
/// let options = ContainerOptions::new()
/// 	.with("image", "postgres")
/// 	.with("tag", "15-alpine")
/// 	.with("headless", true);
///
/// assert_eq!(options.get_str("image"), Some("postgres"));
/// assert_eq!(options.get_bool("headless"), Some(true));
/// assert_eq!(options.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerOptions {
	values: Map<String, Value>,
}

impl ContainerOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.values.insert(key.into(), value.into())
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.values.get(key).and_then(Value::as_str)
	}

	pub fn get_bool(&self, key: &str) -> Option<bool> {
		self.values.get(key).and_then(Value::as_bool)
	}

	pub fn get_u64(&self, key: &str) -> Option<u64> {
		self.values.get(key).and_then(Value::as_u64)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	/// Deserialize the whole bag into an adapter's config type.
	///
	/// Missing keys fall back to the type's serde defaults. Any deserialize
	/// failure, including an unknown key on a `deny_unknown_fields` struct,
	/// is reported as [`ContainerError::InvalidOption`].
	///
	/// # Examples
	///
	/// ```rust
	/// use gherkin_containers_core::ContainerOptions;
	/// use serde::Deserialize;
	///
	/// #[derive(Deserialize)]
	/// #[serde(default, deny_unknown_fields)]
	/// struct BrokerConfig {
	/// 	image: String,
	/// 	partitions: u32,
	/// }
	///
	/// impl Default for BrokerConfig {
	/// 	fn default() -> Self {
	/// 		Self { image: "broker:latest".into(), partitions: 1 }
	/// 	}
	/// }
	///
	/// let config: BrokerConfig = ContainerOptions::new()
	/// 	.with("partitions", 4)
	/// 	.parse()
	/// 	.unwrap();
	/// assert_eq!(config.image, "broker:latest");
	/// assert_eq!(config.partitions, 4);
	///
	/// let err = ContainerOptions::new().with("colour", "red").parse::<BrokerConfig>();
	/// assert!(err.is_err());
	/// ```
	pub fn parse<T: DeserializeOwned>(&self) -> ContainerResult<T> {
		serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
			ContainerError::InvalidOption {
				key: self.offending_key(&e),
				reason: e.to_string(),
			}
		})
	}

	// serde_json reports unknown fields as "unknown field `name`, expected ...".
	fn offending_key(&self, error: &serde_json::Error) -> String {
		let message = error.to_string();
		message
			.split('`')
			.nth(1)
			.filter(|key| self.values.contains_key(*key))
			.unwrap_or("*")
			.to_string()
	}
}

impl From<Map<String, Value>> for ContainerOptions {
	fn from(values: Map<String, Value>) -> Self {
		Self { values }
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ContainerOptions {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let values = iter
			.into_iter()
			.map(|(key, value)| (key.into(), value.into()))
			.collect();
		Self { values }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;

	#[derive(Debug, Deserialize, PartialEq)]
	#[serde(deny_unknown_fields)]
	struct Strict {
		image: String,
	}

	#[rstest]
	fn test_unknown_key_is_named_in_error() {
		let options = ContainerOptions::new()
			.with("image", "x")
			.with("imgae", "typo");

		match options.parse::<Strict>() {
			Err(ContainerError::InvalidOption { key, .. }) => assert_eq!(key, "imgae"),
			other => panic!("expected InvalidOption, got {:?}", other),
		}
	}

	#[rstest]
	fn test_from_iter_collects_pairs() {
		let options: ContainerOptions = [("image", "custom:latest")].into_iter().collect();
		assert_eq!(
			options.parse::<Strict>().unwrap(),
			Strict {
				image: "custom:latest".to_string()
			}
		);
	}

	#[rstest]
	#[case(ContainerOptions::new(), true)]
	#[case(ContainerOptions::new().with("a", 1), false)]
	fn test_is_empty(#[case] options: ContainerOptions, #[case] expected: bool) {
		assert_eq!(options.is_empty(), expected);
	}
}
