//! Configuration sources for layered settings
//!
//! Each source produces a flat map of setting names to JSON values. Sources
//! are merged in priority order (CLI overrides > environment variables >
//! config file > defaults) before the result is deserialised into
//! [`Settings`](crate::Settings).

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Environment variable configuration source.
///
/// Values are passed on as strings; numeric settings accept numeric strings.
pub struct EnvSource {
	prefix: Option<String>,
	vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
	/// Read from the process environment
	pub fn new() -> Self {
		Self {
			prefix: None,
			vars: None,
		}
	}

	/// Only consider variables starting with `prefix`, and strip it
	///
	/// # Examples
	///
	/// ```
	/// use docserve_conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new()
	///     .with_prefix("DOCSERVE_")
	///     .with_vars([("DOCSERVE_CACHE_BUCKETS".to_string(), "8".to_string())]);
	///
	/// let values = source.load().unwrap();
	/// assert_eq!(values["cache_buckets"], "8");
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Read from a fixed set of variables instead of the process environment
	pub fn with_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
		self.vars = Some(vars.into_iter().collect());
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let vars: Vec<(String, String)> = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut config = IndexMap::new();
		for (key, value) in vars {
			let clean_key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(rest) => rest,
					None => continue,
				},
				None => key.as_str(),
			};
			if clean_key.is_empty() {
				continue;
			}
			config.insert(clean_key.to_lowercase(), Value::String(value));
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	/// Create a new TOML file configuration source
	///
	/// # Examples
	///
	/// ```
	/// use docserve_conf::sources::{ConfigSource, TomlFileSource};
	///
	/// let source = TomlFileSource::new("does-not-exist.toml");
	/// assert!(source.load().unwrap().is_empty());
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Fixed key/value pairs given on the command line, outranking every other source
#[derive(Debug, Clone, Default)]
pub struct ValueSource {
	values: IndexMap<String, Value>,
}

impl ValueSource {
	/// Start an empty set of command-line overrides
	pub fn overrides() -> Self {
		Self::default()
	}

	/// Set a value
	///
	/// # Examples
	///
	/// ```
	/// use docserve_conf::sources::{ConfigSource, ValueSource};
	/// use serde_json::Value;
	///
	/// let source = ValueSource::overrides()
	///     .with_value("bind_address", Value::from("127.0.0.1:9000"));
	/// assert_eq!(source.load().unwrap().len(), 1);
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.values.insert(key.into(), value.into());
		self
	}

	/// Set a value only when one is given
	pub fn with_optional(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
		match value {
			Some(value) => self.with_value(key, value),
			None => self,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

impl ConfigSource for ValueSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		200
	}

	fn description(&self) -> String {
		"Command-line overrides".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[rstest]
	fn test_env_source_filters_and_strips_prefix() {
		let source = EnvSource::new().with_prefix("DOCSERVE_").with_vars([
			("DOCSERVE_DOCUMENT_ROOT".to_string(), "/srv/www".to_string()),
			("DOCSERVE_".to_string(), "ignored".to_string()),
			("HOME".to_string(), "/root".to_string()),
		]);

		let values = source.load().unwrap();
		assert_eq!(values.len(), 1);
		assert_eq!(values["document_root"], "/srv/www");
	}

	#[rstest]
	fn test_toml_source_reads_table() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "document_root = \"/var/www\"\ncache_buckets = 4").unwrap();

		let values = TomlFileSource::new(file.path()).load().unwrap();
		assert_eq!(values["document_root"], "/var/www");
		assert_eq!(values["cache_buckets"], 4);
	}

	#[rstest]
	fn test_toml_source_reports_syntax_errors() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "document_root = ").unwrap();

		let result = TomlFileSource::new(file.path()).load();
		assert!(matches!(result, Err(SourceError::Toml(_))));
	}

	#[rstest]
	fn test_value_source_optional() {
		let source = ValueSource::overrides()
			.with_optional("cache_buckets", Some(8))
			.with_optional("document_root", None::<String>);
		let values = source.load().unwrap();
		assert_eq!(values.len(), 1);
		assert!(source.priority() > EnvSource::new().priority());
	}
}
