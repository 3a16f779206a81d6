//! Server settings and their layered loading

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{ConfigSource, EnvSource, SourceError, TomlFileSource, ValueSource};

/// Prefix of environment variables read by [`Settings::load`]
pub const ENV_PREFIX: &str = "DOCSERVE_";

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

/// Settings for one docserve process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	/// Directory files are served from
	pub document_root: PathBuf,
	/// Address the HTTP listener binds
	pub bind_address: SocketAddr,
	/// Byte budget of the tag tier
	#[serde(deserialize_with = "byte_size")]
	pub tag_cache_capacity: usize,
	/// Byte budget of the content tier
	#[serde(deserialize_with = "byte_size")]
	pub content_cache_capacity: usize,
	/// Buckets each cache tier is split into
	#[serde(deserialize_with = "count")]
	pub cache_buckets: usize,
	/// Seconds to wait for open connections on shutdown
	#[serde(deserialize_with = "count")]
	pub shutdown_timeout_secs: u64,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			document_root: PathBuf::from("../"),
			bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
			tag_cache_capacity: 4 * MIB,
			content_cache_capacity: 256 * MIB,
			cache_buckets: 16,
			shutdown_timeout_secs: 30,
		}
	}
}

/// Errors raised while loading or validating [`Settings`]
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("failed to load {source_name}: {error}")]
	Source {
		source_name: String,
		#[source]
		error: SourceError,
	},

	#[error("invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("invalid setting {field}: {reason}")]
	Invalid { field: &'static str, reason: String },
}

impl Settings {
	/// Start a builder seeded with the built-in defaults
	pub fn builder() -> SettingsBuilder {
		SettingsBuilder::new()
	}

	/// Defaults, then the optional TOML file, then `DOCSERVE_*` variables,
	/// then `overrides`
	pub fn load(config_file: Option<&Path>, overrides: ValueSource) -> Result<Self, SettingsError> {
		Self::layered(
			config_file,
			EnvSource::new().with_prefix(ENV_PREFIX),
			overrides,
		)
		.build()
	}

	fn layered(
		config_file: Option<&Path>,
		env: EnvSource,
		overrides: ValueSource,
	) -> SettingsBuilder {
		let mut builder = Self::builder();
		if let Some(path) = config_file {
			builder = builder.add_source(TomlFileSource::new(path));
		}
		builder.add_source(env).add_source(overrides)
	}

	pub fn shutdown_timeout(&self) -> Duration {
		Duration::from_secs(self.shutdown_timeout_secs)
	}

	/// Check the cross-field constraints serde cannot express
	///
	/// # Examples
	///
	/// ```
	/// use docserve_conf::Settings;
	///
	/// assert!(Settings::default().validate().is_ok());
	///
	/// let settings = Settings { cache_buckets: 0, ..Settings::default() };
	/// assert!(settings.validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.tag_cache_capacity == 0 {
			return Err(invalid("tag_cache_capacity", "must be greater than zero"));
		}
		if self.content_cache_capacity == 0 {
			return Err(invalid(
				"content_cache_capacity",
				"must be greater than zero",
			));
		}
		if self.cache_buckets == 0 {
			return Err(invalid("cache_buckets", "must be greater than zero"));
		}
		if self.content_cache_capacity < self.tag_cache_capacity {
			return Err(invalid(
				"content_cache_capacity",
				format!(
					"{} is smaller than tag_cache_capacity {}",
					self.content_cache_capacity, self.tag_cache_capacity
				),
			));
		}
		Ok(())
	}
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SettingsError {
	SettingsError::Invalid {
		field,
		reason: reason.into(),
	}
}

/// Merges [`ConfigSource`]s by priority and produces validated [`Settings`]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	fn new() -> Self {
		Self {
			sources: Vec::new(),
		}
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge every source over the defaults, deserialise and validate
	///
	/// # Examples
	///
	/// ```
	/// use docserve_conf::Settings;
	/// use docserve_conf::sources::ValueSource;
	///
	/// let settings = Settings::builder()
	///     .add_source(ValueSource::overrides().with_value("content_cache_capacity", "64MiB"))
	///     .build()
	///     .unwrap();
	/// assert_eq!(settings.content_cache_capacity, 64 * 1024 * 1024);
	/// ```
	pub fn build(mut self) -> Result<Settings, SettingsError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = match serde_json::to_value(Settings::default())? {
			Value::Object(map) => map,
			_ => Map::new(),
		};
		for source in &self.sources {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			tracing::debug!(
				source = %source.description(),
				keys = values.len(),
				"loaded configuration source"
			);
			merged.extend(values);
		}

		let settings: Settings = serde_json::from_value(Value::Object(merged))?;
		settings.validate()?;
		Ok(settings)
	}
}

impl Default for SettingsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Accept `Settings` fields as either numbers or strings
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
	Number(u64),
	String(String),
}

fn count<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: TryFrom<u64>,
{
	let value = match NumberOrString::deserialize(deserializer)? {
		NumberOrString::Number(n) => n,
		NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom)?,
	};
	T::try_from(value).map_err(|_| serde::de::Error::custom(format!("{value} is out of range")))
}

fn byte_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
	D: Deserializer<'de>,
{
	match NumberOrString::deserialize(deserializer)? {
		NumberOrString::Number(n) => {
			usize::try_from(n).map_err(|_| serde::de::Error::custom(format!("{n} is out of range")))
		}
		NumberOrString::String(s) => parse_byte_size(&s).map_err(serde::de::Error::custom),
	}
}

/// Parse a byte count with an optional binary unit suffix
///
/// Accepts plain numbers and the suffixes `K`/`KiB`, `M`/`MiB` and `G`/`GiB`
/// (case-insensitive).
///
/// # Examples
///
/// ```
/// use docserve_conf::settings::parse_byte_size;
///
/// assert_eq!(parse_byte_size("4096"), Ok(4096));
/// assert_eq!(parse_byte_size("4MiB"), Ok(4 * 1024 * 1024));
/// assert_eq!(parse_byte_size("1 g"), Ok(1024 * 1024 * 1024));
/// assert!(parse_byte_size("lots").is_err());
/// ```
pub fn parse_byte_size(input: &str) -> Result<usize, String> {
	let trimmed = input.trim();
	let split = trimmed
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(trimmed.len());
	let (digits, unit) = trimmed.split_at(split);

	let number: usize = digits
		.parse()
		.map_err(|_| format!("invalid byte size: {input:?}"))?;
	let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
		"" | "b" => 1,
		"k" | "kb" | "kib" => KIB,
		"m" | "mb" | "mib" => MIB,
		"g" | "gb" | "gib" => 1024 * MIB,
		other => return Err(format!("unknown size unit {other:?} in {input:?}")),
	};
	number
		.checked_mul(multiplier)
		.ok_or_else(|| format!("byte size overflows: {input:?}"))
}
