//! Layering of defaults, TOML file, environment and overrides

use docserve_conf::sources::{EnvSource, TomlFileSource, ValueSource};
use docserve_conf::{ENV_PREFIX, Settings, SettingsError};
use rstest::{fixture, rstest};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct ConfigFile {
	_dir: TempDir,
	path: PathBuf,
}

#[fixture]
fn config_file() -> ConfigFile {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("docserve.toml");
	fs::write(
		&path,
		r#"
document_root = "/from/toml"
bind_address = "127.0.0.1:9000"
content_cache_capacity = "512MiB"
cache_buckets = 8
"#,
	)
	.unwrap();
	ConfigFile { _dir: dir, path }
}

fn env(vars: &[(&str, &str)]) -> EnvSource {
	EnvSource::new().with_prefix(ENV_PREFIX).with_vars(
		vars.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect::<Vec<_>>(),
	)
}

#[rstest]
fn test_toml_overrides_defaults(config_file: ConfigFile) {
	let settings = Settings::builder()
		.add_source(TomlFileSource::new(&config_file.path))
		.build()
		.unwrap();

	assert_eq!(settings.document_root, PathBuf::from("/from/toml"));
	assert_eq!(settings.bind_address.port(), 9000);
	assert_eq!(settings.content_cache_capacity, 512 * 1024 * 1024);
	assert_eq!(settings.cache_buckets, 8);
	// Untouched keys keep their defaults
	assert_eq!(settings.tag_cache_capacity, 4 * 1024 * 1024);
}

#[rstest]
fn test_env_beats_toml_and_overrides_beat_env(config_file: ConfigFile) {
	// Added out of order on purpose; priority decides
	let settings = Settings::builder()
		.add_source(ValueSource::overrides().with_value("cache_buckets", 64))
		.add_source(env(&[
			("DOCSERVE_DOCUMENT_ROOT", "/from/env"),
			("DOCSERVE_CACHE_BUCKETS", "32"),
			("DOCSERVE_SHUTDOWN_TIMEOUT_SECS", "5"),
		]))
		.add_source(TomlFileSource::new(&config_file.path))
		.build()
		.unwrap();

	assert_eq!(settings.document_root, PathBuf::from("/from/env"));
	assert_eq!(settings.cache_buckets, 64);
	assert_eq!(settings.shutdown_timeout_secs, 5);
	assert_eq!(settings.bind_address.port(), 9000);
}

#[rstest]
fn test_missing_config_file_is_ignored() {
	let settings = Settings::builder()
		.add_source(TomlFileSource::new("/definitely/not/here.toml"))
		.build()
		.unwrap();
	assert_eq!(settings, Settings::default());
}

#[rstest]
fn test_malformed_env_value_is_rejected() {
	let result = Settings::builder()
		.add_source(env(&[("DOCSERVE_CACHE_BUCKETS", "many")]))
		.build();
	assert!(matches!(result, Err(SettingsError::Deserialize(_))));
}

#[rstest]
fn test_unknown_key_is_rejected() {
	let result = Settings::builder()
		.add_source(env(&[("DOCSERVE_CACHE_SIZE", "1")]))
		.build();
	assert!(matches!(result, Err(SettingsError::Deserialize(_))));
}

#[rstest]
fn test_build_validates() {
	let result = Settings::builder()
		.add_source(
			ValueSource::overrides()
				.with_value("tag_cache_capacity", "8MiB")
				.with_value("content_cache_capacity", "1MiB"),
		)
		.build();
	assert!(matches!(
		result,
		Err(SettingsError::Invalid {
			field: "content_cache_capacity",
			..
		})
	));
}

#[rstest]
fn test_broken_toml_names_the_source() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("broken.toml");
	fs::write(&path, "cache_buckets = [").unwrap();

	let error = Settings::builder()
		.add_source(TomlFileSource::new(&path))
		.build()
		.unwrap_err();

	assert!(matches!(error, SettingsError::Source { .. }));
	assert!(error.to_string().contains("broken.toml"));
}
