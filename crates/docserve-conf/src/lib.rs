//! # docserve-conf
//!
//! Layered configuration for the docserve server.
//!
//! Settings are merged from, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `DOCSERVE_*` environment variables
//! 4. command-line overrides
//!
//! ```
//! use docserve_conf::Settings;
//! use docserve_conf::sources::{EnvSource, ValueSource};
//!
//! let settings = Settings::builder()
//!     .add_source(EnvSource::new().with_prefix("DOCSERVE_").with_vars([
//!         ("DOCSERVE_CACHE_BUCKETS".to_string(), "32".to_string()),
//!     ]))
//!     .add_source(ValueSource::overrides().with_value("document_root", "/srv/www"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(settings.cache_buckets, 32);
//! assert_eq!(settings.document_root.to_str(), Some("/srv/www"));
//! ```

pub mod settings;
pub mod sources;

pub use settings::{ENV_PREFIX, Settings, SettingsBuilder, SettingsError};
pub use sources::{ConfigSource, EnvSource, SourceError, TomlFileSource, ValueSource};
