//! Structured logging initialization.
//!
//! `-v` flags take precedence over `RUST_LOG`; with neither, `info` is used.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter directive for a `-v` count, or `None` when no flag was given
pub fn directive_for(verbosity: u8) -> Option<&'static str> {
	match verbosity {
		0 => None,
		1 => Some("debug"),
		_ => Some("trace"),
	}
}

/// Install the global subscriber
pub fn init(verbosity: u8) {
	let filter = match directive_for(verbosity) {
		Some(directive) => EnvFilter::new(directive),
		None if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
		None => EnvFilter::new("info"),
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(false))
		.init();
}
