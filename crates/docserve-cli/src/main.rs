//! docserve
//!
//! Serves a directory of static files over HTTP with mtime-based ETags and
//! an in-memory cache.
//!
//! ## Usage
//!
//! ```bash
//! docserve ./site
//! docserve --config docserve.toml -v
//! DOCSERVE_BIND_ADDRESS=127.0.0.1:3000 docserve ./site
//! ```

mod app;
mod logging;

use clap::Parser;
use docserve_conf::sources::ValueSource;
use docserve_conf::{Settings, SettingsError};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docserve")]
#[command(about = "Static file server with conditional requests and in-memory caching", long_about = None)]
#[command(version)]
struct Cli {
	/// Directory to serve (defaults to the parent directory)
	#[arg(value_name = "DOCUMENT_ROOT")]
	document_root: Option<PathBuf>,

	/// TOML configuration file
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Address to listen on
	#[arg(short, long, value_name = "ADDR")]
	bind: Option<SocketAddr>,

	/// Tag tier capacity, e.g. 4MiB
	#[arg(long, value_name = "SIZE")]
	tag_cache: Option<String>,

	/// Content tier capacity, e.g. 256MiB
	#[arg(long, value_name = "SIZE")]
	content_cache: Option<String>,

	/// Buckets per cache tier
	#[arg(long, value_name = "N")]
	buckets: Option<u64>,

	/// Seconds to wait for open connections on shutdown
	#[arg(long, value_name = "SECS")]
	shutdown_timeout: Option<u64>,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,
}

impl Cli {
	fn overrides(&self) -> ValueSource {
		ValueSource::overrides()
			.with_optional(
				"document_root",
				self.document_root
					.as_ref()
					.map(|path| path.to_string_lossy().into_owned()),
			)
			.with_optional("bind_address", self.bind.map(|addr| addr.to_string()))
			.with_optional("tag_cache_capacity", self.tag_cache.clone())
			.with_optional("content_cache_capacity", self.content_cache.clone())
			.with_optional("cache_buckets", self.buckets)
			.with_optional("shutdown_timeout_secs", self.shutdown_timeout)
	}

	fn settings(&self) -> Result<Settings, SettingsError> {
		Settings::load(self.config.as_deref(), self.overrides())
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::init(cli.verbosity);

	let settings = cli.settings()?;
	tracing::debug!(?settings, "settings loaded");

	app::run(settings).await
}
