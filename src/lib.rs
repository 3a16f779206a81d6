//! # docserve
//!
//! Serves static assets from a document root over HTTP. Two in-memory cache
//! tiers avoid redundant disk reads, and entity tags derived from file
//! modification times avoid redundant transfers.
//!
//! This crate re-exports the workspace members:
//!
//! - [`cache`] - bounded, sharded byte cache used for both tiers
//! - [`http`] - request/response model and the [`Handler`](http::Handler) trait
//! - [`static_files`] - path resolution, version tags, freshness and the
//!   [`StaticFileHandler`] orchestrator
//! - [`server`] - Hyper HTTP/1.1 listener with graceful shutdown (feature `server`)
//! - [`conf`] - layered settings (feature `conf`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use docserve::cache::ByteCache;
//! use docserve::server::{HttpServer, ShutdownCoordinator};
//! use docserve::StaticFileHandler;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = StaticFileHandler::new(
//!     "./site",
//!     Arc::new(ByteCache::new(4 * 1024 * 1024)),
//!     Arc::new(ByteCache::new(256 * 1024 * 1024)),
//! );
//!
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! HttpServer::new(Arc::new(handler))
//!     .listen_with_shutdown("127.0.0.1:8080".parse()?, coordinator)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use docserve_cache as cache;
pub use docserve_http as http;
pub use docserve_static as static_files;

#[cfg(feature = "server")]
pub use docserve_server as server;

#[cfg(feature = "conf")]
pub use docserve_conf as conf;

pub use docserve_cache::ByteCache;
pub use docserve_http::{Handler, Request, Response};
pub use docserve_static::{Outcome, StaticError, StaticFileHandler, VersionTag};
