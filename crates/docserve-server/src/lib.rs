//! HTTP/1.1 transport for docserve, based on Hyper.
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use docserve_server::{HttpServer, ShutdownCoordinator, shutdown_signal};
//! use std::time::Duration;
//!
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! let server = HttpServer::new(handler);
//!
//! tokio::select! {
//!     result = server.listen_with_shutdown(addr, coordinator.clone()) => result?,
//!     _ = shutdown_signal() => {
//!         coordinator.shutdown();
//!         coordinator.wait_for_shutdown().await;
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod shutdown;

pub use error::{Result, ServerError};
pub use http::HttpServer;
pub use shutdown::{ConnectionGuard, ShutdownCoordinator, shutdown_signal};
