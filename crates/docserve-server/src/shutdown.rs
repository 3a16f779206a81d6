//! Graceful shutdown coordination
//!
//! A [`ShutdownCoordinator`] is cloned into the accept loop and every
//! connection task. Calling [`ShutdownCoordinator::shutdown`] broadcasts to
//! all of them: the accept loop stops taking new connections and open
//! connections finish their in-flight request before closing.
//! [`ShutdownCoordinator::wait_for_shutdown`] then waits, up to the configured
//! timeout, for the remaining connections to drain.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, broadcast};

#[derive(Debug)]
struct Inner {
	signal: broadcast::Sender<()>,
	timeout: Duration,
	shutting_down: AtomicBool,
	accepting: AtomicBool,
	active: AtomicUsize,
	idle: Notify,
}

/// Shared shutdown state for one server
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
	inner: Arc<Inner>,
}

impl ShutdownCoordinator {
	/// Create a coordinator that waits at most `timeout` for connections to
	/// drain
	///
	/// # Examples
	///
	/// ```
	/// use docserve_server::ShutdownCoordinator;
	/// use std::time::Duration;
	///
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
	/// assert!(!coordinator.is_shutting_down());
	/// assert_eq!(coordinator.timeout(), Duration::from_secs(30));
	/// ```
	pub fn new(timeout: Duration) -> Self {
		let (signal, _) = broadcast::channel(1);
		Self {
			inner: Arc::new(Inner {
				signal,
				timeout,
				shutting_down: AtomicBool::new(false),
				accepting: AtomicBool::new(true),
				active: AtomicUsize::new(0),
				idle: Notify::new(),
			}),
		}
	}

	/// Receiver that fires once [`shutdown`](Self::shutdown) is called.
	///
	/// Subscribe before checking [`is_shutting_down`](Self::is_shutting_down)
	/// so a shutdown in between is not missed.
	pub fn subscribe(&self) -> broadcast::Receiver<()> {
		self.inner.signal.subscribe()
	}

	/// Begin shutting down. Calling it more than once has no further effect.
	pub fn shutdown(&self) {
		if !self.inner.shutting_down.swap(true, Ordering::SeqCst) {
			tracing::info!("shutdown requested");
			// No receivers simply means nothing is listening yet
			let _ = self.inner.signal.send(());
		}
	}

	pub fn is_shutting_down(&self) -> bool {
		self.inner.shutting_down.load(Ordering::SeqCst)
	}

	/// Record that the accept loop has stopped
	pub fn notify_shutdown_complete(&self) {
		self.inner.accepting.store(false, Ordering::SeqCst);
		tracing::debug!(
			active = self.active_connections(),
			"stopped accepting connections"
		);
	}

	/// True until the accept loop has exited
	pub fn is_accepting(&self) -> bool {
		self.inner.accepting.load(Ordering::SeqCst)
	}

	pub fn timeout(&self) -> Duration {
		self.inner.timeout
	}

	/// Number of connections currently holding a [`ConnectionGuard`]
	pub fn active_connections(&self) -> usize {
		self.inner.active.load(Ordering::SeqCst)
	}

	/// Count a connection as in flight until the guard is dropped
	pub fn connection_guard(&self) -> ConnectionGuard {
		self.inner.active.fetch_add(1, Ordering::SeqCst);
		ConnectionGuard {
			inner: Arc::clone(&self.inner),
		}
	}

	/// Wait for in-flight connections to finish.
	///
	/// Returns `true` if every connection closed within the timeout and
	/// `false` if the timeout elapsed first.
	pub async fn wait_for_shutdown(&self) -> bool {
		let drained = async {
			loop {
				// Registered before the check so a wakeup in between is kept
				let idle = self.inner.idle.notified();
				if self.active_connections() == 0 {
					return;
				}
				idle.await;
			}
		};

		match tokio::time::timeout(self.inner.timeout, drained).await {
			Ok(()) => true,
			Err(_) => {
				tracing::warn!(
					active = self.active_connections(),
					timeout = ?self.inner.timeout,
					"shutdown timeout elapsed with connections still open"
				);
				false
			}
		}
	}
}

/// Marks one connection as in flight; see [`ShutdownCoordinator::connection_guard`]
#[derive(Debug)]
pub struct ConnectionGuard {
	inner: Arc<Inner>,
}

impl Drop for ConnectionGuard {
	fn drop(&mut self) {
		if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
			self.inner.idle.notify_waiters();
		}
	}
}

/// Resolves on Ctrl-C, or on SIGTERM on Unix
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => tracing::info!("received Ctrl-C"),
		_ = terminate => tracing::info!("received SIGTERM"),
	}
}
