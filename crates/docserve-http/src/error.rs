//! Handler error type

/// Errors a [`Handler`](crate::Handler) may return.
///
/// The server turns any of these into a `500 Internal Server Error`.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Internal error: {0}")]
	Internal(String),
}

/// Result alias used by handlers
pub type Result<T> = std::result::Result<T, Error>;
