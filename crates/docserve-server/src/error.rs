//! Server error type

use std::net::SocketAddr;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("failed to bind {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to accept connection: {0}")]
	Accept(#[source] std::io::Error),

	#[error("connection error: {0}")]
	Connection(#[from] hyper::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
