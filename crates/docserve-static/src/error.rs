//! Error types for static file serving

use std::path::PathBuf;

/// Why a request did not end in a served file
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StaticError {
	/// The request path tried to leave the document root or name a hidden file
	#[error("rejected request path: {0}")]
	PathRejected(String),

	/// Nothing servable exists at the resolved location
	#[error("file not found: {}", .0.display())]
	NotFound(PathBuf),

	/// The modification time could not be turned into a version tag
	#[error("cannot encode modification time: {0}")]
	MetadataEncoding(String),

	/// The file vanished or became unreadable between stat and read
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

pub type Result<T> = std::result::Result<T, StaticError>;
