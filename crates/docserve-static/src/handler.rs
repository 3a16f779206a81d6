//! Serving orchestrator
//!
//! [`StaticFileHandler`] ties the resolver, the version tag, the freshness
//! oracle and the two cache tiers together. The tag tier maps a resolved
//! filesystem path to the [`VersionTag`] bytes seen when its content was
//! cached. The content tier maps the same key to those tag bytes followed by
//! the file bytes. Content is only served from memory when both the tag tier
//! and the content record's own prefix agree with a fresh `stat` of the file,
//! so two racing refreshes of one path cannot pair old bytes with a new tag.

use async_trait::async_trait;
use bytes::Bytes;
use docserve_cache::ByteCache;
use docserve_http::{Handler, Request, Response};
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::content_type::content_type_for;
use crate::error::{Result, StaticError};
use crate::freshness::{Freshness, evaluate};
use crate::resolver::resolve;
use crate::version::{TAG_LEN, VersionTag};

/// `Cache-Control` sent with every 200 and 304 (30 days)
pub const CACHE_CONTROL_POLICY: &str = "max-age=2592000";

/// Body of a 404 response
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Body of a 500 response
pub const SERVER_ERROR_BODY: &str = "Time Error\n";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Where the bytes of a served file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
	/// The content tier, after the tag tier matched the filesystem
	Cache,
	/// A fresh read of the file
	Disk,
}

/// Terminal state of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// Rejected path, missing file, directory, or unreadable file
	NotFound,
	/// The client validator matched the current tag
	NotModified { etag: String },
	/// File bytes with their validator and media type
	Served {
		body: Bytes,
		etag: String,
		content_type: Option<&'static str>,
		source: ServedFrom,
	},
	/// The modification time could not be encoded
	ServerError,
}

impl Outcome {
	/// Translate into an HTTP response
	pub fn into_response(self) -> Response {
		match self {
			Outcome::NotFound => Response::not_found()
				.with_header(CONTENT_TYPE.as_str(), TEXT_PLAIN)
				.with_body(NOT_FOUND_BODY),
			Outcome::NotModified { etag } => Response::not_modified()
				.with_header(ETAG.as_str(), &etag)
				.with_header(CACHE_CONTROL.as_str(), CACHE_CONTROL_POLICY),
			Outcome::Served {
				body,
				etag,
				content_type,
				..
			} => {
				let mut response = Response::ok();
				if let Some(content_type) = content_type {
					response = response.with_header(CONTENT_TYPE.as_str(), content_type);
				}
				response
					.with_header(ETAG.as_str(), &etag)
					.with_header(CACHE_CONTROL.as_str(), CACHE_CONTROL_POLICY)
					.with_body(body)
			}
			Outcome::ServerError => Response::internal_server_error()
				.with_header(CONTENT_TYPE.as_str(), TEXT_PLAIN)
				.with_body(SERVER_ERROR_BODY),
		}
	}
}

impl From<Outcome> for Response {
	fn from(outcome: Outcome) -> Self {
		outcome.into_response()
	}
}

/// Serves files below a document root through a tag tier and a content tier.
///
/// # Examples
///
/// ```no_run
/// use docserve_cache::ByteCache;
/// use docserve_static::{Outcome, StaticFileHandler};
/// use std::sync::Arc;
///
/// # async fn example() {
/// let handler = StaticFileHandler::new(
///     "/srv/www",
///     Arc::new(ByteCache::new(4 * 1024 * 1024)),
///     Arc::new(ByteCache::new(256 * 1024 * 1024)),
/// );
///
/// match handler.serve("/styles/app.css", None).await {
///     Outcome::Served { body, .. } => println!("{} bytes", body.len()),
///     other => println!("{other:?}"),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StaticFileHandler {
	root: PathBuf,
	tag_cache: Arc<ByteCache>,
	content_cache: Arc<ByteCache>,
}

impl StaticFileHandler {
	pub fn new(
		root: impl Into<PathBuf>,
		tag_cache: Arc<ByteCache>,
		content_cache: Arc<ByteCache>,
	) -> Self {
		Self {
			root: root.into(),
			tag_cache,
			content_cache,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn tag_cache(&self) -> &Arc<ByteCache> {
		&self.tag_cache
	}

	pub fn content_cache(&self) -> &Arc<ByteCache> {
		&self.content_cache
	}

	/// Serve a decoded request path, honouring an `If-None-Match` validator.
	///
	/// Every failure ends in [`Outcome::NotFound`] or [`Outcome::ServerError`]
	/// after being logged; the cause never reaches the client.
	pub async fn serve(&self, raw_path: &str, if_none_match: Option<&str>) -> Outcome {
		match self.try_serve(raw_path, if_none_match).await {
			Ok(outcome) => outcome,
			Err(StaticError::PathRejected(path)) => {
				tracing::warn!(path = %path, "rejected request path");
				Outcome::NotFound
			}
			Err(StaticError::NotFound(path)) => {
				tracing::info!(path = %path.display(), "file not found");
				Outcome::NotFound
			}
			Err(StaticError::MetadataEncoding(reason)) => {
				tracing::error!(path = raw_path, reason = %reason, "cannot encode file version");
				Outcome::ServerError
			}
			Err(StaticError::Read { path, source }) => {
				tracing::warn!(path = %path.display(), error = %source, "file read failed");
				Outcome::NotFound
			}
		}
	}

	async fn try_serve(&self, raw_path: &str, if_none_match: Option<&str>) -> Result<Outcome> {
		let canonical = resolve(raw_path)?;
		let full_path = canonical.join_onto(&self.root);

		let metadata = match fs::metadata(&full_path).await {
			Ok(metadata) if !metadata.is_dir() => metadata,
			_ => return Err(StaticError::NotFound(full_path)),
		};
		let modified = metadata
			.modified()
			.map_err(|e| StaticError::MetadataEncoding(e.to_string()))?;
		let tag = VersionTag::from_system_time(modified)?;
		let etag = tag.etag();
		let content_type = content_type_for(canonical.as_str());

		let key = full_path.as_os_str().as_encoded_bytes();
		let cached_tag = self.tag_cache.get(key);

		match evaluate(&tag, if_none_match, cached_tag.as_deref()) {
			Freshness::ClientFresh => {
				tracing::debug!(path = %full_path.display(), "client copy is current");
				return Ok(Outcome::NotModified { etag });
			}
			Freshness::ServerCacheFresh => {
				match self.content_cache.get(key) {
					Some(record) if record.starts_with(tag.as_bytes()) => {
						tracing::debug!(path = %full_path.display(), "serving from content tier");
						return Ok(Outcome::Served {
							body: record.slice(TAG_LEN..),
							etag,
							content_type,
							source: ServedFrom::Cache,
						});
					}
					Some(_) => {
						tracing::debug!(
							path = %full_path.display(),
							"content tier holds another version, reading disk"
						);
					}
					None => {
						tracing::debug!(path = %full_path.display(), "content tier miss, reading disk");
					}
				}
			}
			Freshness::Stale => {}
		}

		let record = read_tagged(&full_path, &tag, metadata.len())
			.await
			.map_err(|source| StaticError::Read {
				path: full_path.clone(),
				source,
			})?;
		let body = record.slice(TAG_LEN..);

		self.content_cache.set(key, record);
		self.tag_cache.set(key, Bytes::copy_from_slice(tag.as_bytes()));
		tracing::debug!(path = %full_path.display(), len = body.len(), "serving from disk");

		Ok(Outcome::Served {
			body,
			etag,
			content_type,
			source: ServedFrom::Disk,
		})
	}
}

/// Read a file into one buffer that starts with the tag it was read under
async fn read_tagged(path: &Path, tag: &VersionTag, len_hint: u64) -> std::io::Result<Bytes> {
	let mut file = fs::File::open(path).await?;
	let mut buffer = Vec::with_capacity(TAG_LEN + usize::try_from(len_hint).unwrap_or(0));
	buffer.extend_from_slice(tag.as_bytes());
	file.read_to_end(&mut buffer).await?;
	Ok(Bytes::from(buffer))
}

#[async_trait]
impl Handler for StaticFileHandler {
	async fn handle(&self, request: Request) -> docserve_http::Result<Response> {
		let outcome = match request.decoded_path() {
			Ok(path) => self.serve(&path, request.header("if-none-match")).await,
			Err(_) => {
				tracing::warn!(path = request.path(), "request path is not valid UTF-8");
				Outcome::NotFound
			}
		};
		Ok(outcome.into_response())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	#[rstest]
	fn test_not_found_response() {
		let response = Outcome::NotFound.into_response();
		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert_eq!(response.header("content-type"), Some(TEXT_PLAIN));
		assert_eq!(&response.body[..], NOT_FOUND_BODY.as_bytes());
		assert!(response.header("etag").is_none());
	}

	#[rstest]
	fn test_not_modified_response_has_no_body() {
		let response = Outcome::NotModified {
			etag: "\"01\"".to_string(),
		}
		.into_response();
		assert_eq!(response.status, StatusCode::NOT_MODIFIED);
		assert!(response.body.is_empty());
		assert_eq!(response.header("etag"), Some("\"01\""));
		assert_eq!(response.header("cache-control"), Some(CACHE_CONTROL_POLICY));
		assert!(response.header("content-type").is_none());
	}

	#[rstest]
	#[case(Some("text/css"))]
	#[case(None)]
	fn test_served_response(#[case] content_type: Option<&'static str>) {
		let response = Response::from(Outcome::Served {
			body: Bytes::from_static(b"body { }"),
			etag: "\"02\"".to_string(),
			content_type,
			source: ServedFrom::Disk,
		});
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.header("content-type"), content_type);
		assert_eq!(response.header("etag"), Some("\"02\""));
		assert_eq!(response.header("cache-control"), Some(CACHE_CONTROL_POLICY));
		assert_eq!(&response.body[..], b"body { }");
	}

	#[rstest]
	fn test_server_error_response() {
		let response = Outcome::ServerError.into_response();
		assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(&response.body[..], SERVER_ERROR_BODY.as_bytes());
	}
}
