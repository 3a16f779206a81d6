//! Inbound HTTP request

use bytes::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Uri, Version};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::net::SocketAddr;
use std::str::Utf8Error;

use crate::{Error, Result};

/// HTTP request representation
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use docserve_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::HEAD)
	///     .uri("/styles/app.css")
	///     .header("if-none-match", "\"01\"")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.method, Method::HEAD);
	/// assert_eq!(request.header("If-None-Match"), Some("\"01\""));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Shorthand for a bodiless HTTP/1.1 GET request
	pub fn get(uri: Uri) -> Self {
		Self {
			method: Method::GET,
			uri,
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			remote_addr: None,
		}
	}

	/// Get the request path exactly as it appeared on the wire
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Get the request path with percent-escapes decoded
	///
	/// # Examples
	///
	/// ```
	/// use docserve_http::Request;
	///
	/// let request = Request::get(hyper::Uri::from_static("/docs/read%20me.html"));
	/// assert_eq!(request.decoded_path().unwrap(), "/docs/read me.html");
	/// ```
	pub fn decoded_path(&self) -> std::result::Result<Cow<'_, str>, Utf8Error> {
		percent_decode_str(self.uri.path()).decode_utf8()
	}

	/// Get a header value as a string. Non-ASCII values are treated as absent.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	headers: HeaderMap,
	invalid_header: Option<String>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.insert(name, value);
			}
			_ => self.invalid_header = Some(name.to_string()),
		}
		self
	}

	/// Finish a bodiless HTTP/1.1 request.
	///
	/// # Errors
	///
	/// Fails when the URI does not parse or a header was invalid.
	pub fn build(self) -> Result<Request> {
		if let Some(name) = self.invalid_header {
			return Err(Error::Internal(format!("invalid header: {name}")));
		}
		let uri = match self.uri {
			Some(uri) => uri
				.parse::<Uri>()
				.map_err(|e| Error::Internal(format!("invalid URI {uri:?}: {e}")))?,
			None => Uri::from_static("/"),
		};

		Ok(Request {
			method: self.method,
			uri,
			version: Version::HTTP_11,
			headers: self.headers,
			body: Bytes::new(),
			remote_addr: None,
		})
	}
}
