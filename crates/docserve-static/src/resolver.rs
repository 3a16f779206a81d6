//! Request path validation and canonicalisation
//!
//! Turns an untrusted, already percent-decoded request path into a
//! [`CanonicalPath`] that can be joined onto the document root without
//! escaping it. Resolution is purely lexical and never touches the
//! filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::StaticError;

/// Document served for a path that names a directory
pub const INDEX_DOCUMENT: &str = "index.html";

/// A request path that passed validation.
///
/// Holds no leading `/`, no segment starting with `.`, no run of two or more
/// dots, and ends in [`INDEX_DOCUMENT`] when the request named a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(String);

impl CanonicalPath {
	/// The canonical path as a `/`-separated string
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Non-empty `/`-separated segments
	pub fn segments(&self) -> impl Iterator<Item = &str> {
		self.0.split('/').filter(|segment| !segment.is_empty())
	}

	/// Join this path onto `root` one segment at a time.
	///
	/// Empty segments are skipped, so `a//b` lands on `root/a/b` and the
	/// result always stays below `root`.
	///
	/// # Examples
	///
	/// ```
	/// use docserve_static::resolver::resolve;
	/// use std::path::Path;
	///
	/// let canonical = resolve("//etc/passwd").unwrap();
	/// assert_eq!(canonical.join_onto(Path::new("/srv/www")), Path::new("/srv/www/etc/passwd"));
	/// ```
	pub fn join_onto(&self, root: &Path) -> PathBuf {
		let mut full = root.to_path_buf();
		full.extend(self.segments());
		full
	}
}

impl fmt::Display for CanonicalPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for CanonicalPath {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Validate a request path and substitute the index document.
///
/// One leading `/` is stripped. The path is rejected when it contains a run
/// of two or more dots anywhere, a segment starting with `.`, a NUL byte, or
/// a backslash. An empty path or one ending in `/` gets [`INDEX_DOCUMENT`]
/// appended.
///
/// # Examples
///
/// ```
/// use docserve_static::resolver::resolve;
///
/// assert_eq!(resolve("/").unwrap().as_str(), "index.html");
/// assert_eq!(resolve("/docs/").unwrap().as_str(), "docs/index.html");
/// assert_eq!(resolve("/styles/app.css").unwrap().as_str(), "styles/app.css");
/// assert!(resolve("/../../etc/passwd").is_err());
/// assert!(resolve("/.git/config").is_err());
/// ```
pub fn resolve(raw_path: &str) -> Result<CanonicalPath, StaticError> {
	let path = raw_path.strip_prefix('/').unwrap_or(raw_path);

	if has_dot_run(path) || has_hidden_segment(path) || has_forbidden_char(path) {
		return Err(StaticError::PathRejected(raw_path.to_string()));
	}

	let mut canonical = path.to_string();
	if canonical.is_empty() || canonical.ends_with('/') {
		canonical.push_str(INDEX_DOCUMENT);
	}
	Ok(CanonicalPath(canonical))
}

/// True when `path` contains two or more consecutive dots anywhere
pub fn has_dot_run(path: &str) -> bool {
	path.contains("..")
}

/// True when any `/`-separated segment of `path` begins with a dot
pub fn has_hidden_segment(path: &str) -> bool {
	path.split('/').any(|segment| segment.starts_with('.'))
}

fn has_forbidden_char(path: &str) -> bool {
	path.contains(['\0', '\\'])
}
