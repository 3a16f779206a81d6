//! Content-Type lookup by file suffix

const CONTENT_TYPES: &[(&str, &str)] = &[
	(".css", "text/css"),
	(".js", "text/javascript"),
	(".html", "text/html"),
	(".woff", "font/woff"),
];

/// Media type for `path` judged by its suffix, ignoring ASCII case.
///
/// Only stylesheets, scripts, HTML pages and WOFF fonts are recognised; every
/// other file is served without a `Content-Type`.
///
/// # Examples
///
/// ```
/// use docserve_static::content_type::content_type_for;
///
/// assert_eq!(content_type_for("styles/APP.CSS"), Some("text/css"));
/// assert_eq!(content_type_for("images/logo.png"), None);
/// ```
pub fn content_type_for(path: &str) -> Option<&'static str> {
	let bytes = path.as_bytes();
	CONTENT_TYPES.iter().find_map(|(suffix, media_type)| {
		let suffix = suffix.as_bytes();
		(bytes.len() >= suffix.len()
			&& bytes[bytes.len() - suffix.len()..].eq_ignore_ascii_case(suffix))
		.then_some(*media_type)
	})
}
