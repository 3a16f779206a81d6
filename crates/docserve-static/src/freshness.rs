//! Freshness decisions for a request
//!
//! Given the tag the filesystem reports now, the validator the client sent
//! and the tag the tag tier last recorded, decide whether the client copy is
//! current, the content tier can be trusted, or the file must be read again.

use crate::version::VersionTag;

/// Outcome of [`evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
	/// The client already holds the current version
	ClientFresh,
	/// The tag tier agrees with the filesystem, so the content tier may serve
	ServerCacheFresh,
	/// Nothing matches; read from disk and repopulate both tiers
	Stale,
}

/// Decide freshness. The client check always takes precedence.
///
/// # Examples
///
/// ```
/// use docserve_static::freshness::{Freshness, evaluate};
/// use docserve_static::VersionTag;
/// use std::time::UNIX_EPOCH;
///
/// let current = VersionTag::from_system_time(UNIX_EPOCH).unwrap();
///
/// assert_eq!(evaluate(&current, Some(&current.etag()), None), Freshness::ClientFresh);
/// assert_eq!(evaluate(&current, None, Some(&current.as_bytes()[..])), Freshness::ServerCacheFresh);
/// assert_eq!(evaluate(&current, Some("\"00\""), None), Freshness::Stale);
/// ```
pub fn evaluate(
	current: &VersionTag,
	client_validator: Option<&str>,
	cached_tag: Option<&[u8]>,
) -> Freshness {
	if client_validator.is_some_and(|validator| current.matches_validator(validator)) {
		return Freshness::ClientFresh;
	}
	if cached_tag.is_some_and(|cached| cached == current.as_bytes()) {
		return Freshness::ServerCacheFresh;
	}
	Freshness::Stale
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use std::time::{Duration, UNIX_EPOCH};

	#[fixture]
	fn current() -> VersionTag {
		VersionTag::from_system_time(UNIX_EPOCH + Duration::from_secs(1_000)).unwrap()
	}

	#[fixture]
	fn older() -> VersionTag {
		VersionTag::from_system_time(UNIX_EPOCH + Duration::from_secs(999)).unwrap()
	}

	#[rstest]
	fn test_client_match_wins_over_cache(current: VersionTag, older: VersionTag) {
		let validator = current.etag();
		assert_eq!(
			evaluate(&current, Some(&validator), Some(&older.as_bytes()[..])),
			Freshness::ClientFresh
		);
		assert_eq!(
			evaluate(&current, Some(&validator), Some(&current.as_bytes()[..])),
			Freshness::ClientFresh
		);
	}

	#[rstest]
	fn test_stale_client_falls_through_to_cache(current: VersionTag, older: VersionTag) {
		let validator = older.etag();
		assert_eq!(
			evaluate(&current, Some(&validator), Some(&current.as_bytes()[..])),
			Freshness::ServerCacheFresh
		);
	}

	#[rstest]
	fn test_outdated_cache_is_stale(current: VersionTag, older: VersionTag) {
		assert_eq!(
			evaluate(&current, None, Some(&older.as_bytes()[..])),
			Freshness::Stale
		);
	}

	#[rstest]
	fn test_no_information_is_stale(current: VersionTag) {
		assert_eq!(evaluate(&current, None, None), Freshness::Stale);
	}

	#[rstest]
	fn test_truncated_cache_entry_is_stale(current: VersionTag) {
		assert_eq!(
			evaluate(&current, None, Some(&current.as_bytes()[..10])),
			Freshness::Stale
		);
	}
}
