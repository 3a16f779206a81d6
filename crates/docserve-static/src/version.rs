//! File version tags derived from modification time
//!
//! A [`VersionTag`] is a fixed 15-byte binary encoding of a timestamp:
//!
//! | bytes | content |
//! |-------|---------|
//! | 0 | format version, always `1` |
//! | 1..9 | big-endian `i64` seconds since 0001-01-01T00:00:00Z |
//! | 9..13 | big-endian `u32` nanoseconds |
//! | 13..15 | big-endian `i16` zone offset in minutes, always `-1` (UTC) |
//!
//! Times are always encoded in UTC, so a file's tag does not depend on the
//! local time zone of the process that computed it. The entity-tag form is
//! the lowercase hex of those bytes in double quotes. Equal tags are taken to
//! mean identical content.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::StaticError;

/// Length of the binary encoding
pub const TAG_LEN: usize = 15;

const FORMAT_VERSION: u8 = 1;
const UTC_OFFSET: i16 = -1;
/// Seconds from 0001-01-01T00:00:00Z to the Unix epoch
const UNIX_TO_INTERNAL: i64 = 62_135_596_800;

/// Opaque version of a file, encoded from its modification time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionTag([u8; TAG_LEN]);

impl VersionTag {
	/// Encode a modification time.
	///
	/// # Errors
	///
	/// Returns [`StaticError::MetadataEncoding`] when the time lies outside
	/// the range the encoding can express.
	///
	/// # Examples
	///
	/// ```
	/// use docserve_static::VersionTag;
	/// use std::time::UNIX_EPOCH;
	///
	/// let tag = VersionTag::from_system_time(UNIX_EPOCH).unwrap();
	/// assert_eq!(tag.etag(), "\"010000000e7791f70000000000ffff\"");
	/// ```
	pub fn from_system_time(time: SystemTime) -> Result<Self, StaticError> {
		let (unix_secs, nanos) = match time.duration_since(UNIX_EPOCH) {
			Ok(after) => (duration_secs(after)?, after.subsec_nanos()),
			Err(before) => {
				let before = before.duration();
				let secs = duration_secs(before)?;
				match before.subsec_nanos() {
					0 => (-secs, 0),
					nanos => (-secs - 1, 1_000_000_000 - nanos),
				}
			}
		};
		let secs = unix_secs.checked_add(UNIX_TO_INTERNAL).ok_or_else(|| {
			StaticError::MetadataEncoding(format!("modification time out of range: {time:?}"))
		})?;

		let mut bytes = [0u8; TAG_LEN];
		bytes[0] = FORMAT_VERSION;
		bytes[1..9].copy_from_slice(&secs.to_be_bytes());
		bytes[9..13].copy_from_slice(&nanos.to_be_bytes());
		bytes[13..15].copy_from_slice(&UTC_OFFSET.to_be_bytes());
		Ok(Self(bytes))
	}

	/// Binary form, as stored in the tag tier and ahead of cached content
	pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
		&self.0
	}

	/// Quoted lowercase hex, as sent in the `ETag` header
	pub fn etag(&self) -> String {
		format!("\"{}\"", hex::encode(self.0))
	}

	/// True when `validator` is exactly this tag's entity-tag form
	pub fn matches_validator(&self, validator: &str) -> bool {
		validator == self.etag()
	}
}

fn duration_secs(duration: Duration) -> Result<i64, StaticError> {
	i64::try_from(duration.as_secs()).map_err(|_| {
		StaticError::MetadataEncoding(format!("duration out of range: {duration:?}"))
	})
}
