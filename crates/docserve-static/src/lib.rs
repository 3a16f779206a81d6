//! # docserve-static
//!
//! Conditional static file serving backed by two in-memory cache tiers.
//!
//! A request path is validated and canonicalised by [`resolver`], the file's
//! modification time becomes a [`VersionTag`], and [`freshness::evaluate`]
//! decides between a `304`, a reply from the content tier, or a fresh read
//! from disk. [`StaticFileHandler`] drives the whole flow and implements
//! [`docserve_http::Handler`].
//!
//! ## Cache tiers
//!
//! Both tiers are [`docserve_cache::ByteCache`] instances keyed by the
//! resolved filesystem path:
//!
//! - the **tag tier** holds the 15-byte version tag observed when the file
//!   was last read;
//! - the **content tier** holds the bytes read at that moment.
//!
//! The tiers are written together after every disk read, but nothing links
//! them in storage. Cached content is only used when the tag tier matches
//! the tag computed from a fresh `stat`.

pub mod content_type;
pub mod error;
pub mod freshness;
pub mod handler;
pub mod resolver;
pub mod version;

pub use error::{Result, StaticError};
pub use freshness::Freshness;
pub use handler::{Outcome, ServedFrom, StaticFileHandler};
pub use resolver::CanonicalPath;
pub use version::VersionTag;
