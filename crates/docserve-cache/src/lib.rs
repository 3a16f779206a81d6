//! # docserve-cache
//!
//! Bounded in-memory byte cache used for the tag tier and the content tier
//! of the docserve static file handler.
//!
//! ## Features
//!
//! - **Fixed capacity**: byte accounting per record, set once at construction
//! - **Approximate LRU**: exact LRU inside each bucket, buckets chosen by key hash
//! - **Large values**: values above [`MAX_RECORD_SIZE`] are chunked transparently
//! - **Concurrent**: `&self` methods, one lock per bucket, no external locking
//!
//! ## Quick Start
//!
//! ```rust
//! use docserve_cache::ByteCache;
//! use std::sync::Arc;
//!
//! let tags = Arc::new(ByteCache::new(4 * 1024 * 1024));
//! tags.set("/srv/www/index.html", vec![1u8, 2, 3]);
//! assert!(tags.get("/srv/www/index.html").is_some());
//! ```

#![warn(missing_docs)]

mod bucket;
mod cache;
pub mod statistics;

pub use bucket::RECORD_OVERHEAD;
pub use cache::{ByteCache, DEFAULT_BUCKETS, MAX_RECORD_SIZE};
pub use statistics::CacheStatistics;
