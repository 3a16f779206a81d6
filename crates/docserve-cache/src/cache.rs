//! Sharded, byte-bounded cache

use crate::bucket::{Bucket, Record, SlotKey};
use crate::statistics::{CacheStatistics, Counters};
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::hash::{BuildHasher, RandomState};
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest payload stored as a single record. Bigger values are chunked.
pub const MAX_RECORD_SIZE: usize = 64 * 1024;

/// Default number of buckets a cache is split into
pub const DEFAULT_BUCKETS: usize = 16;

/// A fixed-capacity key/value store for raw bytes.
///
/// Keys are spread over a fixed number of buckets, each with an equal share
/// of the capacity and its own lock. When a bucket is full its least recently
/// used records are evicted, which makes eviction approximately LRU across
/// the whole cache. There is no expiry and no delete: an entry lives until
/// it is overwritten or pushed out by capacity pressure, and a miss after a
/// `set` is a normal outcome.
///
/// Values larger than [`MAX_RECORD_SIZE`] are split into chunk records behind
/// a small descriptor, so callers always see one logical `get`/`set` per key.
/// A lookup either reassembles every chunk of one value or misses; it never
/// returns a mix of two values written concurrently.
///
/// All methods take `&self`; share the cache between request handlers with
/// an `Arc`.
///
/// # Examples
///
/// ```
/// use docserve_cache::ByteCache;
///
/// let cache = ByteCache::new(1024 * 1024);
/// cache.set("index.html", "<h1>hello</h1>");
///
/// assert_eq!(cache.get("index.html").as_deref(), Some(&b"<h1>hello</h1>"[..]));
/// assert!(cache.get("missing.html").is_none());
/// ```
#[derive(Debug)]
pub struct ByteCache {
	buckets: Box<[Mutex<Bucket>]>,
	hasher: RandomState,
	generation: AtomicU64,
	counters: Counters,
	capacity: usize,
}

impl ByteCache {
	/// Create a cache holding at most `capacity` bytes, split over
	/// [`DEFAULT_BUCKETS`] buckets
	pub fn new(capacity: usize) -> Self {
		Self::with_buckets(capacity, DEFAULT_BUCKETS)
	}

	/// Create a cache holding at most `capacity` bytes, split over `buckets`
	/// buckets.
	///
	/// Each bucket gets `capacity / buckets` bytes. A record bigger than one
	/// bucket's share is never stored, so chunked values need every bucket
	/// to hold at least one [`MAX_RECORD_SIZE`] chunk.
	///
	/// # Examples
	///
	/// ```
	/// use docserve_cache::ByteCache;
	///
	/// let cache = ByteCache::with_buckets(4096, 4);
	/// assert_eq!(cache.capacity(), 4096);
	/// ```
	pub fn with_buckets(capacity: usize, buckets: usize) -> Self {
		let buckets = buckets.max(1);
		let share = capacity / buckets;
		Self {
			buckets: (0..buckets).map(|_| Mutex::new(Bucket::new(share))).collect(),
			hasher: RandomState::new(),
			generation: AtomicU64::new(0),
			counters: Counters::default(),
			capacity,
		}
	}

	/// Total byte capacity
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Fetch the value stored under `key`
	pub fn get(&self, key: impl AsRef<[u8]>) -> Option<Bytes> {
		let key = SlotKey::Entry(key.as_ref().into());
		let value = match self.fetch(&key) {
			Some(Record::Value(value)) => Some(value),
			Some(Record::Chunked {
				generation,
				chunks,
				len,
			}) => self.assemble(generation, chunks, len),
			None => None,
		};

		match value {
			Some(_) => self.counters.hit(),
			None => self.counters.miss(),
		}
		value
	}

	/// Store `value` under `key`, replacing any previous value.
	///
	/// Storing is best effort. If the value cannot be kept (too large for a
	/// bucket, or a chunk cannot be placed) the previous value is dropped as
	/// well, so a later `get` misses instead of returning stale bytes.
	/// Chunks of a replaced large value are released right away.
	pub fn set(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>) {
		let key = SlotKey::Entry(key.as_ref().into());
		let value: Bytes = value.into();

		if value.len() <= MAX_RECORD_SIZE {
			self.store(key, Record::Value(value));
			return;
		}

		let Ok(chunks) = u32::try_from(value.len().div_ceil(MAX_RECORD_SIZE)) else {
			tracing::debug!(len = value.len(), "value too large to chunk, dropping");
			self.discard(&key);
			return;
		};

		let generation = self.generation.fetch_add(1, Ordering::Relaxed);
		for index in 0..chunks {
			let start = index as usize * MAX_RECORD_SIZE;
			let end = (start + MAX_RECORD_SIZE).min(value.len());
			let stored = self.store(
				SlotKey::Chunk { generation, index },
				Record::Value(value.slice(start..end)),
			);
			if !stored {
				tracing::debug!(
					len = value.len(),
					index,
					"chunk does not fit its bucket, dropping value"
				);
				self.discard(&key);
				return;
			}
		}

		self.store(
			key,
			Record::Chunked {
				generation,
				chunks,
				len: value.len(),
			},
		);
	}

	/// Snapshot of hit, miss, eviction and occupancy counters
	pub fn statistics(&self) -> CacheStatistics {
		let (entry_count, bytes_used) = self.buckets.iter().fold((0u64, 0u64), |acc, bucket| {
			let bucket = bucket.lock();
			(acc.0 + bucket.len() as u64, acc.1 + bucket.used() as u64)
		});

		CacheStatistics {
			hits: self.counters.hits.load(Ordering::Relaxed),
			misses: self.counters.misses.load(Ordering::Relaxed),
			evictions: self.counters.evictions.load(Ordering::Relaxed),
			entry_count,
			bytes_used,
			capacity: self.capacity as u64,
		}
	}

	fn bucket_for(&self, key: &SlotKey) -> &Mutex<Bucket> {
		let index = self.hasher.hash_one(key) as usize % self.buckets.len();
		&self.buckets[index]
	}

	fn fetch(&self, key: &SlotKey) -> Option<Record> {
		self.bucket_for(key).lock().get(key)
	}

	fn store(&self, key: SlotKey, record: Record) -> bool {
		let inserted = self.bucket_for(&key).lock().insert(key, record);
		self.counters.evicted(inserted.evicted);
		if let Some(replaced) = inserted.replaced {
			self.release(replaced);
		}
		inserted.stored
	}

	fn discard(&self, key: &SlotKey) {
		let removed = self.bucket_for(key).lock().remove(key);
		if let Some(removed) = removed {
			self.release(removed);
		}
	}

	/// Drop the chunk records owned by a descriptor that is no longer reachable
	fn release(&self, record: Record) {
		if let Record::Chunked {
			generation, chunks, ..
		} = record
		{
			for index in 0..chunks {
				self.bucket_for(&SlotKey::Chunk { generation, index })
					.lock()
					.remove(&SlotKey::Chunk { generation, index });
			}
		}
	}

	fn assemble(&self, generation: u64, chunks: u32, len: usize) -> Option<Bytes> {
		let mut buffer = BytesMut::with_capacity(len);
		for index in 0..chunks {
			match self.fetch(&SlotKey::Chunk { generation, index })? {
				Record::Value(part) => buffer.extend_from_slice(&part),
				Record::Chunked { .. } => return None,
			}
		}
		(buffer.len() == len).then(|| buffer.freeze())
	}
}
