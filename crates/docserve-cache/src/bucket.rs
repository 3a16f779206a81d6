//! A single lock-protected shard of a [`ByteCache`](crate::ByteCache)
//!
//! Each bucket keeps an exact LRU order over its own records only. Because
//! keys are spread over many buckets, the cache as a whole evicts in
//! approximately least-recently-used order.

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};

/// Bytes charged per record on top of its key and payload
pub const RECORD_OVERHEAD: usize = 32;

/// Identity of a record inside the cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SlotKey {
	/// A key supplied by the caller
	Entry(Box<[u8]>),
	/// One piece of a large value, owned by the descriptor that carries `generation`
	Chunk { generation: u64, index: u32 },
}

impl SlotKey {
	fn charged_len(&self) -> usize {
		match self {
			SlotKey::Entry(key) => key.len(),
			SlotKey::Chunk { .. } => 12,
		}
	}
}

/// What a slot holds
#[derive(Debug, Clone)]
pub(crate) enum Record {
	/// A whole value, or one chunk of a large value
	Value(Bytes),
	/// Descriptor of a value stored as `chunks` chunk records
	Chunked {
		generation: u64,
		chunks: u32,
		len: usize,
	},
}

impl Record {
	fn charged_len(&self) -> usize {
		match self {
			Record::Value(value) => value.len(),
			Record::Chunked { .. } => 24,
		}
	}
}

#[derive(Debug)]
struct Slot {
	record: Record,
	size: usize,
	stamp: u64,
}

/// Outcome of [`Bucket::insert`]
#[derive(Debug)]
pub(crate) struct Inserted {
	pub(crate) stored: bool,
	pub(crate) evicted: u64,
	/// The record previously held under the same key
	pub(crate) replaced: Option<Record>,
}

#[derive(Debug)]
pub(crate) struct Bucket {
	capacity: usize,
	used: usize,
	clock: u64,
	slots: HashMap<SlotKey, Slot>,
	recency: BTreeMap<u64, SlotKey>,
}

impl Bucket {
	pub(crate) fn new(capacity: usize) -> Self {
		Self {
			capacity,
			used: 0,
			clock: 0,
			slots: HashMap::new(),
			recency: BTreeMap::new(),
		}
	}

	fn next_stamp(&mut self) -> u64 {
		self.clock += 1;
		self.clock
	}

	/// Looks a record up and marks it most recently used
	pub(crate) fn get(&mut self, key: &SlotKey) -> Option<Record> {
		let stamp = self.next_stamp();
		let slot = self.slots.get_mut(key)?;
		self.recency.remove(&slot.stamp);
		slot.stamp = stamp;
		self.recency.insert(stamp, key.clone());
		Some(slot.record.clone())
	}

	/// Stores a record, evicting least recently used records until it fits.
	///
	/// Any previous record under `key` is dropped first, even when the new
	/// record turns out too large to keep. A stale value must never outlive
	/// a `set` that replaced it.
	pub(crate) fn insert(&mut self, key: SlotKey, record: Record) -> Inserted {
		let replaced = self.remove(&key);

		let size = key.charged_len() + record.charged_len() + RECORD_OVERHEAD;
		if size > self.capacity {
			return Inserted {
				stored: false,
				evicted: 0,
				replaced,
			};
		}

		let mut evicted = 0;
		while self.used + size > self.capacity {
			let Some((_, victim)) = self.recency.pop_first() else {
				break;
			};
			if let Some(slot) = self.slots.remove(&victim) {
				self.used -= slot.size;
				evicted += 1;
			}
		}

		let stamp = self.next_stamp();
		self.recency.insert(stamp, key.clone());
		self.slots.insert(
			key,
			Slot {
				record,
				size,
				stamp,
			},
		);
		self.used += size;

		Inserted {
			stored: true,
			evicted,
			replaced,
		}
	}

	pub(crate) fn remove(&mut self, key: &SlotKey) -> Option<Record> {
		let slot = self.slots.remove(key)?;
		self.recency.remove(&slot.stamp);
		self.used -= slot.size;
		Some(slot.record)
	}

	pub(crate) fn len(&self) -> usize {
		self.slots.len()
	}

	pub(crate) fn used(&self) -> usize {
		self.used
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn entry(key: &str) -> SlotKey {
		SlotKey::Entry(key.as_bytes().into())
	}

	fn value(bytes: &'static [u8]) -> Record {
		Record::Value(Bytes::from_static(bytes))
	}

	fn record_size(key: &str, payload: usize) -> usize {
		key.len() + payload + RECORD_OVERHEAD
	}

	#[rstest]
	fn test_insert_and_get() {
		let mut bucket = Bucket::new(1024);
		let inserted = bucket.insert(entry("a"), value(b"alpha"));
		assert!(inserted.stored);
		assert_eq!(inserted.evicted, 0);

		match bucket.get(&entry("a")) {
			Some(Record::Value(v)) => assert_eq!(&v[..], b"alpha"),
			other => panic!("unexpected record: {other:?}"),
		}
		assert!(bucket.get(&entry("b")).is_none());
		assert_eq!(bucket.used(), record_size("a", 5));
	}

	#[rstest]
	fn test_overwrite_replaces_accounting() {
		let mut bucket = Bucket::new(1024);
		bucket.insert(entry("a"), value(b"alpha"));
		let inserted = bucket.insert(entry("a"), value(b"al"));
		assert!(matches!(inserted.replaced, Some(Record::Value(v)) if &v[..] == b"alpha"));
		assert_eq!(bucket.len(), 1);
		assert_eq!(bucket.used(), record_size("a", 2));
	}

	#[rstest]
	fn test_evicts_least_recently_used() {
		// Room for exactly two one-byte records under one-byte keys
		let mut bucket = Bucket::new(2 * record_size("a", 1));
		bucket.insert(entry("a"), value(b"1"));
		bucket.insert(entry("b"), value(b"2"));

		// Touch "a" so "b" becomes the eviction victim
		assert!(bucket.get(&entry("a")).is_some());

		let inserted = bucket.insert(entry("c"), value(b"3"));
		assert!(inserted.stored);
		assert_eq!(inserted.evicted, 1);
		assert!(bucket.get(&entry("a")).is_some());
		assert!(bucket.get(&entry("b")).is_none());
		assert!(bucket.get(&entry("c")).is_some());
	}

	#[rstest]
	fn test_oversized_record_drops_previous_value() {
		let mut bucket = Bucket::new(record_size("a", 4));
		bucket.insert(entry("a"), value(b"tiny"));

		let inserted = bucket.insert(entry("a"), value(b"far too large for this bucket"));
		assert!(!inserted.stored);
		assert!(bucket.get(&entry("a")).is_none());
		assert_eq!(bucket.used(), 0);
	}

	#[rstest]
	fn test_chunk_keys_do_not_collide_with_entries() {
		let mut bucket = Bucket::new(1024);
		bucket.insert(
			SlotKey::Chunk {
				generation: 1,
				index: 0,
			},
			value(b"chunk"),
		);
		bucket.insert(entry("chunk"), value(b"entry"));
		assert_eq!(bucket.len(), 2);
	}
}
