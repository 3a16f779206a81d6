//! Concurrent access and eviction behaviour of ByteCache

use bytes::Bytes;
use docserve_cache::{ByteCache, MAX_RECORD_SIZE, RECORD_OVERHEAD};
use rstest::rstest;
use std::sync::Arc;
use std::thread;

#[rstest]
fn test_concurrent_writers_never_produce_torn_values() {
	let cache = Arc::new(ByteCache::with_buckets(8 * 1024 * 1024, 8));
	// Two large values of equal length but different content
	let first = Bytes::from(vec![b'a'; 3 * MAX_RECORD_SIZE + 5]);
	let second = Bytes::from(vec![b'b'; 3 * MAX_RECORD_SIZE + 5]);

	let writers: Vec<_> = [first.clone(), second.clone()]
		.into_iter()
		.map(|value| {
			let cache = Arc::clone(&cache);
			thread::spawn(move || {
				for _ in 0..50 {
					cache.set("shared", value.clone());
				}
			})
		})
		.collect();

	let readers: Vec<_> = (0..4)
		.map(|_| {
			let cache = Arc::clone(&cache);
			let first = first.clone();
			let second = second.clone();
			thread::spawn(move || {
				for _ in 0..200 {
					if let Some(value) = cache.get("shared") {
						assert!(value == first || value == second, "torn value observed");
					}
				}
			})
		})
		.collect();

	for handle in writers.into_iter().chain(readers) {
		handle.join().unwrap();
	}

	let last = cache.get("shared").expect("value should survive the race");
	assert!(last == first || last == second);
}

#[rstest]
fn test_concurrent_distinct_keys() {
	let cache = Arc::new(ByteCache::new(16 * 1024 * 1024));

	let handles: Vec<_> = (0..8)
		.map(|worker| {
			let cache = Arc::clone(&cache);
			thread::spawn(move || {
				for i in 0..100 {
					let key = format!("worker-{worker}/file-{i}");
					cache.set(&key, key.clone().into_bytes());
					assert_eq!(cache.get(&key).as_deref(), Some(key.as_bytes()));
				}
			})
		})
		.collect();

	for handle in handles {
		handle.join().unwrap();
	}

	assert_eq!(cache.statistics().entry_count, 800);
	assert_eq!(cache.statistics().evictions, 0);
}

#[rstest]
fn test_capacity_is_never_exceeded() {
	let capacity = 4 * 1024;
	let cache = ByteCache::with_buckets(capacity, 4);

	for i in 0..500 {
		cache.set(format!("key-{i}"), vec![0u8; 100]);
	}

	let stats = cache.statistics();
	assert!(stats.bytes_used <= capacity as u64);
	assert!(stats.evictions > 0);
	// The most recent write always fits
	assert!(cache.get("key-499").is_some());
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(MAX_RECORD_SIZE)]
#[case(MAX_RECORD_SIZE + 1)]
#[case(5 * MAX_RECORD_SIZE)]
fn test_value_sizes_around_chunk_boundary(#[case] len: usize) {
	let cache = ByteCache::with_buckets(8 * 1024 * 1024, 4);
	let value: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();

	cache.set("file", value.clone());

	assert_eq!(cache.get("file").as_deref(), Some(&value[..]));
}

#[rstest]
fn test_small_tier_accounting() {
	// A tag tier sized for exactly three 15-byte tags under 10-byte keys
	let per_record = 10 + 15 + RECORD_OVERHEAD;
	let cache = ByteCache::with_buckets(3 * per_record, 1);

	for name in ["aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc", "dddddddddd"] {
		cache.set(name, vec![1u8; 15]);
	}

	assert!(cache.get("aaaaaaaaaa").is_none());
	assert!(cache.get("dddddddddd").is_some());
	assert_eq!(cache.statistics().evictions, 1);
}
