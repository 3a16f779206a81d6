//! Cache statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time statistics for a [`ByteCache`](crate::ByteCache)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
	/// Number of `get` calls that returned a value
	pub hits: u64,
	/// Number of `get` calls that returned nothing
	pub misses: u64,
	/// Number of records dropped to make room for new ones
	pub evictions: u64,
	/// Records currently held, chunk records of large values included
	pub entry_count: u64,
	/// Bytes currently charged against the capacity
	pub bytes_used: u64,
	/// Total byte capacity fixed at construction
	pub capacity: u64,
}

impl CacheStatistics {
	/// Total number of lookups
	pub fn total_requests(&self) -> u64 {
		self.hits + self.misses
	}

	/// Calculate hit rate (0.0 to 1.0)
	///
	/// # Examples
	///
	/// ```
	/// use docserve_cache::CacheStatistics;
	///
	/// let stats = CacheStatistics {
	///     hits: 75,
	///     misses: 25,
	///     ..Default::default()
	/// };
	///
	/// assert_eq!(stats.hit_rate(), 0.75);
	/// ```
	pub fn hit_rate(&self) -> f64 {
		let total = self.total_requests();
		if total == 0 {
			0.0
		} else {
			self.hits as f64 / total as f64
		}
	}

	/// Calculate miss rate (0.0 to 1.0)
	///
	/// # Examples
	///
	/// ```
	/// use docserve_cache::CacheStatistics;
	///
	/// let stats = CacheStatistics {
	///     hits: 75,
	///     misses: 25,
	///     ..Default::default()
	/// };
	///
	/// assert_eq!(stats.miss_rate(), 0.25);
	/// ```
	pub fn miss_rate(&self) -> f64 {
		let total = self.total_requests();
		if total == 0 {
			0.0
		} else {
			self.misses as f64 / total as f64
		}
	}
}

/// Lock-free counters shared by every bucket of one cache
#[derive(Debug, Default)]
pub(crate) struct Counters {
	pub(crate) hits: AtomicU64,
	pub(crate) misses: AtomicU64,
	pub(crate) evictions: AtomicU64,
}

impl Counters {
	pub(crate) fn hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn miss(&self) {
		self.misses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn evicted(&self, count: u64) {
		if count > 0 {
			self.evictions.fetch_add(count, Ordering::Relaxed);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_statistics_hit_miss_rate() {
		let stats = CacheStatistics {
			hits: 3,
			misses: 1,
			..Default::default()
		};
		assert_eq!(stats.total_requests(), 4);
		assert_eq!(stats.hit_rate(), 0.75);
		assert_eq!(stats.miss_rate(), 0.25);
	}

	#[rstest]
	fn test_statistics_hit_miss_rate_zero_requests() {
		let stats = CacheStatistics::default();
		assert_eq!(stats.hit_rate(), 0.0);
		assert_eq!(stats.miss_rate(), 0.0);
	}

	#[rstest]
	fn test_counters_ignore_zero_evictions() {
		let counters = Counters::default();
		counters.evicted(0);
		counters.evicted(2);
		counters.hit();
		counters.miss();
		counters.miss();
		assert_eq!(counters.evictions.load(Ordering::Relaxed), 2);
		assert_eq!(counters.hits.load(Ordering::Relaxed), 1);
		assert_eq!(counters.misses.load(Ordering::Relaxed), 2);
	}
}
