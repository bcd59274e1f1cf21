//! Generic time-to-live caching for signing keys and session records.

// std
use std::{
	collections::HashMap,
	sync::{Mutex, PoisonError},
	time::Instant,
};
// self
use crate::_prelude::*;

/// Injectable monotonic clock, used to make expiry deterministic under test.
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Key/value storage with per-entry time-to-live semantics.
///
/// [`TtlCache`] is the in-memory implementation; a memcached or redis backed
/// store can be substituted behind the same contract. Only the atomic `get`
/// and `put` operations are part of the contract; implementations must not
/// expose their synchronization.
pub trait Cache<V>: Send + Sync {
	/// Look up `key`, returning `None` when absent or expired.
	fn get(&self, key: &str) -> Option<V>;

	/// Store `value` under `key`, expiring `ttl` from now. Overwrites any
	/// previous entry unconditionally.
	fn put(&self, key: &str, value: V, ttl: Duration);
}

struct Entry<V> {
	value: V,
	expires_at: Instant,
}

/// An in-memory implementation of [`Cache`].
///
/// This implementation should likely not be used for production services;
/// doing so implies that any process restart will cause all sessions to be
/// wiped out. Most services should make use of memcached, redis, etc.
///
/// Additionally this implementation does not purge old entries; expired
/// entries linger forever if never accessed again. A better in-memory cache
/// would make use of an LRU.
pub struct TtlCache<V> {
	data: Mutex<HashMap<String, Entry<V>>>,
	clock: Clock,
}
impl<V> TtlCache<V> {
	/// Create an empty cache reading the system clock.
	pub fn new() -> Self {
		Self::with_clock(Arc::new(Instant::now))
	}

	/// Create an empty cache with an injected clock.
	pub fn with_clock(clock: Clock) -> Self {
		Self { data: Mutex::new(HashMap::new()), clock }
	}
}
impl<V> Default for TtlCache<V> {
	fn default() -> Self {
		Self::new()
	}
}
impl<V> Cache<V> for TtlCache<V>
where
	V: Clone + Send,
{
	fn get(&self, key: &str) -> Option<V> {
		let now = (self.clock)();
		let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);

		// expired entries are purged on access, not by a background sweep
		let expired = matches!(data.get(key), Some(entry) if now >= entry.expires_at);

		if expired {
			data.remove(key);

			return None;
		}

		data.get(key).map(|entry| entry.value.clone())
	}

	fn put(&self, key: &str, value: V, ttl: Duration) {
		let now = (self.clock)();
		let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);

		data.insert(key.to_owned(), Entry { value, expires_at: now + ttl });
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::Mutex;
	// self
	use super::*;

	fn frozen_clock() -> (Arc<Mutex<Instant>>, Clock) {
		let now = Arc::new(Mutex::new(Instant::now()));
		let handle = now.clone();
		let clock: Clock = Arc::new(move || *handle.lock().unwrap());

		(now, clock)
	}

	#[test]
	fn get_returns_stored_value_before_expiry() {
		let cache = TtlCache::new();

		cache.put("key-1", "hello".to_string(), Duration::from_secs(60));

		assert_eq!(cache.get("key-1"), Some("hello".to_string()));
	}

	#[test]
	fn get_misses_on_unknown_key() {
		let cache: TtlCache<String> = TtlCache::new();

		assert_eq!(cache.get("non-existent"), None);
	}

	#[test]
	fn get_purges_expired_entry() {
		let (now, clock) = frozen_clock();
		let cache = TtlCache::with_clock(clock);
		let start = *now.lock().unwrap();

		cache.put("key-1", "expired-meat".to_string(), Duration::from_secs(60));

		*now.lock().unwrap() = start + Duration::from_secs(120);

		assert_eq!(cache.get("key-1"), None);
		// the entry must be gone from the underlying store, not just hidden
		assert!(!cache.data.lock().unwrap().contains_key("key-1"));
	}

	#[test]
	fn get_misses_exactly_at_expiry() {
		let (now, clock) = frozen_clock();
		let cache = TtlCache::with_clock(clock);
		let start = *now.lock().unwrap();

		cache.put("key-1", 7_u64, Duration::from_secs(60));

		*now.lock().unwrap() = start + Duration::from_secs(60);

		assert_eq!(cache.get("key-1"), None);
	}

	#[test]
	fn put_overwrites_existing_key() {
		let cache = TtlCache::new();

		cache.put("count", 1, Duration::from_secs(60));
		cache.put("count", 2, Duration::from_secs(60));

		assert_eq!(cache.get("count"), Some(2));
	}
}
