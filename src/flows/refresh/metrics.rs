// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh attempts.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	extended: AtomicU64,
	fallbacks: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of refresh calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that extended the access token.
	pub fn extensions(&self) -> u64 {
		self.extended.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes answered with "reacquire".
	pub fn fallbacks(&self) -> u64 {
		self.fallbacks.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh calls.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_extension(&self) {
		self.extended.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fallback(&self) {
		self.fallbacks.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
