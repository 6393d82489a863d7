// self
use crate::{
	_prelude::*,
	ext::rate_limit::{
		RateLimitContext, RateLimitDecision, RateLimitFuture, RateLimitPolicy, RetryDirective,
	},
};

type CallKey = (String, String);

const SWEEP_INTERVAL: Duration = Duration::minutes(1);
const SWEEP_LEN_FLOOR: usize = 1_024;

/// In-process limiter allowing one call per window for each caller/operation pair.
///
/// Only allowed calls are recorded; a delayed call does not push the window forward. Pairs
/// whose window has closed are swept out at most once per minute of observed time, or sooner
/// when the table doubles in size.
#[derive(Debug, Default)]
pub struct MemoryRateLimiter {
	ledger: Mutex<Ledger>,
}
impl MemoryRateLimiter {
	/// Forgets every recorded call.
	pub fn clear(&self) {
		*self.ledger.lock() = Ledger::default();
	}

	/// Number of caller/operation pairs currently tracked.
	pub fn tracked(&self) -> usize {
		self.ledger.lock().retry_at.len()
	}

	/// Drops every pair whose window closed at or before `at`; returns how many were dropped.
	pub fn purge_expired(&self, at: OffsetDateTime) -> usize {
		self.ledger.lock().sweep(at)
	}

	/// Synchronous read-and-record step behind [`RateLimitPolicy::evaluate`].
	pub fn check(&self, context: &RateLimitContext) -> RateLimitDecision {
		if context.window <= Duration::ZERO {
			return RateLimitDecision::Allow;
		}

		let key = (context.caller.clone(), context.operation.clone());
		let mut ledger = self.ledger.lock();

		let open_window = ledger
			.retry_at
			.get(&key)
			.copied()
			.filter(|earliest_retry_at| context.observed_at < *earliest_retry_at);

		if let Some(earliest_retry_at) = open_window {
			return RateLimitDecision::Delay(
				RetryDirective::new(earliest_retry_at, earliest_retry_at - context.observed_at)
					.with_reason(format!("`{}` called too frequently.", context.operation)),
			);
		}

		if ledger.sweep_due(context.observed_at) {
			ledger.sweep(context.observed_at);
		}

		ledger.retry_at.insert(key, context.observed_at + context.window);

		RateLimitDecision::Allow
	}
}
impl RateLimitPolicy for MemoryRateLimiter {
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitFuture<'_> {
		let decision = self.check(context);

		Box::pin(async move { Ok(decision) })
	}
}

#[derive(Debug, Default)]
struct Ledger {
	retry_at: HashMap<CallKey, OffsetDateTime>,
	swept_at: Option<OffsetDateTime>,
	sweep_len: usize,
}
impl Ledger {
	fn sweep_due(&self, at: OffsetDateTime) -> bool {
		self.retry_at.len() >= self.sweep_len.max(SWEEP_LEN_FLOOR)
			|| self.swept_at.is_none_or(|swept_at| at - swept_at >= SWEEP_INTERVAL)
	}

	fn sweep(&mut self, at: OffsetDateTime) -> usize {
		let before = self.retry_at.len();

		self.retry_at.retain(|_, retry_at| *retry_at > at);
		self.swept_at = Some(at);
		self.sweep_len = self.retry_at.len().saturating_mul(2);

		before - self.retry_at.len()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn context(caller: &str, at: OffsetDateTime) -> RateLimitContext {
		RateLimitContext::new(caller, "verify", Duration::seconds(5)).with_observed_at(at)
	}

	#[test]
	fn second_call_inside_window_is_delayed() {
		let limiter = MemoryRateLimiter::default();
		let start = datetime!(2025-03-01 12:00:00 UTC);

		assert_eq!(limiter.check(&context("10.0.0.1", start)), RateLimitDecision::Allow);

		let RateLimitDecision::Delay(directive) =
			limiter.check(&context("10.0.0.1", start + Duration::seconds(2)))
		else {
			panic!("Second call inside the window should be delayed.");
		};

		assert_eq!(directive.earliest_retry_at, start + Duration::seconds(5));
		assert_eq!(directive.retry_after_secs(), 3);
		assert_eq!(
			limiter.check(&context("10.0.0.1", start + Duration::seconds(5))),
			RateLimitDecision::Allow
		);
	}

	#[test]
	fn delayed_calls_do_not_extend_the_window() {
		let limiter = MemoryRateLimiter::default();
		let start = datetime!(2025-03-01 12:00:00 UTC);

		limiter.check(&context("a", start));
		limiter.check(&context("a", start + Duration::seconds(4)));

		assert_eq!(
			limiter.check(&context("a", start + Duration::seconds(5))),
			RateLimitDecision::Allow
		);
	}

	#[test]
	fn callers_and_disabled_windows_are_independent() {
		let limiter = MemoryRateLimiter::default();
		let start = datetime!(2025-03-01 12:00:00 UTC);

		limiter.check(&context("a", start));

		assert_eq!(limiter.check(&context("b", start)), RateLimitDecision::Allow);
		assert_eq!(
			limiter.check(
				&RateLimitContext::new("a", "verify", Duration::ZERO).with_observed_at(start)
			),
			RateLimitDecision::Allow
		);
		assert_eq!(limiter.tracked(), 2);

		limiter.clear();

		assert_eq!(limiter.tracked(), 0);
	}

	#[test]
	fn expired_windows_are_forgotten() {
		let limiter = MemoryRateLimiter::default();
		let start = datetime!(2025-03-01 12:00:00 UTC);

		for i in 0..10_000 {
			let caller = format!("10.0.{}.{}", i / 256, i % 256);

			assert_eq!(limiter.check(&context(&caller, start)), RateLimitDecision::Allow);
		}

		assert_eq!(limiter.tracked(), 10_000);
		assert_eq!(
			limiter.check(&context("10.9.9.9", start + Duration::days(1))),
			RateLimitDecision::Allow
		);
		assert_eq!(limiter.tracked(), 1);
	}

	#[test]
	fn purging_keeps_open_windows() {
		let limiter = MemoryRateLimiter::default();
		let start = datetime!(2025-03-01 12:00:00 UTC);

		limiter.check(&context("a", start));
		limiter.check(&context("b", start + Duration::seconds(3)));

		assert_eq!(limiter.purge_expired(start + Duration::seconds(5)), 1);
		assert_eq!(limiter.tracked(), 1);
		assert!(matches!(
			limiter.check(&context("b", start + Duration::seconds(6))),
			RateLimitDecision::Delay(_)
		));
	}
}
