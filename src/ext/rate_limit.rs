//! Rate limit policy contracts consulted by the verifier before (or after) remote checks.

mod memory;

pub use memory::MemoryRateLimiter;

// self
use crate::_prelude::*;

/// Boxed future returned by [`RateLimitPolicy::evaluate`].
pub type RateLimitFuture<'a> = Pin<Box<dyn Future<Output = Result<RateLimitDecision>> + 'a + Send>>;

/// Strategy that decides whether a caller may perform an operation right now.
///
/// `evaluate` is a single read-and-record step: an allowed call counts against the window in
/// the same evaluation, so two concurrent callers cannot both slip through.
pub trait RateLimitPolicy
where
	Self: Send + Sync,
{
	/// Evaluates whether the call described by `context` should be delayed.
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitFuture<'_>;
}

/// Context shared with a [`RateLimitPolicy`] before a guarded call is made.
#[derive(Clone, Debug)]
pub struct RateLimitContext {
	/// Caller identity the budget belongs to (client address, API key, ...).
	pub caller: String,
	/// Logical operation being attempted.
	pub operation: String,
	/// Minimum spacing between two allowed calls.
	pub window: Duration,
	/// Timestamp observed before invoking the policy.
	pub observed_at: OffsetDateTime,
}
impl RateLimitContext {
	/// Creates a new context for the given caller/operation pair.
	pub fn new(caller: impl Into<String>, operation: impl Into<String>, window: Duration) -> Self {
		Self {
			caller: caller.into(),
			operation: operation.into(),
			window,
			observed_at: OffsetDateTime::now_utc(),
		}
	}

	/// Overrides the timestamp associated with the observation.
	pub fn with_observed_at(mut self, instant: OffsetDateTime) -> Self {
		self.observed_at = instant;

		self
	}
}

/// Result emitted by a [`RateLimitPolicy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The call may proceed immediately.
	Allow,
	/// The call came too soon.
	Delay(RetryDirective),
}

/// Advises callers when to retry after a [`RateLimitDecision::Delay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Time left until `earliest_retry_at`.
	pub recommended_backoff: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, recommended_backoff: Duration) -> Self {
		Self { earliest_retry_at, recommended_backoff, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}

	/// Backoff rounded up to whole seconds, never less than one.
	pub fn retry_after_secs(&self) -> u64 {
		let secs = self.recommended_backoff.whole_seconds().max(0) as u64;
		let partial = self.recommended_backoff.subsec_nanoseconds() > 0;

		(secs + u64::from(partial)).max(1)
	}
}
