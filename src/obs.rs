//! Optional observability helpers for token flows and request verification.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_handshake.flow` with the `flow` and
//!   `stage` (call site) fields, plus debug/warn events at lifecycle decisions.
//! - Enable `metrics` to increment the `token_handshake_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `token_handshake_verify_total` counter labeled by `mode` + `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

pub(crate) use span::flow_event;

// self
use crate::_prelude::*;

/// Flow kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Code + token handshake.
	Acquire,
	/// Refresh-token extension.
	Refresh,
	/// Lifecycle gate evaluation.
	Resolve,
	/// Inbound request verification.
	Verify,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Acquire => "acquire",
			FlowKind::Refresh => "refresh",
			FlowKind::Resolve => "resolve",
			FlowKind::Verify => "verify",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
