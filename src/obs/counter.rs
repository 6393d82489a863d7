// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_handshake_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a verification decision, labeled by verification mode and outcome.
pub fn record_verification(mode: &'static str, outcome: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("token_handshake_verify_total", "mode" => mode, "outcome" => outcome)
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (mode, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_a_recorder() {
		record_flow_outcome(FlowKind::Acquire, FlowOutcome::Failure);
		record_verification("action", "unauthorized");
	}
}
