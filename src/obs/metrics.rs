// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"device_authorization_flow_total",
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

/// Records a token endpoint signal (`authorization_pending`, `slow_down`, ...).
pub fn record_poll_signal(signal: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("device_authorization_poll_total", "signal" => signal).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = signal;
	}
}
