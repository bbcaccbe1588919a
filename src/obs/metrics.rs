// self
use crate::{
	obs::{FlowKind, FlowOutcome, RejectionReason},
	request::AuthorizationMode,
};

/// Records a phase outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_signed_request_flow_total",
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

/// Records which authorization mode a callback resolved to.
pub fn record_authorization_mode(mode: AuthorizationMode) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_signed_request_mode_total", "mode" => mode.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = mode;
	}
}

/// Records a rejected signed request.
pub fn record_signed_request_rejection(reason: RejectionReason) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_signed_request_rejected_total", "reason" => reason.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = reason;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_flow_outcome(FlowKind::CallbackPhase, FlowOutcome::Failure);
		record_authorization_mode(AuthorizationMode::DirectToken);
		record_signed_request_rejection(RejectionReason::SignatureMismatch);
	}
}
