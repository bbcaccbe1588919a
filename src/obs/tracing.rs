// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	obs::{FlowKind, RejectionReason},
	request::CredentialSource,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span covering one phase of a sign-in attempt.
///
/// Fields: `flow` (phase label), `provider` (descriptor id), and `stage` (call site).
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` against `provider`.
	pub fn new(kind: FlowKind, provider: &ProviderId, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_signed_request.flow",
				flow = kind.as_str(),
				provider = provider.as_ref(),
				stage
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, provider, stage);

			Self {}
		}
	}

	/// Enters the span; used by the synchronous request phase.
	pub fn entered(self) -> FlowSpanGuard {
		#[cfg(feature = "tracing")]
		{
			FlowSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			FlowSpanGuard {}
		}
	}

	/// Attaches the span to `fut` so no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`FlowSpan::entered`].
pub struct FlowSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}

/// Emits a `warn` event for a rejected signed request; the token itself is never logged.
pub fn log_signed_request_rejection(
	source: CredentialSource,
	reason: RejectionReason,
	detail: &dyn Display,
) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			source = source.as_str(),
			reason = reason.as_str(),
			detail = %detail,
			"Ignoring signed request."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (source, reason, detail);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn provider() -> ProviderId {
		ProviderId::new("riodatamine").expect("Provider identifier fixture should be valid.")
	}

	#[test]
	fn entered_span_guard_is_inert_to_callers() {
		let guard = FlowSpan::new(FlowKind::RequestPhase, &provider(), "test").entered();

		assert_eq!(format!("{guard:?}"), "FlowSpanGuard(..)");
	}

	#[test]
	fn rejection_logging_accepts_any_detail() {
		log_signed_request_rejection(
			CredentialSource::Cookie,
			RejectionReason::Malformed,
			&"Signed request is malformed.",
		);
	}

	#[tokio::test]
	async fn instrumented_phase_yields_inner_output() {
		let span = FlowSpan::new(FlowKind::Profile, &provider(), "raw_info");
		let profile = span.instrument(async { serde_json::json!({ "id": "42" }) }).await;

		assert_eq!(profile["id"], "42");
	}
}
