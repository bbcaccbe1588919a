//! Optional observability helpers for the request and callback phases.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_signed_request.flow` with the
//!   `flow` (phase), `provider`, and `stage` (call site) fields, plus a `warn` event whenever a
//!   signed request is rejected.
//! - Enable `metrics` to increment `oauth2_signed_request_flow_total{flow,outcome}`,
//!   `oauth2_signed_request_mode_total{mode}`, and
//!   `oauth2_signed_request_rejected_total{reason}`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Phases observed by the authenticator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Redirect towards the provider or straight to the callback.
	RequestPhase,
	/// Token acquisition and auth hash assembly.
	CallbackPhase,
	/// Profile (`raw_info`) fetch.
	Profile,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::RequestPhase => "request_phase",
			FlowKind::CallbackPhase => "callback_phase",
			FlowKind::Profile => "profile",
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
	/// Entry to a phase.
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

/// Why a signed request was ignored or refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionReason {
	/// Token shape or encoding was invalid; treated as absent.
	Malformed,
	/// HMAC did not match; treated as absent.
	SignatureMismatch,
	/// Declared algorithm is not `HMAC-SHA256`; fatal.
	UnsupportedAlgorithm,
}
impl RejectionReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RejectionReason::Malformed => "malformed",
			RejectionReason::SignatureMismatch => "signature_mismatch",
			RejectionReason::UnsupportedAlgorithm => "unsupported_algorithm",
		}
	}
}
impl Display for RejectionReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
