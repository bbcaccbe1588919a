//! Request phase: decide where to send the user agent.
//!
//! A request that already carries a verified signed request with an embedded access token
//! short-circuits straight to the callback URL; everything else goes to the provider's
//! authorize endpoint.

// self
use crate::{
	_prelude::*,
	flows::{AuthFlow, common},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{AuthorizationMode, SIGNED_REQUEST_PARAM, STATE_PARAM},
};

/// Destination chosen by [`AuthFlow::request_phase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectKind {
	/// Straight to the callback URL, forwarding the signed request.
	Callback,
	/// To the provider's authorize endpoint.
	Authorize,
}

/// HTTP redirect the host should issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
	/// Absolute `Location` URL.
	pub location: Url,
	/// Which kind of redirect this is.
	pub kind: RedirectKind,
}

impl<C, M> AuthFlow<'_, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the redirect for the request phase.
	pub fn request_phase(&self) -> Result<Redirect> {
		const KIND: FlowKind = FlowKind::RequestPhase;

		let _span =
			FlowSpan::new(KIND, &self.authenticator().descriptor.id, "request_phase").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.build_redirect();

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	fn build_redirect(&self) -> Result<Redirect> {
		let state = self.param(STATE_PARAM);

		if self.authorization_mode()? == AuthorizationMode::DirectToken
			&& let Some(raw) = self.raw_signed_request()
		{
			let mut location = self.callback_url();

			{
				let mut pairs = location.query_pairs_mut();

				pairs.append_pair(SIGNED_REQUEST_PARAM, &raw.token);

				if let Some(state) = &state {
					pairs.append_pair(STATE_PARAM, state);
				}
			}

			return Ok(Redirect { location, kind: RedirectKind::Callback });
		}

		let authenticator = self.authenticator();
		let options = &authenticator.options;
		let scope = self.param("scope").or_else(|| {
			common::format_scope(&options.scopes, authenticator.descriptor.quirks.scope_delimiter)
		});
		let display = self.param("display").or_else(|| options.display.clone());
		let mut location = authenticator.descriptor.endpoints.authorization.clone();

		{
			let mut pairs = location.query_pairs_mut();

			pairs.append_pair("client_id", &authenticator.client_id);
			pairs.append_pair("redirect_uri", self.callback_url().as_str());
			pairs.append_pair("response_type", "code");

			if let Some(scope) = &scope {
				pairs.append_pair("scope", scope);
			}
			if let Some(display) = &display {
				pairs.append_pair("display", display);
			}
			if let Some(state) = &state {
				pairs.append_pair(STATE_PARAM, state);
			}
		}

		Ok(Redirect { location, kind: RedirectKind::Authorize })
	}
}
