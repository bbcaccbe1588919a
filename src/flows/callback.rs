//! Callback phase: obtain an access token by one of the four authorization modes and
//! assemble the auth hash.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::ConfigError,
	flows::{AuthFlow, RedirectTarget, common::InjectedParam},
	http::TokenHttpClient,
	normalize::AuthHash,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{AuthorizationMode, CODE_PARAM},
	signed_request::SignedPayload,
};

impl<C, M> AuthFlow<'_, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Completes sign-in: checks for provider errors, acquires the access token, fetches the
	/// profile, and returns the normalized [`AuthHash`].
	pub async fn callback_phase(&self) -> Result<AuthHash> {
		const KIND: FlowKind = FlowKind::CallbackPhase;

		let span = FlowSpan::new(KIND, &self.authenticator().descriptor.id, "callback_phase");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.ensure_no_callback_error()?;
				self.build_access_token().await?;
				self.auth_hash().await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Returns the access token for this request, acquiring it on first use.
	///
	/// Only [`AuthorizationMode::CodeFromRequest`] and
	/// [`AuthorizationMode::CodeFromSignedPayload`] contact the token endpoint.
	pub async fn build_access_token(&self) -> Result<&AccessToken> {
		self.access_token.get_or_try_init(|| self.acquire_access_token()).await
	}

	async fn acquire_access_token(&self) -> Result<AccessToken> {
		let mode = self.authorization_mode()?;

		obs::record_authorization_mode(mode);

		match mode {
			AuthorizationMode::DirectToken => match self.signed_request()? {
				Some(payload) => self.direct_access_token(payload),
				None => Err(Error::MissingAuthorization),
			},
			AuthorizationMode::CodeFromRequest => {
				let code = self.param(CODE_PARAM).ok_or(Error::MissingAuthorization)?;

				self.exchange_code(&code, &RedirectTarget::Callback(self.callback_url())).await
			},
			AuthorizationMode::CodeFromSignedPayload => {
				let embedded = self
					.signed_request()?
					.and_then(SignedPayload::code)
					.ok_or(Error::MissingAuthorization)?;
				let injected = InjectedParam::new(&self.params, CODE_PARAM, embedded);
				let code = injected.value().ok_or(Error::MissingAuthorization)?;

				self.exchange_code(&code, &RedirectTarget::Empty).await
			},
			AuthorizationMode::Unavailable => Err(Error::MissingAuthorization),
		}
	}

	fn direct_access_token(&self, payload: &SignedPayload) -> Result<AccessToken> {
		let token = payload.oauth_token().ok_or(Error::MissingAuthorization)?;
		let mut params = payload.claims().clone();

		params.remove("oauth_token");

		let expires_at =
			payload.expires().and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok());
		let mut issued_at = payload
			.issued_at()
			.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
			.unwrap_or_else(OffsetDateTime::now_utc);
		let mut builder = AccessToken::builder(token)
			.params(params)
			.options(self.authenticator().descriptor.access_token_options.clone());

		if let Some(expires_at) = expires_at {
			issued_at = issued_at.min(expires_at);
			builder = builder.expires_at(expires_at);
		}

		builder.issued_at(issued_at).build().map_err(|err| ConfigError::from(err).into())
	}

	async fn exchange_code(&self, code: &str, redirect: &RedirectTarget) -> Result<AccessToken> {
		let authenticator = self.authenticator();
		let facade = authenticator.facade()?;

		facade.exchange_authorization_code(authenticator.strategy.as_ref(), code, redirect).await
	}

	fn ensure_no_callback_error(&self) -> Result<()> {
		match self.param("error").or_else(|| self.param("error_reason")) {
			Some(error) =>
				Err(Error::Callback { error, description: self.param("error_description") }),
			None => Ok(()),
		}
	}
}
