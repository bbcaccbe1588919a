//! Profile-backed accessors: `raw_info`, `uid`, identity, credentials, and extras.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	flows::AuthFlow,
	http::TokenHttpClient,
	normalize::{self, AuthHash, NormalizedCredentials, NormalizedExtra, NormalizedIdentity},
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Endpoint,
};

impl<C, M> AuthFlow<'_, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Profile document from the provider, fetched once per request with the access token.
	pub async fn raw_info(&self) -> Result<&Value> {
		self.raw_info.get_or_try_init(|| self.fetch_profile()).await
	}

	/// Provider-scoped user identifier (the profile's `id`).
	pub async fn uid(&self) -> Result<String> {
		match self.raw_info().await?.get("id") {
			Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
			Some(Value::Number(id)) => Ok(id.to_string()),
			_ => Err(Error::IncompleteProfile { field: "id" }),
		}
	}

	/// Identity fields.
	pub async fn info(&self) -> Result<NormalizedIdentity> {
		let raw_info = self.raw_info().await?;
		let mut info = Map::new();

		info.insert("name".into(), raw_info.get("name").cloned().unwrap_or(Value::Null));

		Ok(normalize::prune(info))
	}

	/// Credential fields.
	///
	/// `refresh_token` is only reported for expiring tokens that carry a non-empty one.
	pub async fn credentials(&self) -> Result<NormalizedCredentials> {
		let token = self.build_access_token().await?;
		let mut credentials = Map::new();

		credentials.insert("token".into(), token.token.expose().into());

		if let Some(refresh) = token.usable_refresh_token() {
			credentials.insert("refresh_token".into(), refresh.expose().into());
		}

		credentials.insert("expires".into(), token.expires().into());
		credentials.insert("expires_at".into(), token.expires_at_unix().into());

		Ok(normalize::prune(credentials))
	}

	/// Extra metadata (`raw_info`).
	pub async fn extra(&self) -> Result<NormalizedExtra> {
		let mut extra = Map::new();

		extra.insert("raw_info".into(), self.raw_info().await?.clone());

		Ok(normalize::prune(extra))
	}

	/// Assembles the [`AuthHash`] handed to the host after a successful callback.
	pub async fn auth_hash(&self) -> Result<AuthHash> {
		Ok(AuthHash {
			provider: self.authenticator().descriptor.id.clone(),
			uid: self.uid().await?,
			info: self.info().await?,
			credentials: self.credentials().await?,
			extra: self.extra().await?,
		})
	}

	async fn fetch_profile(&self) -> Result<Value> {
		const KIND: FlowKind = FlowKind::Profile;

		let span = FlowSpan::new(KIND, &self.authenticator().descriptor.id, "raw_info");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.build_access_token().await?;
				let authenticator = self.authenticator();
				let facade = authenticator.facade()?;

				facade
					.fetch_json(
						authenticator.strategy.as_ref(),
						Endpoint::Profile,
						token,
						authenticator.descriptor.endpoints.profile.clone(),
					)
					.await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
