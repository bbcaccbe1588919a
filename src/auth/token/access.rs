//! Access tokens produced by the callback phase, plus their builder.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::token::{
		options::{AccessTokenOptions, TokenPlacement},
		secret::TokenSecret,
	},
};

/// Errors produced by [`AccessTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AccessTokenBuilderError {
	/// Issued when the access token value is empty.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the expiry precedes the issued-at instant.
	#[error("Access token expires before it was issued.")]
	ExpiresBeforeIssued,
}

/// Bearer credential ready for resource calls.
#[derive(Clone)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Issued-at instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant; `None` for non-expiring tokens.
	pub expires_at: Option<OffsetDateTime>,
	/// Extra provider metadata (remaining signed request claims on the direct path).
	pub params: Map<String, Value>,
	/// Placement options for resource requests.
	pub options: AccessTokenOptions,
}
impl AccessToken {
	/// Returns a builder seeded with the access token value.
	pub fn builder(token: impl Into<String>) -> AccessTokenBuilder {
		AccessTokenBuilder::new(token.into())
	}

	/// Returns `true` when the token carries an expiry.
	pub fn expires(&self) -> bool {
		self.expires_at.is_some()
	}

	/// Expiry as a UNIX timestamp.
	pub fn expires_at_unix(&self) -> Option<i64> {
		self.expires_at.map(OffsetDateTime::unix_timestamp)
	}

	/// Refresh token, only when the access token expires and the refresh token is non-empty.
	pub fn usable_refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| self.expires() && !secret.is_empty())
	}

	/// `Authorization` header value when the placement is [`TokenPlacement::Header`].
	pub fn authorization_header(&self) -> Option<String> {
		match self.options.mode {
			TokenPlacement::Header => Some(self.options.header_value(self.token.expose())),
			TokenPlacement::Query => None,
		}
	}

	/// Returns `url` with the token appended when the placement is [`TokenPlacement::Query`].
	pub fn authorize_url(&self, mut url: Url) -> Url {
		if matches!(self.options.mode, TokenPlacement::Query) {
			url.query_pairs_mut().append_pair(&self.options.param_name, self.token.expose());
		}

		url
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("params", &self.params.keys().collect::<Vec<_>>())
			.field("options", &self.options)
			.finish()
	}
}

/// Builder for [`AccessToken`].
#[derive(Clone, Debug)]
pub struct AccessTokenBuilder {
	token: String,
	refresh_token: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	params: Map<String, Value>,
	options: AccessTokenOptions,
}
impl AccessTokenBuilder {
	fn new(token: String) -> Self {
		Self {
			token,
			refresh_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
			params: Map::new(),
			options: AccessTokenOptions::default(),
		}
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Merges provider metadata into the token.
	pub fn params(mut self, params: Map<String, Value>) -> Self {
		self.params.extend(params);

		self
	}

	/// Overrides the placement options.
	pub fn options(mut self, options: AccessTokenOptions) -> Self {
		self.options = options;

		self
	}

	/// Consumes the builder and produces an [`AccessToken`].
	pub fn build(self) -> Result<AccessToken, AccessTokenBuilderError> {
		if self.token.is_empty() {
			return Err(AccessTokenBuilderError::MissingAccessToken);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(issued_at + delta),
			(None, None) => None,
		};

		if expires_at.is_some_and(|instant| instant < issued_at) {
			return Err(AccessTokenBuilderError::ExpiresBeforeIssued);
		}

		Ok(AccessToken {
			token: TokenSecret::new(self.token),
			refresh_token: self.refresh_token.map(TokenSecret::new),
			issued_at,
			expires_at,
			params: self.params,
			options: self.options,
		})
	}
}
