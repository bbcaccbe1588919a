//! Request and callback phase orchestration for the signed request strategy.
//!
//! [`Authenticator`] holds the immutable per-provider configuration (descriptor, client
//! credentials, transport, strategy options) and is shared across requests. Each inbound
//! request gets its own [`AuthFlow`], which memoizes the resolved signed request, the
//! authorization mode, the access token, and the profile document.

pub mod callback;
pub mod common;
pub mod profile;
pub mod request_phase;

pub use common::*;
pub use request_phase::*;

// std
use std::sync::OnceLock;
// crates.io
use async_lock::OnceCell;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	http::TokenHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	request::{AuthRequest, AuthorizationMode, RawSignedRequest},
	signed_request::{SignedPayload, SignedRequestError},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Authenticator specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthenticator = Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Per-deployment knobs layered on top of the provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOptions {
	/// Absolute callback URL; overrides the URL derived from the request.
	pub callback_url: Option<Url>,
	/// Callback path appended to the request origin and script name.
	///
	/// Defaults to `/auth/<provider>/callback`.
	pub callback_path: Option<String>,
	/// Scopes requested when the request does not carry its own `scope` parameter.
	pub scopes: Vec<String>,
	/// Default `display` value forwarded to the authorize endpoint.
	pub display: Option<String>,
}
impl Default for StrategyOptions {
	fn default() -> Self {
		Self {
			callback_url: None,
			callback_path: None,
			scopes: vec!["email".into(), "offline_access".into()],
			display: None,
		}
	}
}

/// Signs users in against a single provider descriptor.
///
/// The authenticator owns the HTTP client, provider descriptor, strategy, and client
/// credentials; it is cheap to share and never mutated by individual requests.
#[derive(Clone)]
pub struct Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for classifying provider failures.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier; also names the signed request cookie.
	pub client_id: String,
	/// Client secret; also the HMAC key for signed requests.
	pub client_secret: String,
	/// Callback, scope, and display options.
	pub options: StrategyOptions,
}
impl<C, M> Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an authenticator that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy: Arc::new(DefaultProviderStrategy),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			options: StrategyOptions::default(),
		}
	}

	/// Replaces the error classification strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Replaces the strategy options.
	pub fn with_options(mut self, options: StrategyOptions) -> Self {
		self.options = options;

		self
	}

	/// Starts the per-request state machine.
	pub fn flow(&self, request: AuthRequest) -> AuthFlow<'_, C, M> {
		AuthFlow::new(self, request)
	}

	/// Resolves the callback URL for `request`.
	///
	/// An explicit [`StrategyOptions::callback_url`] wins; otherwise the request origin is
	/// joined with the script name and the callback path.
	pub fn callback_url(&self, request: &AuthRequest) -> Url {
		self.callback_url_for(&request.url, &request.script_name)
	}

	fn callback_url_for(&self, request_url: &Url, script_name: &str) -> Url {
		if let Some(url) = &self.options.callback_url {
			return url.clone();
		}

		let path = match &self.options.callback_path {
			Some(path) if path.starts_with('/') => path.clone(),
			Some(path) => format!("/{path}"),
			None => format!("/auth/{}/callback", self.descriptor.id),
		};
		let mut url = request_url.clone();

		url.set_query(None);
		url.set_fragment(None);
		url.set_path(&format!("{}{path}", script_name.trim_end_matches('/')));

		url
	}

	pub(crate) fn facade(&self) -> Result<BasicFacade<C, M>> {
		BasicFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			&self.client_secret,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)
	}
}
#[cfg(feature = "reqwest")]
impl Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new authenticator for the provided descriptor and client credentials.
	///
	/// The authenticator provisions its own reqwest-backed transport so callers do not need
	/// to pass HTTP handles explicitly.
	pub fn new(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self::with_http_client(
			descriptor,
			client_id,
			client_secret,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("options", &self.options)
			.finish()
	}
}

/// State for a single inbound request.
///
/// Every derived value is computed at most once. Parameters live behind a mutex so the
/// callback phase can scope an injected `code` while the flow stays shareable.
pub struct AuthFlow<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	authenticator: &'a Authenticator<C, M>,
	url: Url,
	script_name: String,
	params: Mutex<BTreeMap<String, String>>,
	cookies: BTreeMap<String, String>,
	raw_signed_request: OnceLock<Option<RawSignedRequest>>,
	signed_payload: OnceLock<Result<Option<SignedPayload>, SignedRequestError>>,
	mode: OnceLock<AuthorizationMode>,
	access_token: OnceCell<AccessToken>,
	raw_info: OnceCell<Value>,
}
impl<'a, C, M> AuthFlow<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn new(authenticator: &'a Authenticator<C, M>, request: AuthRequest) -> Self {
		let AuthRequest { url, script_name, params, cookies } = request;

		Self {
			authenticator,
			url,
			script_name,
			params: Mutex::new(params),
			cookies,
			raw_signed_request: OnceLock::new(),
			signed_payload: OnceLock::new(),
			mode: OnceLock::new(),
			access_token: OnceCell::new(),
			raw_info: OnceCell::new(),
		}
	}

	/// Authenticator driving this flow.
	pub fn authenticator(&self) -> &'a Authenticator<C, M> {
		self.authenticator
	}

	/// Current non-empty value of a request parameter.
	pub fn param(&self, name: &str) -> Option<String> {
		crate::request::non_empty(&self.params.lock(), name).map(str::to_owned)
	}

	/// Callback URL for this request.
	pub fn callback_url(&self) -> Url {
		self.authenticator.callback_url_for(&self.url, &self.script_name)
	}

	/// Raw signed request text, preferring the request parameter over the cookie.
	pub fn raw_signed_request(&self) -> Option<&RawSignedRequest> {
		self.raw_signed_request
			.get_or_init(|| {
				crate::request::resolve_raw_token(
					&self.params.lock(),
					&self.cookies,
					&self.authenticator.client_id,
				)
			})
			.as_ref()
	}

	/// Verified signed request claims, if a valid one accompanies the request.
	///
	/// Malformed or forged tokens are logged and treated as absent; a token declaring an
	/// unsupported algorithm fails with [`Error::SignedRequest`].
	pub fn signed_request(&self) -> Result<Option<&SignedPayload>> {
		match self.signed_payload.get_or_init(|| self.verify_signed_request()) {
			Ok(payload) => Ok(payload.as_ref()),
			Err(err) => Err(err.clone().into()),
		}
	}

	/// How the callback phase will obtain its access token.
	pub fn authorization_mode(&self) -> Result<AuthorizationMode> {
		if let Some(mode) = self.mode.get() {
			return Ok(*mode);
		}

		let payload = self.signed_request()?;
		let mode = AuthorizationMode::classify(payload, &self.params.lock());

		Ok(*self.mode.get_or_init(|| mode))
	}

	fn verify_signed_request(&self) -> Result<Option<SignedPayload>, SignedRequestError> {
		let Some(raw) = self.raw_signed_request() else {
			return Ok(None);
		};

		common::verify_raw(raw, &self.authenticator.client_secret)
	}
}
impl<C, M> Debug for AuthFlow<'_, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthFlow")
			.field("provider", &self.authenticator.descriptor.id)
			.field("url", &self.url)
			.field("params", &self.params.lock().keys().collect::<Vec<_>>())
			.field("raw_signed_request", &self.raw_signed_request.get())
			.field("mode", &self.mode.get())
			.field("access_token", &self.access_token.get())
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::_preludet::build_reqwest_test_authenticator;

	fn authenticator(options: StrategyOptions) -> ReqwestAuthenticator {
		let descriptor = ProviderDescriptor::riodatamine().expect("Preset descriptor should build.");

		build_reqwest_test_authenticator(descriptor, "123", "53cr3tz").with_options(options)
	}

	fn request(url: &str) -> AuthRequest {
		AuthRequest::new(Url::parse(url).expect("Request URL fixture should parse."))
	}

	#[test]
	fn callback_url_is_derived_from_request_origin() {
		let auth = authenticator(StrategyOptions::default());
		let url = auth.callback_url(
			&request("https://app.example.com:8443/auth/riodatamine?state=xyz")
				.with_script_name("/mounted/"),
		);

		assert_eq!(url.as_str(), "https://app.example.com:8443/mounted/auth/riodatamine/callback");
	}

	#[test]
	fn callback_url_honors_overrides() {
		let explicit = Url::parse("https://cb.example.com/done").expect("Override should parse.");
		let auth = authenticator(StrategyOptions {
			callback_url: Some(explicit.clone()),
			..Default::default()
		});

		assert_eq!(auth.callback_url(&request("http://localhost/x")), explicit);

		let auth = authenticator(StrategyOptions {
			callback_path: Some("sessions/callback".into()),
			..Default::default()
		});

		assert_eq!(
			auth.callback_url(&request("http://localhost/x")).as_str(),
			"http://localhost/sessions/callback"
		);
	}

	#[test]
	fn options_deserialize_with_defaults() {
		let options: StrategyOptions =
			serde_json::from_str(r#"{"display":"popup"}"#).expect("Partial options should parse.");

		assert_eq!(options.display.as_deref(), Some("popup"));
		assert_eq!(options.scopes, ["email", "offline_access"]);
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let auth = authenticator(StrategyOptions::default());
		let rendered = format!("{auth:?}");

		assert!(!rendered.contains("53cr3tz"));
		assert!(rendered.contains("client_secret_set: true"));
	}
}
