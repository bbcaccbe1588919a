//! Internal OAuth client facade: authorization-code exchange and authenticated profile reads.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, HttpClientError, RedirectUrl, RequestTokenError, TokenResponse,
	TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION},
	},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AccessTokenOptions},
	error::{ConfigError, TransientError},
	flows::RedirectTarget,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient, TokenResponseAdapter},
	provider::{
		ClientAuthMethod, Endpoint, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy, TokenResponseFormat,
	},
};
#[cfg(feature = "reqwest")] use crate::error::TransportError;
#[cfg(all(test, feature = "reqwest"))] use crate::http::ReqwestHttpClient;

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(strategy, endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(endpoint, meta, message),
			_ => map_unknown_transport_error(endpoint, meta),
		}
	}
}

pub(crate) trait OAuth2Facade {
	/// Exchanges `code` at the token endpoint.
	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect: &'redirect RedirectTarget,
	) -> FacadeFuture<'a, AccessToken>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a;

	/// Performs an authenticated `GET` and decodes the JSON body.
	fn fetch_json<'a, 'strategy, 'token>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		endpoint: Endpoint,
		token: &'token AccessToken,
		url: Url,
	) -> FacadeFuture<'a, Value>
	where
		'strategy: 'a,
		'token: 'a;
}

pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	token_options: AccessTokenOptions,
	response_format: TokenResponseFormat,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			token_options: descriptor.access_token_options.clone(),
			response_format: descriptor.quirks.token_response_format,
		})
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect: &'redirect RedirectTarget,
	) -> FacadeFuture<'a, AccessToken>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = TokenResponseAdapter::new(
				self.http_client.with_metadata(meta.clone()),
				self.response_format,
			);
			let mut request =
				self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			match redirect {
				RedirectTarget::Callback(url) => {
					let redirect_url = RedirectUrl::new(url.to_string())
						.map_err(|source| ConfigError::InvalidRedirect { source })?;

					request = request.set_redirect_uri(Cow::Owned(redirect_url));
				},
				RedirectTarget::Empty => request = request.add_extra_param("redirect_uri", ""),
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(strategy, meta.take(), err, self.error_mapper.as_ref())
			})?;

			map_token_response(response, &self.token_options)
		})
	}

	fn fetch_json<'a, 'strategy, 'token>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		endpoint: Endpoint,
		token: &'token AccessToken,
		url: Url,
	) -> FacadeFuture<'a, Value>
	where
		'strategy: 'a,
		'token: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let url = token.authorize_url(url);
			let mut builder = Request::builder()
				.method(Method::GET)
				.uri(url.as_str())
				.header(ACCEPT, "application/json");

			if let Some(value) = token.authorization_header() {
				builder = builder.header(AUTHORIZATION, value);
			}

			let request = builder.body(Vec::new()).map_err(ConfigError::from)?;
			let response = instrumented.call(request).await.map_err(|err| {
				self.error_mapper.map_transport_error(
					strategy,
					endpoint,
					meta.take().as_ref(),
					err,
				)
			})?;
			let status = response.status().as_u16();

			if !response.status().is_success() {
				let ctx = ProviderErrorContext::from_response(endpoint, status, response.body());

				return Err(classify_failure(strategy, &ctx, meta.take().as_ref()));
			}

			let mut deserializer = serde_json::Deserializer::from_slice(response.body());

			serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
				TransientError::ResponseParse { endpoint, source, status: Some(status) }.into()
			})
		})
	}
}

fn map_token_response(
	response: BasicTokenResponse,
	options: &AccessTokenOptions,
) -> Result<AccessToken> {
	let mut builder = AccessToken::builder(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.options(options.clone());

	if let Some(expires_in) = response.expires_in() {
		let secs =
			i64::try_from(expires_in.as_secs()).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		if secs > 0 {
			builder = builder.expires_in(Duration::seconds(secs));
		}
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| ConfigError::from(err).into())
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(strategy, Endpoint::Token, meta_ref, error),
		// Graph-style error bodies do not fit the RFC shape, so classify them from the raw body.
		RequestTokenError::Parse(error, body) => match meta_status(meta_ref) {
			Some(status) if !(200..300).contains(&status) => classify_failure(
				strategy,
				&ProviderErrorContext::from_response(Endpoint::Token, status, &body),
				meta_ref,
			),
			status => TransientError::ResponseParse { endpoint: Endpoint::Token, source: error, status }
				.into(),
		},
		RequestTokenError::Other(message) => TransientError::Endpoint {
			endpoint: Endpoint::Token,
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new(Endpoint::Token)
		.with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	classify_failure(strategy, &ctx, meta)
}

fn classify_failure(
	strategy: &dyn ProviderStrategy,
	ctx: &ProviderErrorContext,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let endpoint = ctx.endpoint;
	let summary = ctx.summary();
	let reason = format!("the {endpoint} endpoint responded with `{summary}`");

	match strategy.classify_error(ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason },
		ProviderErrorKind::Transient => TransientError::Endpoint {
			endpoint,
			message: summary,
			status: ctx.http_status.or_else(|| meta_status(meta)),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	strategy: &dyn ProviderStrategy,
	endpoint: Endpoint,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Endpoint {
			endpoint,
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| reqwest_status(&err)),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}
	if err.is_connect() {
		let ctx = ProviderErrorContext::network_failure(endpoint)
			.with_error_description(format!("connection failed: {err}"));

		return classify_failure(strategy, &ctx, meta);
	}
	if let Some(status) = reqwest_status(&err) {
		let ctx = ProviderErrorContext::new(endpoint).with_http_status(status);

		return classify_failure(strategy, &ctx, meta);
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	endpoint: Endpoint,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::Endpoint {
		endpoint,
		message: format!("HTTP client error: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_unknown_transport_error(endpoint: Endpoint, meta: Option<&ResponseMetadata>) -> Error {
	TransientError::Endpoint {
		endpoint,
		message: "HTTP client error".into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(feature = "reqwest")]
fn reqwest_status(err: &ReqwestError) -> Option<u16> {
	err.status().map(|code| code.as_u16())
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use oauth2::basic::BasicErrorResponseType;
	// self
	use super::*;
	use crate::{auth::ProviderId, provider::DefaultProviderStrategy};

	fn descriptor(method: ClientAuthMethod) -> ProviderDescriptor {
		let provider_id =
			ProviderId::new("test-provider").expect("Failed to construct provider identifier.");

		ProviderDescriptor::builder(provider_id)
			.site(Url::parse("https://example.com").expect("Failed to parse site URL."))
			.preferred_client_auth_method(method)
			.build()
			.expect("Failed to build provider descriptor.")
	}

	fn facade(
		method: ClientAuthMethod,
	) -> Result<BasicFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>> {
		BasicFacade::from_descriptor(
			&descriptor(method),
			"client-id",
			"secret",
			Arc::new(ReqwestHttpClient::default()),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	#[test]
	fn builds_basic_and_post_auth_clients() {
		assert!(facade(ClientAuthMethod::ClientSecretBasic).is_ok());
		assert!(facade(ClientAuthMethod::ClientSecretPost).is_ok());
	}

	#[test]
	fn server_errors_are_classified_by_strategy() {
		let response = BasicErrorResponse::new(
			BasicErrorResponseType::InvalidGrant,
			Some("Code was already redeemed.".into()),
			None,
		);
		let meta = ResponseMetadata { status: Some(400), retry_after: None };
		let err = map_server_response_error(&DefaultProviderStrategy, response, Some(&meta));

		assert!(
			matches!(&err, Error::InvalidGrant { reason } if reason.contains("Code was already redeemed.")),
			"Unexpected error: {err:?}."
		);
	}

	#[test]
	fn transient_failures_keep_retry_hints() {
		let ctx = ProviderErrorContext::from_response(
			Endpoint::Profile,
			503,
			br#"{"error":"temporarily_unavailable"}"#,
		);
		let meta = ResponseMetadata { status: Some(503), retry_after: Some(Duration::seconds(7)) };
		let err = classify_failure(&DefaultProviderStrategy, &ctx, Some(&meta));

		match err {
			Error::Transient(TransientError::Endpoint { endpoint, status, retry_after, .. }) => {
				assert_eq!(endpoint, Endpoint::Profile);
				assert_eq!(status, Some(503));
				assert_eq!(retry_after, Some(Duration::seconds(7)));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[tokio::test]
	async fn refused_connections_are_transient_network_failures() {
		let err = ReqwestClient::new()
			.get("http://127.0.0.1:9/me")
			.send()
			.await
			.expect_err("Nothing should listen on the discard port.");
		let mapped = map_reqwest_error(&DefaultProviderStrategy, Endpoint::Profile, None, err);

		match mapped {
			Error::Transient(TransientError::Endpoint { endpoint, message, status, .. }) => {
				assert_eq!(endpoint, Endpoint::Profile);
				assert!(message.starts_with("connection failed"), "Unexpected message: {message}.");
				assert_eq!(status, None);
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn expiry_and_refresh_are_carried_into_access_tokens() {
		let response: BasicTokenResponse = serde_json::from_str(
			r#"{"access_token":"abc","token_type":"bearer","expires_in":3600,"refresh_token":"r"}"#,
		)
		.expect("Token response fixture should parse.");
		let token = map_token_response(response, &AccessTokenOptions::default())
			.expect("Token response should map.");

		assert_eq!(token.token.expose(), "abc");
		assert!(token.expires());
		assert_eq!(token.usable_refresh_token().map(|secret| secret.expose()), Some("r"));

		let response: BasicTokenResponse =
			serde_json::from_str(r#"{"access_token":"abc","token_type":"bearer","expires_in":0}"#)
				.expect("Token response fixture should parse.");
		let token = map_token_response(response, &AccessTokenOptions::default())
			.expect("Token response should map.");

		assert!(!token.expires());
	}
}
