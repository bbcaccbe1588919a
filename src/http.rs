//! Transport primitives for token exchanges and profile fetches.
//!
//! [`TokenHttpClient`] is the crate's only dependency on an HTTP stack. Implementations
//! hand out [`AsyncHttpClient`] handles bound to a [`ResponseMetadataSlot`]; they call
//! [`ResponseMetadataSlot::take`] before dispatching and [`ResponseMetadataSlot::store`] once
//! a status or retry hint is known, so error mapping sees consistent metadata.

// std
use std::ops::Deref;
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderValue, header::CONTENT_TYPE},
};
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::{Map, Value};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, provider::TokenResponseFormat};

/// Abstraction over HTTP transports used for provider calls.
///
/// Implementations must be `Send + Sync + 'static` so one client can back every request
/// flow, and the handles they return must own whatever state their request futures need so
/// those futures stay `Send`.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the provider, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Wraps a handle so form-encoded token responses reach `oauth2` as RFC 6749 JSON.
///
/// Successful `access_token=...&expires=...` bodies are rewritten: `expires` becomes
/// `expires_in` (dropped when zero), `token_type` defaults to `bearer`, and the content type
/// is switched to JSON. JSON bodies and error responses pass through untouched.
pub(crate) struct TokenResponseAdapter<H> {
	inner: H,
	format: TokenResponseFormat,
}
impl<H> TokenResponseAdapter<H> {
	pub(crate) fn new(inner: H, format: TokenResponseFormat) -> Self {
		Self { inner, format }
	}
}
impl<'c, H> AsyncHttpClient<'c> for TokenResponseAdapter<H>
where
	H: for<'h> AsyncHttpClient<'h, Future: 'h + Send>,
	for<'h> <H as AsyncHttpClient<'h>>::Error: Send,
{
	type Error = <H as AsyncHttpClient<'c>>::Error;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let format = self.format;
		let pending = self.inner.call(request);

		Box::pin(async move {
			let response = pending.await?;

			Ok(match format {
				TokenResponseFormat::Json => response,
				TokenResponseFormat::FormUrlEncoded => form_to_json(response),
			})
		})
	}
}

fn form_to_json(response: HttpResponse) -> HttpResponse {
	if !response.status().is_success() || looks_like_json(response.body()) {
		return response;
	}

	let mut fields = Map::new();

	for (key, value) in url::form_urlencoded::parse(response.body()) {
		match key.as_ref() {
			"expires" | "expires_in" =>
				if let Ok(secs) = value.trim().parse::<u64>()
					&& secs > 0
				{
					fields.insert("expires_in".into(), secs.into());
				},
			_ => {
				fields.insert(key.into_owned(), Value::String(value.into_owned()));
			},
		}
	}

	fields.entry("token_type").or_insert_with(|| "bearer".into());

	let (mut parts, _) = response.into_parts();

	parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	HttpResponse::from_parts(parts, Value::Object(fields).to_string().into_bytes())
}

fn looks_like_json(body: &[u8]) -> bool {
	body.iter().find(|byte| !byte.is_ascii_whitespace()).is_some_and(|byte| *byte == b'{')
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Provider calls should not follow redirects; configure any custom [`ReqwestClient`]
/// accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		InstrumentedHandle(Arc::new(InstrumentedHttpClient { client: self.0.clone(), slot }))
	}
}

#[cfg(feature = "reqwest")]
struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that records response metadata.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::StatusCode;
	// self
	use super::*;

	fn response(status: StatusCode, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = status;

		response
	}

	struct CannedHandle(&'static str);
	impl<'c> AsyncHttpClient<'c> for CannedHandle {
		type Error = HttpClientError<std::io::Error>;
		type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

		fn call(&'c self, _: HttpRequest) -> Self::Future {
			let body = self.0;

			Box::pin(async move {
				let mut response = response(StatusCode::OK, body);

				response
					.headers_mut()
					.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=UTF-8"));

				Ok(response)
			})
		}
	}

	fn require_send<T: Send>(value: T) -> T {
		value
	}

	fn json_body(response: &HttpResponse) -> Value {
		serde_json::from_slice(response.body()).expect("Rewritten body should be JSON.")
	}

	#[test]
	fn form_bodies_become_token_json() {
		let rewritten = form_to_json(response(StatusCode::OK, "access_token=abc%2B1&expires=5183999"));

		assert_eq!(
			rewritten.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
			Some("application/json")
		);
		assert_eq!(
			json_body(&rewritten),
			serde_json::json!({ "access_token": "abc+1", "expires_in": 5183999, "token_type": "bearer" })
		);
	}

	#[test]
	fn zero_expiry_is_dropped() {
		let rewritten = form_to_json(response(StatusCode::OK, "access_token=abc&expires=0"));

		assert_eq!(json_body(&rewritten).get("expires_in"), None);
	}

	#[test]
	fn json_and_error_bodies_pass_through() {
		let json = r#" {"access_token":"abc","token_type":"bearer"}"#;

		assert_eq!(form_to_json(response(StatusCode::OK, json)).body(), json.as_bytes());
		assert_eq!(
			form_to_json(response(StatusCode::BAD_REQUEST, "error=invalid_grant")).body(),
			b"error=invalid_grant"
		);
	}

	#[tokio::test]
	async fn adapter_rewrites_through_a_sendable_future() {
		let adapter = TokenResponseAdapter::new(
			CannedHandle("access_token=abc&expires=60"),
			TokenResponseFormat::FormUrlEncoded,
		);
		let pending = require_send(adapter.call(HttpRequest::new(Vec::new())));
		let rewritten = pending.await.expect("Canned handle never fails.");

		assert_eq!(
			json_body(&rewritten),
			serde_json::json!({ "access_token": "abc", "expires_in": 60, "token_type": "bearer" })
		);

		let passthrough = TokenResponseAdapter::new(
			CannedHandle("access_token=abc"),
			TokenResponseFormat::Json,
		);
		let untouched =
			passthrough.call(HttpRequest::new(Vec::new())).await.expect("Canned handle never fails.");

		assert_eq!(untouched.body(), b"access_token=abc");
	}

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(429), retry_after: Some(Duration::seconds(3)) });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(429));
		assert!(slot.take().is_none());
	}
}
