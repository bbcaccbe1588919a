//! Provider strategy hooks that classify endpoint failures.
//!
//! Implementations normalize error mapping without tying flows to any particular HTTP
//! client.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Provider endpoint contacted by the flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
	/// Token endpoint (authorization-code exchange).
	Token,
	/// Profile endpoint (`raw_info`).
	Profile,
}
impl Endpoint {
	/// Returns a stable label suitable for messages and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Token => "token",
			Endpoint::Profile => "profile",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Strategy hook that allows providers to classify endpoint errors.
///
/// Implementors are required to be `Send + Sync`, and the hook uses crate-owned data types so
/// downstream crates never depend on reqwest-specific structures.
pub trait ProviderStrategy: Send + Sync {
	/// Maps HTTP/JSON failures from the token or profile endpoint into the crate taxonomy.
	fn classify_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization code or access token.
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the token covers.
	InsufficientScope,
	/// Failure is temporary and should be retried.
	Transient,
}

/// Context passed to provider strategies when classifying errors.
///
/// The struct keeps only primitive data (status codes, OAuth fields, body preview) so
/// strategies stay decoupled from any HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Endpoint associated with the failing request.
	pub endpoint: Endpoint,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field (or Graph-style `error.type`).
	pub oauth_error: Option<String>,
	/// Provider-supplied `error_description` field (or Graph-style `error.message`).
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
	/// Indicates whether the failure originated from the network/transport layer.
	pub network_error: bool,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided endpoint.
	pub fn new(endpoint: Endpoint) -> Self {
		Self {
			endpoint,
			http_status: None,
			oauth_error: None,
			error_description: None,
			body_preview: None,
			network_error: false,
		}
	}

	/// Convenience constructor for transport-level/network failures.
	pub fn network_failure(endpoint: Endpoint) -> Self {
		let mut ctx = Self::new(endpoint);

		ctx.network_error = true;

		ctx
	}

	/// Builds a context from an error response body.
	///
	/// Understands RFC 6749 bodies (`{"error": "...", "error_description": "..."}`) and
	/// Graph-style bodies (`{"error": {"type": "...", "message": "..."}}`); anything else is
	/// kept as a body preview.
	pub fn from_response(endpoint: Endpoint, status: u16, body: &[u8]) -> Self {
		let mut ctx = Self::new(endpoint).with_http_status(status);

		match serde_json::from_slice::<Value>(body) {
			Ok(Value::Object(fields)) => {
				match fields.get("error") {
					Some(Value::String(error)) => ctx.oauth_error = Some(error.clone()),
					Some(Value::Object(nested)) => {
						ctx.oauth_error = nested.get("type").and_then(Value::as_str).map(Into::into);
						ctx.error_description =
							nested.get("message").and_then(Value::as_str).map(Into::into);
					},
					_ => (),
				}

				if let Some(description) =
					fields.get("error_description").and_then(Value::as_str)
				{
					ctx.error_description = Some(description.to_owned());
				}
			},
			_ =>
				if !body.is_empty() {
					ctx = ctx.with_body_preview(String::from_utf8_lossy(body).into_owned());
				},
		}

		ctx
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}

	/// Human-readable summary used in error messages.
	pub fn summary(&self) -> String {
		self.error_description
			.clone()
			.or_else(|| self.oauth_error.clone())
			.or_else(|| self.body_preview.clone())
			.or_else(|| self.http_status.map(|status| format!("HTTP {status}")))
			.unwrap_or_else(|| "no details".into())
	}
}

/// Default strategy that applies RFC-guided heuristics plus Graph API error types.
///
/// It prioritizes structured fields (`error`, `error_description`), then falls back to body
/// text hints, and finally the HTTP status code. Network failures are always transient.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if ctx.network_error {
			return ProviderErrorKind::Transient;
		}

		if let Some(kind) =
			classify_oauth_error(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
		{
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf: String = body.chars().take(ProviderErrorContext::BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ProviderErrorKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| classify_body(error_description))
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("access_denied")
		|| value.eq_ignore_ascii_case("OAuthException")
	{
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ProviderErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn graph_style_bodies_are_unpacked() {
		let ctx = ProviderErrorContext::from_response(
			Endpoint::Profile,
			400,
			br#"{"error":{"type":"OAuthException","message":"Error validating access token."}}"#,
		);

		assert_eq!(ctx.oauth_error.as_deref(), Some("OAuthException"));
		assert_eq!(ctx.error_description.as_deref(), Some("Error validating access token."));
		assert_eq!(DefaultProviderStrategy.classify_error(&ctx), ProviderErrorKind::InvalidGrant);
		assert_eq!(ctx.summary(), "Error validating access token.");
	}

	#[test]
	fn rfc_bodies_and_plain_text_are_classified() {
		let ctx = ProviderErrorContext::from_response(
			Endpoint::Token,
			401,
			br#"{"error":"invalid_client"}"#,
		);

		assert_eq!(DefaultProviderStrategy.classify_error(&ctx), ProviderErrorKind::InvalidClient);

		let ctx = ProviderErrorContext::from_response(Endpoint::Token, 503, b"please retry later");

		assert_eq!(ctx.body_preview.as_deref(), Some("please retry later"));
		assert_eq!(DefaultProviderStrategy.classify_error(&ctx), ProviderErrorKind::Transient);
	}

	#[test]
	fn status_fallback_and_network_failures() {
		let strategy = DefaultProviderStrategy;

		assert_eq!(
			strategy.classify_error(&ProviderErrorContext::from_response(Endpoint::Token, 403, b"")),
			ProviderErrorKind::InsufficientScope
		);
		assert_eq!(
			strategy.classify_error(&ProviderErrorContext::network_failure(Endpoint::Profile)),
			ProviderErrorKind::Transient
		);
	}

	#[test]
	fn body_preview_is_truncated() {
		let ctx = ProviderErrorContext::new(Endpoint::Token).with_body_preview("x".repeat(300));
		let preview = ctx.body_preview.expect("Preview should be recorded.");

		assert_eq!(preview.chars().count(), ProviderErrorContext::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
