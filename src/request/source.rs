//! Locates the raw signed request text on an inbound request.

// self
use crate::{
	_prelude::*,
	request::{SIGNED_REQUEST_PARAM, non_empty},
};

/// Prefix of the cookie written by the client-side SDK; the OAuth client id completes the name.
pub const SIGNED_REQUEST_COOKIE_PREFIX: &str = "fbsr_";

/// Where the raw signed request was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialSource {
	/// The `signed_request` request parameter (server-side canvas flow).
	RequestParameter,
	/// The `fbsr_<client_id>` cookie (client-side SDK flow).
	Cookie,
}
impl CredentialSource {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialSource::RequestParameter => "request_parameter",
			CredentialSource::Cookie => "cookie",
		}
	}
}
impl Display for CredentialSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Unverified signed request text together with its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct RawSignedRequest {
	/// Where the token was found.
	pub source: CredentialSource,
	/// Token text exactly as received.
	pub token: String,
}
impl Debug for RawSignedRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RawSignedRequest")
			.field("source", &self.source)
			.field("token", &"<redacted>")
			.finish()
	}
}

/// Returns the cookie name carrying signed requests for `client_id`.
pub fn signed_request_cookie_name(client_id: &str) -> String {
	format!("{SIGNED_REQUEST_COOKIE_PREFIX}{client_id}")
}

/// Finds the raw signed request, preferring the request parameter over the cookie.
pub fn resolve_raw_token(
	params: &BTreeMap<String, String>,
	cookies: &BTreeMap<String, String>,
	client_id: &str,
) -> Option<RawSignedRequest> {
	if let Some(token) = non_empty(params, SIGNED_REQUEST_PARAM) {
		return Some(RawSignedRequest {
			source: CredentialSource::RequestParameter,
			token: token.to_owned(),
		});
	}

	non_empty(cookies, &signed_request_cookie_name(client_id))
		.map(|token| RawSignedRequest { source: CredentialSource::Cookie, token: token.to_owned() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn parameter_takes_priority_over_cookie() {
		let params = map(&[("signed_request", "from-param")]);
		let cookies = map(&[("fbsr_123", "from-cookie")]);
		let raw = resolve_raw_token(&params, &cookies, "123").expect("Token should resolve.");

		assert_eq!(raw.source, CredentialSource::RequestParameter);
		assert_eq!(raw.token, "from-param");
	}

	#[test]
	fn cookie_is_keyed_by_client_id() {
		let cookies = map(&[("fbsr_999", "other-app"), ("fbsr_123", "ours")]);
		let raw = resolve_raw_token(&BTreeMap::new(), &cookies, "123")
			.expect("Cookie token should resolve.");

		assert_eq!(raw.source, CredentialSource::Cookie);
		assert_eq!(raw.token, "ours");
		assert!(resolve_raw_token(&BTreeMap::new(), &cookies, "456").is_none());
	}

	#[test]
	fn empty_parameter_falls_through_to_cookie() {
		let params = map(&[("signed_request", "")]);
		let cookies = map(&[("fbsr_123", "ours")]);
		let raw = resolve_raw_token(&params, &cookies, "123").expect("Cookie token should resolve.");

		assert_eq!(raw.source, CredentialSource::Cookie);
		assert!(resolve_raw_token(&params, &BTreeMap::new(), "123").is_none());
	}

	#[test]
	fn debug_redacts_token() {
		let raw = RawSignedRequest { source: CredentialSource::Cookie, token: "secret".into() };

		assert!(!format!("{raw:?}").contains("secret"));
	}
}
