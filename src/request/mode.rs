//! Authorization mode classification.

// self
use crate::{
	_prelude::*,
	request::{CODE_PARAM, non_empty},
	signed_request::SignedPayload,
};

/// How the callback phase obtains its access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthorizationMode {
	/// The verified signed request embeds an `oauth_token`; no exchange is needed.
	DirectToken,
	/// The verified signed request embeds a `code` to exchange with an empty redirect URI.
	CodeFromSignedPayload,
	/// The request carries a `code` parameter from the standard redirect.
	CodeFromRequest,
	/// Neither a code nor a token is available.
	Unavailable,
}
impl AuthorizationMode {
	/// Classifies the request.
	///
	/// An embedded token always wins. A `code` parameter beats a code embedded in the
	/// signed request, since a manual callback is more specific than an ambient cookie.
	pub fn classify(
		signed_payload: Option<&SignedPayload>,
		params: &BTreeMap<String, String>,
	) -> Self {
		if signed_payload.and_then(SignedPayload::oauth_token).is_some() {
			AuthorizationMode::DirectToken
		} else if non_empty(params, CODE_PARAM).is_some() {
			AuthorizationMode::CodeFromRequest
		} else if signed_payload.and_then(SignedPayload::code).is_some() {
			AuthorizationMode::CodeFromSignedPayload
		} else {
			AuthorizationMode::Unavailable
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthorizationMode::DirectToken => "direct_token",
			AuthorizationMode::CodeFromSignedPayload => "code_from_signed_payload",
			AuthorizationMode::CodeFromRequest => "code_from_request",
			AuthorizationMode::Unavailable => "unavailable",
		}
	}
}
impl Display for AuthorizationMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::{Value, json};
	// self
	use super::*;
	use crate::signed_request;

	const SECRET: &str = "53cr3tz";

	fn payload(claims: Value) -> SignedPayload {
		let Value::Object(claims) = claims else { panic!("Claims fixture must be an object.") };
		let token = signed_request::sign(&claims, SECRET);

		signed_request::parse(&token, SECRET)
			.expect("Fixture should parse.")
			.expect("Fixture should verify.")
	}

	fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn direct_token_beats_every_code() {
		let signed = payload(json!({
			"algorithm": "HMAC-SHA256",
			"oauth_token": "m4c0d3z",
			"code": "embedded",
		}));

		assert_eq!(
			AuthorizationMode::classify(Some(&signed), &params(&[("code", "ABC123")])),
			AuthorizationMode::DirectToken
		);
	}

	#[test]
	fn request_code_beats_embedded_code() {
		let signed = payload(json!({ "algorithm": "HMAC-SHA256", "code": "embedded" }));

		assert_eq!(
			AuthorizationMode::classify(Some(&signed), &params(&[("code", "ABC123")])),
			AuthorizationMode::CodeFromRequest
		);
		assert_eq!(
			AuthorizationMode::classify(Some(&signed), &params(&[])),
			AuthorizationMode::CodeFromSignedPayload
		);
	}

	#[test]
	fn empty_values_do_not_count() {
		let signed =
			payload(json!({ "algorithm": "HMAC-SHA256", "oauth_token": "", "code": "" }));

		assert_eq!(
			AuthorizationMode::classify(Some(&signed), &params(&[("code", "")])),
			AuthorizationMode::Unavailable
		);
		assert_eq!(AuthorizationMode::classify(None, &params(&[])), AuthorizationMode::Unavailable);
		assert_eq!(
			AuthorizationMode::classify(None, &params(&[("code", "ABC123")])),
			AuthorizationMode::CodeFromRequest
		);
	}
}
