//! Signed request parsing and verification.
//!
//! A signed request is the ASCII text `<signature>.<payload>` where both segments are
//! unpadded URL-safe base64. The payload is a JSON object whose `algorithm` claim must be
//! `HMAC-SHA256`, and the signature is the HMAC-SHA256 digest of the **encoded** payload
//! segment under the OAuth client secret.
//!
//! [`parse`] distinguishes three outcomes:
//!
//! - structurally invalid input (`MalformedEncoding`, `MalformedToken`) and a declared algorithm
//!   other than `HMAC-SHA256` (`UnsupportedAlgorithm`) are errors;
//! - a well-formed token whose signature does not verify yields `Ok(None)`, because forged or
//!   stale tokens are routine traffic;
//! - a verified token yields the [`SignedPayload`] claims.

pub mod codec;
pub mod signature;

// crates.io
use base64::DecodeError;
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// The only algorithm accepted in the `algorithm` claim.
pub const SIGNED_REQUEST_ALGORITHM: &str = "HMAC-SHA256";

/// Errors raised while decoding a signed request.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SignedRequestError {
	/// A segment is not valid base64.
	#[error("Signed request segment is not valid base64.")]
	MalformedEncoding(#[from] DecodeError),
	/// The token is not `<signature>.<payload>` or the payload is not a JSON object.
	#[error("Signed request is malformed: {reason}.")]
	MalformedToken {
		/// Description of the structural failure.
		reason: String,
	},
	/// The payload declares an algorithm other than `HMAC-SHA256`.
	#[error(
		"Signed request declares an unsupported algorithm: {}.",
		.algorithm.as_deref().unwrap_or("<none>")
	)]
	UnsupportedAlgorithm {
		/// Declared algorithm, or `None` when the claim is missing.
		algorithm: Option<String>,
	},
}
impl SignedRequestError {
	/// Returns `true` for structural failures that callers treat as "no signed request".
	pub fn is_malformed(&self) -> bool {
		matches!(self, Self::MalformedEncoding(_) | Self::MalformedToken { .. })
	}

	fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedToken { reason: reason.into() }
	}
}

/// Verified claims extracted from a signed request.
///
/// Values of this type only exist after signature verification succeeded.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedPayload(Map<String, Value>);
impl SignedPayload {
	/// Returns the raw claim value.
	pub fn claim(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Returns a claim when it is a non-empty string.
	pub fn str_claim(&self, name: &str) -> Option<&str> {
		self.0.get(name).and_then(Value::as_str).filter(|value| !value.is_empty())
	}

	/// Embedded access token (`oauth_token`), if present and non-empty.
	pub fn oauth_token(&self) -> Option<&str> {
		self.str_claim("oauth_token")
	}

	/// Embedded authorization code (`code`), if present and non-empty.
	pub fn code(&self) -> Option<&str> {
		self.str_claim("code")
	}

	/// Provider user identifier (`user_id`), accepting string or numeric claims.
	pub fn user_id(&self) -> Option<String> {
		match self.0.get("user_id")? {
			Value::String(id) if !id.is_empty() => Some(id.clone()),
			Value::Number(id) => Some(id.to_string()),
			_ => None,
		}
	}

	/// `issued_at` claim as a UNIX timestamp.
	pub fn issued_at(&self) -> Option<i64> {
		timestamp_claim(self.0.get("issued_at")?)
	}

	/// `expires` claim as a UNIX timestamp; `0` is reported as `None` (non-expiring).
	pub fn expires(&self) -> Option<i64> {
		timestamp_claim(self.0.get("expires")?).filter(|secs| *secs > 0)
	}

	/// Borrows the full claims map.
	pub fn claims(&self) -> &Map<String, Value> {
		&self.0
	}
}
impl Debug for SignedPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (key, value) in &self.0 {
			match key.as_str() {
				"oauth_token" | "code" => map.entry(key, &"<redacted>"),
				_ => map.entry(key, value),
			};
		}

		map.finish()
	}
}

/// Parses and verifies `token` with the client secret.
pub fn parse(token: &str, client_secret: &str) -> Result<Option<SignedPayload>, SignedRequestError> {
	let (encoded_signature, encoded_payload) = token
		.split_once('.')
		.filter(|(signature, payload)| !signature.is_empty() && !payload.is_empty())
		.ok_or_else(|| SignedRequestError::malformed("expected `<signature>.<payload>`"))?;
	let signature = codec::decode(encoded_signature)?;
	let payload = codec::decode(encoded_payload)?;
	let claims = match serde_json::from_slice::<Value>(&payload) {
		Ok(Value::Object(claims)) => claims,
		Ok(_) => return Err(SignedRequestError::malformed("payload is not a JSON object")),
		Err(e) => return Err(SignedRequestError::malformed(format!("payload is not JSON ({e})"))),
	};

	match claims.get("algorithm") {
		Some(Value::String(algorithm)) if algorithm == SIGNED_REQUEST_ALGORITHM => (),
		Some(Value::String(algorithm)) =>
			return Err(SignedRequestError::UnsupportedAlgorithm {
				algorithm: Some(algorithm.clone()),
			}),
		Some(other) =>
			return Err(SignedRequestError::UnsupportedAlgorithm {
				algorithm: Some(other.to_string()),
			}),
		None => return Err(SignedRequestError::UnsupportedAlgorithm { algorithm: None }),
	}

	if signature::verify(client_secret.as_bytes(), &signature, encoded_payload.as_bytes()) {
		Ok(Some(SignedPayload(claims)))
	} else {
		Ok(None)
	}
}

/// Serializes `claims` and signs them, producing `<signature>.<payload>` text.
///
/// The caller is responsible for including `"algorithm": "HMAC-SHA256"`.
pub fn sign(claims: &Map<String, Value>, client_secret: &str) -> String {
	// Serializing a map of JSON values cannot fail.
	let json = Value::Object(claims.clone()).to_string();
	let encoded_payload = codec::encode(json);
	let digest = signature::sign(client_secret.as_bytes(), encoded_payload.as_bytes());

	format!("{}.{encoded_payload}", codec::encode(digest))
}

fn timestamp_claim(value: &Value) -> Option<i64> {
	match value {
		Value::Number(number) => number.as_i64(),
		Value::String(text) => text.parse().ok(),
		_ => None,
	}
}
