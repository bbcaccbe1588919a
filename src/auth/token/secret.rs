//! Redacting wrapper for access and refresh token strings.

// self
use crate::_prelude::*;

/// Token material that never shows up in `Debug` or `Display` output.
///
/// Signed request payloads and token responses both flow through [`crate::auth::AccessToken`],
/// which is routinely logged by hosts; this wrapper keeps the bearer value out of those logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token value; do not log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the provider handed back an empty string.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret(<{} bytes redacted>)", self.0.len())
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
