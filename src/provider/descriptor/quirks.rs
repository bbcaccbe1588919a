// self
use crate::_prelude::*;

/// Encoding of successful token endpoint responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenResponseFormat {
	#[default]
	/// RFC 6749 JSON body.
	Json,
	/// `access_token=...&expires=...` form encoding; JSON bodies are still accepted.
	FormUrlEncoded,
}

/// Provider-specific quirks that influence how flows behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// How the token endpoint encodes successful responses.
	pub token_response_format: TokenResponseFormat,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { token_response_format: TokenResponseFormat::Json, scope_delimiter: ',' }
	}
}
