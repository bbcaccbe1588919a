//! How an access token is attached to resource requests.

// self
use crate::_prelude::*;

/// Placement of the access token on resource requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPlacement {
	#[default]
	/// `Authorization` header rendered from [`AccessTokenOptions::header_format`].
	Header,
	/// Query parameter named [`AccessTokenOptions::param_name`].
	Query,
}

/// Static options applied to every access token issued by a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessTokenOptions {
	/// `Authorization` header template; `%s` is replaced by the token.
	pub header_format: String,
	/// Query parameter name used with [`TokenPlacement::Query`].
	pub param_name: String,
	/// Where the token goes on resource requests.
	pub mode: TokenPlacement,
}
impl AccessTokenOptions {
	/// Renders the `Authorization` header value for `token`.
	pub fn header_value(&self, token: &str) -> String {
		if self.header_format.contains("%s") {
			self.header_format.replacen("%s", token, 1)
		} else {
			format!("{} {token}", self.header_format.trim_end())
		}
	}
}
impl Default for AccessTokenOptions {
	fn default() -> Self {
		Self {
			header_format: "OAuth %s".into(),
			param_name: "access_token".into(),
			mode: TokenPlacement::Header,
		}
	}
}
