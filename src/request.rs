//! Host request model plus signed request resolution and authorization mode classification.

pub mod mode;
pub mod source;

pub use mode::*;
pub use source::*;

// self
use crate::_prelude::*;

/// Parameter carrying a server-side signed request.
pub const SIGNED_REQUEST_PARAM: &str = "signed_request";
/// Parameter carrying an authorization code.
pub const CODE_PARAM: &str = "code";
/// Parameter carrying the opaque CSRF state.
pub const STATE_PARAM: &str = "state";

/// Inbound HTTP request as seen by the strategy.
///
/// The host middleware builds one value per request from its own request type. Query and
/// form parameters share the `params` map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthRequest {
	/// Absolute URL of the current request; its origin anchors the default callback URL.
	pub url: Url,
	/// Mount prefix of the application (`SCRIPT_NAME`), prepended to the callback path.
	pub script_name: String,
	/// Merged query and form parameters.
	pub params: BTreeMap<String, String>,
	/// Request cookies.
	pub cookies: BTreeMap<String, String>,
}
impl AuthRequest {
	/// Creates a request for `url`, seeding `params` from its query string.
	pub fn new(url: Url) -> Self {
		let params = url.query_pairs().into_owned().collect();

		Self { url, script_name: String::new(), params, cookies: BTreeMap::new() }
	}

	/// Sets the mount prefix.
	pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
		self.script_name = script_name.into();

		self
	}

	/// Adds or replaces a request parameter.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());

		self
	}

	/// Adds or replaces a cookie.
	pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.cookies.insert(name.into(), value.into());

		self
	}

	/// Returns a parameter when it is present and non-empty.
	pub fn param(&self, name: &str) -> Option<&str> {
		non_empty(&self.params, name)
	}

	/// Returns a cookie when it is present and non-empty.
	pub fn cookie(&self, name: &str) -> Option<&str> {
		non_empty(&self.cookies, name)
	}
}

pub(crate) fn non_empty<'a>(map: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
	map.get(name).map(String::as_str).filter(|value| !value.is_empty())
}
