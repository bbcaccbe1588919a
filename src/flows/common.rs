//! Shared helpers for the request and callback phases (redirect targets, scope formatting,
//! scoped parameter injection, signed request verification).

// self
use crate::{
	_prelude::*,
	obs::{self, RejectionReason},
	request::RawSignedRequest,
	signed_request::{self, SignedPayload, SignedRequestError},
};

/// `redirect_uri` sent with an authorization-code exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectTarget {
	/// The callback URL the user was sent back to.
	Callback(Url),
	/// An explicitly empty `redirect_uri`, required for codes minted by the client-side SDK.
	Empty,
}

/// Joins scopes with the provider's delimiter when building requests.
pub(crate) fn format_scope<S>(scopes: &[S], delimiter: char) -> Option<String>
where
	S: AsRef<str>,
{
	let mut buf = String::new();

	for scope in scopes.iter().map(AsRef::as_ref).filter(|scope| !scope.is_empty()) {
		if !buf.is_empty() {
			buf.push(delimiter);
		}

		buf.push_str(scope);
	}

	if buf.is_empty() { None } else { Some(buf) }
}

/// Inserts a request parameter for as long as the guard lives.
///
/// Dropping the guard restores the previous value (or removes the parameter), so the
/// injection is undone on success, on error, on panic, and when the owning future is
/// cancelled.
pub(crate) struct InjectedParam<'a> {
	params: &'a Mutex<BTreeMap<String, String>>,
	name: &'static str,
	previous: Option<String>,
}
impl<'a> InjectedParam<'a> {
	pub(crate) fn new(
		params: &'a Mutex<BTreeMap<String, String>>,
		name: &'static str,
		value: impl Into<String>,
	) -> Self {
		let previous = params.lock().insert(name.to_owned(), value.into());

		Self { params, name, previous }
	}

	/// Current value of the injected parameter.
	pub(crate) fn value(&self) -> Option<String> {
		self.params.lock().get(self.name).cloned()
	}
}
impl Drop for InjectedParam<'_> {
	fn drop(&mut self) {
		let mut params = self.params.lock();

		match self.previous.take() {
			Some(previous) => {
				params.insert(self.name.to_owned(), previous);
			},
			None => {
				params.remove(self.name);
			},
		}
	}
}

/// Verifies a raw signed request, folding recoverable rejections into absence.
pub(crate) fn verify_raw(
	raw: &RawSignedRequest,
	client_secret: &str,
) -> Result<Option<SignedPayload>, SignedRequestError> {
	match signed_request::parse(&raw.token, client_secret) {
		Ok(Some(payload)) => Ok(Some(payload)),
		Ok(None) => {
			reject(raw, RejectionReason::SignatureMismatch, &"HMAC signature mismatch");

			Ok(None)
		},
		Err(err) if err.is_malformed() => {
			reject(raw, RejectionReason::Malformed, &err);

			Ok(None)
		},
		Err(err) => {
			reject(raw, RejectionReason::UnsupportedAlgorithm, &err);

			Err(err)
		},
	}
}

fn reject(raw: &RawSignedRequest, reason: RejectionReason, detail: &dyn Display) {
	obs::log_signed_request_rejection(raw.source, reason, detail);
	obs::record_signed_request_rejection(reason);
}
