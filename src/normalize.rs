//! Output normalization: recursive pruning plus the auth hash handed to the host.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::ProviderId};

/// Pruned identity fields (`name`).
pub type NormalizedIdentity = Map<String, Value>;
/// Pruned credential fields (`token`, `refresh_token`, `expires`, `expires_at`).
pub type NormalizedCredentials = Map<String, Value>;
/// Pruned extra metadata (`raw_info`).
pub type NormalizedExtra = Map<String, Value>;

/// Everything the host needs after a successful callback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthHash {
	/// Provider that authenticated the user.
	pub provider: ProviderId,
	/// Provider-scoped user identifier.
	pub uid: String,
	/// Identity fields.
	pub info: NormalizedIdentity,
	/// Credential fields.
	pub credentials: NormalizedCredentials,
	/// Raw profile and other extras.
	pub extra: NormalizedExtra,
}

/// Returns a copy of `map` without absent or empty values.
///
/// Nested maps are pruned first, so a map that only held empty values disappears as well.
/// Arrays are kept as-is unless empty.
pub fn prune(map: Map<String, Value>) -> Map<String, Value> {
	map.into_iter().filter_map(|(key, value)| prune_value(value).map(|value| (key, value))).collect()
}

fn prune_value(value: Value) -> Option<Value> {
	match value {
		Value::Null => None,
		Value::String(text) if text.is_empty() => None,
		Value::Array(items) if items.is_empty() => None,
		Value::Object(inner) => {
			let inner = prune(inner);

			(!inner.is_empty()).then_some(Value::Object(inner))
		},
		other => Some(other),
	}
}
