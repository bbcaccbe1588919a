//! Provider identifiers.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const PROVIDER_ID_MAX_LEN: usize = 64;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Provider identifier cannot be empty.")]
	Empty,
	/// The identifier contains a character that is not allowed in a URL path segment.
	#[error("Provider identifier contains an invalid character: {ch:?}.")]
	InvalidCharacter {
		/// Offending character.
		ch: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("Provider identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Name of an OAuth provider, used verbatim as the default callback path segment
/// (`/auth/<provider>/callback`).
///
/// Only ASCII letters, digits, `-` and `_` are accepted.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);
impl ProviderId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ProviderId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ProviderId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ProviderId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ProviderId> for String {
	fn from(value: ProviderId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ProviderId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for ProviderId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Provider({})", self.0)
	}
}
impl Display for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if let Some(ch) = view.chars().find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
	{
		return Err(IdentifierError::InvalidCharacter { ch });
	}
	if view.len() > PROVIDER_ID_MAX_LEN {
		return Err(IdentifierError::TooLong { max: PROVIDER_ID_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_must_be_path_safe() {
		let id = ProviderId::new("riodatamine").expect("Plain identifier should be valid.");

		assert_eq!(id.as_ref(), "riodatamine");
		assert_eq!(ProviderId::new(""), Err(IdentifierError::Empty));
		assert_eq!(ProviderId::new("a/b"), Err(IdentifierError::InvalidCharacter { ch: '/' }));
		assert!(ProviderId::new("with space").is_err());
		assert!(ProviderId::new("a".repeat(PROVIDER_ID_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let id: ProviderId =
			serde_json::from_str("\"facebook\"").expect("Identifier should deserialize.");

		assert_eq!(&*id, "facebook");
		assert_eq!(serde_json::to_string(&id).expect("Identifier should serialize."), "\"facebook\"");
		assert!(serde_json::from_str::<ProviderId>("\"face book\"").is_err());
	}
}
