//! Provider descriptor data structures shared by all flows.
//!
//! A descriptor pins a provider's site, the authorize/token/profile endpoints resolved
//! against it, the client authentication method used at the token endpoint, the access token
//! placement options, and provider quirks.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessTokenOptions, ProviderId},
};

const RIODATAMINE_SITE: &str = "http://api.riodatamine.com.br";

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint users are redirected to during the request phase.
	pub authorization: Url,
	/// Token endpoint used for authorization-code exchanges.
	pub token: Url,
	/// Profile endpoint queried with the access token for `raw_info`.
	pub profile: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Base site that relative endpoint paths were resolved against.
	pub site: Url,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Options applied to every access token issued by the provider.
	pub access_token_options: AccessTokenOptions,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Descriptor for the Riodatamine API, which speaks the Facebook signed request dialect.
	pub fn riodatamine() -> Result<Self, ProviderDescriptorError> {
		let id = ProviderId::new("riodatamine")
			.map_err(|source| ProviderDescriptorError::InvalidId { source })?;
		let site = Url::parse(RIODATAMINE_SITE).map_err(|source| {
			ProviderDescriptorError::InvalidPath { path: RIODATAMINE_SITE.into(), source }
		})?;

		Self::builder(id)
			.site(site)
			.authorize_path("/oauth/authorize")
			.token_path("/oauth/access_token")
			.profile_path("/me")
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
			.access_token_options(AccessTokenOptions::default())
			.quirks(ProviderQuirks {
				token_response_format: TokenResponseFormat::FormUrlEncoded,
				..ProviderQuirks::default()
			})
			.build()
	}
}
