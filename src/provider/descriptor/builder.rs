// self
use crate::{
	_prelude::*,
	auth::{AccessTokenOptions, IdentifierError, ProviderId},
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Provider identifier failed validation.
	#[error("Provider identifier is invalid.")]
	InvalidId {
		/// Underlying validation failure.
		#[source]
		source: IdentifierError,
	},
	/// A relative endpoint path was supplied without a site to resolve it against.
	#[error("The {endpoint} endpoint is relative but no site was configured.")]
	MissingSite {
		/// Which endpoint could not be resolved.
		endpoint: &'static str,
	},
	/// An endpoint is neither configured explicitly nor derivable from a path.
	#[error("Missing {endpoint} endpoint.")]
	MissingEndpoint {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// A path could not be joined onto the site.
	#[error("Endpoint path `{path}` cannot be resolved.")]
	InvalidPath {
		/// Path or URL that failed to parse.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTP(S) and name a host.
	#[error("The {endpoint} endpoint must be an absolute http(s) URL: {url}.")]
	UnsupportedEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`ProviderDescriptor`] values.
///
/// Endpoints are taken from the explicit `*_endpoint` setters when present, otherwise the
/// matching `*_path` is joined onto the site.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Base site for relative endpoint paths.
	pub site: Option<Url>,
	/// Authorization endpoint path (defaults to `/oauth/authorize`).
	pub authorize_path: String,
	/// Token endpoint path (defaults to `/oauth/token`).
	pub token_path: String,
	/// Profile endpoint path (defaults to `/me`).
	pub profile_path: String,
	/// Explicit authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Explicit token endpoint.
	pub token_endpoint: Option<Url>,
	/// Explicit profile endpoint.
	pub profile_endpoint: Option<Url>,
	/// Preferred client authentication method for the token endpoint.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Access token placement options.
	pub access_token_options: AccessTokenOptions,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			site: None,
			authorize_path: "/oauth/authorize".into(),
			token_path: "/oauth/token".into(),
			profile_path: "/me".into(),
			authorization_endpoint: None,
			token_endpoint: None,
			profile_endpoint: None,
			preferred_client_auth_method: ClientAuthMethod::default(),
			access_token_options: AccessTokenOptions::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the base site.
	pub fn site(mut self, url: Url) -> Self {
		self.site = Some(url);

		self
	}

	/// Sets the authorization endpoint path relative to the site.
	pub fn authorize_path(mut self, path: impl Into<String>) -> Self {
		self.authorize_path = path.into();

		self
	}

	/// Sets the token endpoint path relative to the site.
	pub fn token_path(mut self, path: impl Into<String>) -> Self {
		self.token_path = path.into();

		self
	}

	/// Sets the profile endpoint path relative to the site.
	pub fn profile_path(mut self, path: impl Into<String>) -> Self {
		self.profile_path = path.into();

		self
	}

	/// Sets the authorization endpoint explicitly.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint explicitly.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the profile endpoint explicitly.
	pub fn profile_endpoint(mut self, url: Url) -> Self {
		self.profile_endpoint = Some(url);

		self
	}

	/// Overrides the preferred client authentication method.
	pub fn preferred_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.preferred_client_auth_method = method;

		self
	}

	/// Overrides the access token placement options.
	pub fn access_token_options(mut self, options: AccessTokenOptions) -> Self {
		self.access_token_options = options;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let site = self.site.as_ref();
		let authorization = resolve(
			"authorization",
			self.authorization_endpoint.clone(),
			site,
			&self.authorize_path,
		)?;
		let token = resolve("token", self.token_endpoint.clone(), site, &self.token_path)?;
		let profile = resolve("profile", self.profile_endpoint.clone(), site, &self.profile_path)?;
		let site = match self.site {
			Some(site) => site,
			None => origin_of(&authorization),
		};
		let descriptor = ProviderDescriptor {
			id: self.id,
			site,
			endpoints: ProviderEndpoints { authorization, token, profile },
			preferred_client_auth_method: self.preferred_client_auth_method,
			access_token_options: self.access_token_options,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("site", &self.site)?;
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("profile", &self.endpoints.profile)?;
		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		Ok(())
	}
}

fn resolve(
	endpoint: &'static str,
	explicit: Option<Url>,
	site: Option<&Url>,
	path: &str,
) -> Result<Url, ProviderDescriptorError> {
	if let Some(url) = explicit {
		return Ok(url);
	}
	if path.is_empty() {
		return Err(ProviderDescriptorError::MissingEndpoint { endpoint });
	}

	let site = site.ok_or(ProviderDescriptorError::MissingSite { endpoint })?;

	site.join(path)
		.map_err(|source| ProviderDescriptorError::InvalidPath { path: path.to_owned(), source })
}

fn origin_of(url: &Url) -> Url {
	let mut origin = url.clone();

	origin.set_path("/");
	origin.set_query(None);
	origin.set_fragment(None);

	origin
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if matches!(url.scheme(), "http" | "https") && url.has_host() {
		Ok(())
	} else {
		Err(ProviderDescriptorError::UnsupportedEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderDescriptorError> {
	if delimiter.is_control() {
		Err(ProviderDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
