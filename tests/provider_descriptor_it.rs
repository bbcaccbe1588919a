// self
use oauth2_signed_request::{
	_preludet::*,
	auth::{AccessTokenOptions, ProviderId, TokenPlacement},
	provider::{
		ClientAuthMethod, DefaultProviderStrategy, Endpoint, ProviderDescriptor,
		ProviderDescriptorBuilder, ProviderDescriptorError, ProviderErrorContext,
		ProviderErrorKind, ProviderQuirks, ProviderStrategy, TokenResponseFormat,
	},
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock provider URL.")
}

fn builder(id: &str) -> ProviderDescriptorBuilder {
	let provider_id =
		ProviderId::new(id).expect("Failed to build provider identifier for mock descriptor.");

	ProviderDescriptor::builder(provider_id)
}

#[test]
fn riodatamine_preset_matches_provider_contract() {
	let descriptor = ProviderDescriptor::riodatamine().expect("Preset descriptor should build.");

	assert_eq!(descriptor.id.as_ref(), "riodatamine");
	assert_eq!(descriptor.site.as_str(), "http://api.riodatamine.com.br/");
	assert_eq!(
		descriptor.endpoints.authorization.as_str(),
		"http://api.riodatamine.com.br/oauth/authorize"
	);
	assert_eq!(descriptor.endpoints.token.as_str(), "http://api.riodatamine.com.br/oauth/access_token");
	assert_eq!(descriptor.endpoints.profile.as_str(), "http://api.riodatamine.com.br/me");
	assert_eq!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost);
	assert_eq!(descriptor.quirks.token_response_format, TokenResponseFormat::FormUrlEncoded);
	assert_eq!(descriptor.access_token_options.header_format, "OAuth %s");
	assert_eq!(descriptor.access_token_options.param_name, "access_token");
	assert_eq!(descriptor.access_token_options.mode, TokenPlacement::Header);
}

#[test]
fn explicit_endpoints_override_site_paths() {
	let descriptor = builder("mixed")
		.site(url("https://graph.example.com/v2/"))
		.token_endpoint(url("https://auth.example.com/token"))
		.profile_path("me")
		.build()
		.expect("Descriptor builder should accept mixed endpoints.");

	assert_eq!(descriptor.endpoints.authorization.as_str(), "https://graph.example.com/oauth/authorize");
	assert_eq!(descriptor.endpoints.token.as_str(), "https://auth.example.com/token");
	assert_eq!(descriptor.endpoints.profile.as_str(), "https://graph.example.com/v2/me");
	assert_eq!(descriptor.quirks.scope_delimiter, ',');
}

#[test]
fn site_defaults_to_authorization_origin() {
	let descriptor = builder("no-site")
		.authorization_endpoint(url("https://www.example.com/dialog/oauth?x=1"))
		.token_endpoint(url("https://graph.example.com/oauth/access_token"))
		.profile_endpoint(url("https://graph.example.com/me"))
		.build()
		.expect("Descriptor builder should derive the site.");

	assert_eq!(descriptor.site.as_str(), "https://www.example.com/");
}

#[test]
fn descriptor_rejects_unresolvable_or_unsupported_endpoints() {
	let err = builder("relative")
		.build()
		.expect_err("Relative paths need a site to resolve against.");

	assert!(matches!(err, ProviderDescriptorError::MissingSite { endpoint: "authorization" }));

	let err = builder("ftp")
		.site(url("ftp://files.example.com"))
		.build()
		.expect_err("Non-HTTP endpoints must be rejected.");

	assert!(matches!(err, ProviderDescriptorError::UnsupportedEndpoint { endpoint: "site", .. }));

	let err = builder("empty-path")
		.site(url("https://example.com"))
		.profile_path("")
		.build()
		.expect_err("Empty paths must be rejected.");

	assert!(matches!(err, ProviderDescriptorError::MissingEndpoint { endpoint: "profile" }));
}

#[test]
fn scope_delimiter_must_be_printable() {
	let err = builder("delimiter")
		.site(url("https://example.com"))
		.quirks(ProviderQuirks { scope_delimiter: '\n', ..ProviderQuirks::default() })
		.build()
		.expect_err("Control characters are not valid delimiters.");

	assert!(matches!(err, ProviderDescriptorError::InvalidScopeDelimiter { delimiter: '\n' }));
}

#[test]
fn descriptors_round_trip_through_serde() {
	let descriptor = builder("serde")
		.site(url("https://example.com"))
		.access_token_options(AccessTokenOptions {
			mode: TokenPlacement::Query,
			..AccessTokenOptions::default()
		})
		.build()
		.expect("Descriptor should build.");
	let json = serde_json::to_string(&descriptor).expect("Descriptor should serialize.");
	let decoded: ProviderDescriptor =
		serde_json::from_str(&json).expect("Descriptor should deserialize.");

	assert_eq!(decoded, descriptor);
	assert!(
		serde_json::from_str::<ProviderDescriptor>(&json.replace("\"serde\"", "\"bad id\""))
			.is_err(),
		"Identifier validation must run during deserialization."
	);
}

#[test]
fn default_strategy_classifies_graph_errors() {
	let strategy = DefaultProviderStrategy;
	let ctx = ProviderErrorContext::from_response(
		Endpoint::Token,
		400,
		br#"{"error":{"type":"OAuthException","message":"This authorization code has been used."}}"#,
	);

	assert_eq!(strategy.classify_error(&ctx), ProviderErrorKind::InvalidGrant);

	let ctx = ProviderErrorContext::new(Endpoint::Profile)
		.with_http_status(500)
		.with_oauth_error("server_error");

	assert_eq!(strategy.classify_error(&ctx), ProviderErrorKind::Transient);
}
