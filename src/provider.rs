//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering the provider site,
//! authorize/token/profile endpoints, client authentication preferences, access token
//! placement, and provider quirks (token response encoding, scope delimiter).
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook used by flows to map
//! token and profile endpoint failures into the crate error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
