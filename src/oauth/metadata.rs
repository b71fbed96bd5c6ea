//! Authorization server metadata (RFC 8414 discovery document).

use serde::{Deserialize, Serialize};

/// Path of the discovery document relative to the cluster server URL.
pub const WELL_KNOWN_PATH: &str = "/.well-known/oauth-authorization-server";

/// The subset of the discovery document the implicit grant needs.
///
/// Unknown fields (`token_endpoint`, `grant_types_supported`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthServerMetadata {
    /// Base URL of the authorization server; relative endpoints are resolved against it
    pub issuer: String,
    /// Where the authorization request is sent
    pub authorization_endpoint: String,
    /// Scopes requested, space-joined, in the authorization request
    #[serde(default)]
    pub scopes_supported: Vec<String>,
}
