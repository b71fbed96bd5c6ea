//! Implicit-grant client for OpenShift-style authorization servers.
//!
//! # Flow
//!
//! ```text
//! 1. Discovery
//!    GET {server}/.well-known/oauth-authorization-server
//!        -> issuer, authorization_endpoint, scopes_supported
//!
//! 2. Authorization (HTTP Basic credentials, redirects followed by hand)
//!    GET {authorization_endpoint}?response_type=token&client_id=openshift-challenging-client&scope=...&state=...
//!        -> 302 Location: {issuer}/oauth/token/implicit#access_token=...&token_type=Bearer
//!
//! 3. Token = fields of the first redirect fragment
//! ```
//!
//! # State machine
//!
//! `Unconfigured -> Discovered -> Authenticated`, with any failure moving to `Failed`.
//! `Authenticated` and `Failed` are terminal: a client performs one login.

use super::fragment::{Token, redacted, token_from_fragment};
use super::metadata::{OAuthServerMetadata, WELL_KNOWN_PATH};
use crate::core::{OcAuthError, Result};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LOCATION};
use reqwest::redirect::Policy;
use tracing::{debug, info, warn};
use url::Url;

/// Public client registered by OpenShift for non-browser logins.
pub const CLIENT_ID: &str = "openshift-challenging-client";

/// Longest response body quoted in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Redirects followed before the grant is abandoned.
const MAX_REDIRECTS: usize = 10;

/// Per-run settings of the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Validate server certificates. `false` accepts any certificate.
    pub verify_tls: bool,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            verify_tls: true,
            user_agent: concat!("oc-auth/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientSettings {
    /// Settings with certificate validation switched off when `insecure` is set.
    #[must_use]
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.verify_tls = !insecure;
        self
    }
}

/// Where the client is in the login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Nothing fetched yet
    Unconfigured,
    /// Server metadata fetched
    Discovered,
    /// Token obtained
    Authenticated,
    /// A step failed
    Failed,
}

impl ClientState {
    const fn is_terminal(self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed)
    }
}

/// OAuth2 implicit-grant client.
#[derive(Debug)]
pub struct ImplicitGrantClient {
    http: reqwest::Client,
    settings: ClientSettings,
    state: ClientState,
}

impl ImplicitGrantClient {
    /// Build a client for one login.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .redirect(Policy::none())
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| OcAuthError::Other {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            settings,
            state: ClientState::Unconfigured,
        })
    }

    /// Current position in the login sequence.
    #[must_use]
    pub const fn state(&self) -> ClientState {
        self.state
    }

    /// Settings this client was built with.
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Discover, then authenticate.
    ///
    /// # Errors
    ///
    /// See [`discover`](Self::discover) and [`authenticate`](Self::authenticate).
    pub async fn login(&mut self, server: &str, username: &str, password: &str) -> Result<Token> {
        let metadata = self.discover(server).await?;
        self.authenticate(&metadata, username, password).await
    }

    /// Fetch the authorization server metadata of `server`.
    ///
    /// # Errors
    ///
    /// [`OcAuthError::DiscoveryError`] on transport failures, non-2xx responses and
    /// malformed documents.
    pub async fn discover(&mut self, server: &str) -> Result<OAuthServerMetadata> {
        self.ensure_not_terminal()?;

        let url = format!("{}{WELL_KNOWN_PATH}", server.trim_end_matches('/'));
        let discovery_error = |reason: String| OcAuthError::DiscoveryError {
            url: url.clone(),
            reason,
        };

        self.warn_if_insecure(&url);
        debug!("Fetching OAuth metadata from {url}");

        let result = async {
            let response =
                self.http.get(&url).send().await.map_err(|e| discovery_error(e.to_string()))?;
            let status = response.status();
            let body = response.text().await.map_err(|e| discovery_error(e.to_string()))?;

            if !status.is_success() {
                return Err(discovery_error(format!("HTTP {status}: {}", truncate(&body))));
            }

            serde_json::from_str::<OAuthServerMetadata>(&body)
                .map_err(|e| discovery_error(format!("malformed metadata: {e}")))
        }
        .await;

        match result {
            Ok(metadata) => {
                debug!("Authorization endpoint is {}", metadata.authorization_endpoint);
                self.state = ClientState::Discovered;
                Ok(metadata)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Build the implicit-grant authorization URL.
    ///
    /// Endpoints starting with `/` are appended to the issuer; other relative endpoints
    /// are resolved against it.
    ///
    /// # Errors
    ///
    /// [`OcAuthError::AuthenticationError`] if the issuer or endpoint is not a valid URL.
    pub fn authorization_url(metadata: &OAuthServerMetadata, state: &str) -> Result<Url> {
        let endpoint = metadata.authorization_endpoint.as_str();
        let invalid = |e: url::ParseError| OcAuthError::AuthenticationError {
            reason: format!("invalid authorization endpoint '{endpoint}': {e}"),
        };

        let mut url = match Url::parse(endpoint) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) if endpoint.starts_with('/') => {
                Url::parse(&format!("{}{endpoint}", metadata.issuer.trim_end_matches('/')))
                    .map_err(invalid)?
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&metadata.issuer).and_then(|base| base.join(endpoint)).map_err(invalid)?
            }
            Err(e) => return Err(invalid(e)),
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "token");
            query.append_pair("client_id", CLIENT_ID);
            if !metadata.scopes_supported.is_empty() {
                query.append_pair("scope", &metadata.scopes_supported.join(" "));
            }
            query.append_pair("state", state);
        }
        Ok(url)
    }

    /// Run the implicit grant with HTTP Basic credentials.
    ///
    /// Redirects are followed by hand so that the `Location` fragment survives. The
    /// first redirect target carrying a fragment ends the walk and its fragment holds
    /// the token; a 2xx response ends it otherwise.
    ///
    /// # Errors
    ///
    /// [`OcAuthError::AuthenticationError`] if a request fails, the final response is
    /// not 2xx, no redirect happened, the redirect chain is too long, or the fragment
    /// holds no token.
    pub async fn authenticate(
        &mut self,
        metadata: &OAuthServerMetadata,
        username: &str,
        password: &str,
    ) -> Result<Token> {
        self.ensure_not_terminal()?;

        let state = uuid::Uuid::new_v4().simple().to_string();
        let result = self.request_token(metadata, username, password, &state).await;

        match result {
            Ok(token) => {
                info!("Obtained access token for {username}");
                self.state = ClientState::Authenticated;
                Ok(token)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn request_token(
        &self,
        metadata: &OAuthServerMetadata,
        username: &str,
        password: &str,
        state: &str,
    ) -> Result<Token> {
        let auth_error = |reason: String| OcAuthError::AuthenticationError {
            reason,
        };

        let auth_url = Self::authorization_url(metadata, state)?;
        let endpoint = redacted(&auth_url);
        self.warn_if_insecure(&endpoint);
        debug!("Requesting implicit grant from {endpoint} as {username}");

        // Credentials go to the authorization endpoint only, never to redirect targets
        let mut response = self
            .http
            .get(auth_url.clone())
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| auth_error(format!("request to {endpoint} failed: {e}")))?;
        let mut current = auth_url;
        let mut hops = 0;

        loop {
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| {
                        auth_error(format!(
                            "HTTP {status} from {} has no usable Location header",
                            redacted(&current)
                        ))
                    })?;
                // Joining keeps the fragment of the Location value
                let next = current.join(location).map_err(|e| {
                    auth_error(format!("invalid redirect from {}: {e}", redacted(&current)))
                })?;
                hops += 1;
                debug!("Redirected to {}", redacted(&next));

                if next.fragment().is_some() {
                    return token_from_fragment(&next, Some(state));
                }
                if hops >= MAX_REDIRECTS {
                    return Err(auth_error(format!(
                        "more than {MAX_REDIRECTS} redirects starting at {endpoint}"
                    )));
                }

                self.warn_if_insecure(&redacted(&next));
                response = self
                    .http
                    .get(next.clone())
                    .send()
                    .await
                    .map_err(|e| auth_error(format!("request to {} failed: {e}", redacted(&next))))?;
                current = next;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(auth_error(format!(
                    "HTTP {status} from {}: {}",
                    redacted(&current),
                    truncate(&body)
                )));
            }

            if hops == 0 {
                return Err(auth_error(format!(
                    "{endpoint} answered without redirecting, so no token was issued"
                )));
            }

            return token_from_fragment(&current, Some(state));
        }
    }

    fn ensure_not_terminal(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(OcAuthError::AuthenticationError {
                reason: format!("client already finished ({:?})", self.state),
            });
        }
        Ok(())
    }

    fn fail(&mut self, error: OcAuthError) -> OcAuthError {
        self.state = ClientState::Failed;
        error
    }

    fn warn_if_insecure(&self, url: &str) {
        if !self.settings.verify_tls {
            warn!("TLS certificate verification is disabled for {url}");
        }
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metadata(issuer: &str, endpoint: &str) -> OAuthServerMetadata {
        OAuthServerMetadata {
            issuer: issuer.to_string(),
            authorization_endpoint: endpoint.to_string(),
            scopes_supported: vec!["user:full".to_string(), "user:info".to_string()],
        }
    }

    #[test]
    fn test_authorization_url_parameters() {
        let url = ImplicitGrantClient::authorization_url(
            &metadata("https://oauth.example.com", "https://oauth.example.com/oauth/authorize"),
            "s1",
        )
        .unwrap();

        assert_eq!(url.path(), "/oauth/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("response_type".to_string(), "token".to_string()),
                ("client_id".to_string(), CLIENT_ID.to_string()),
                ("scope".to_string(), "user:full user:info".to_string()),
                ("state".to_string(), "s1".to_string()),
            ]
        );
    }

    #[test]
    fn test_relative_endpoint_uses_issuer() {
        let url = ImplicitGrantClient::authorization_url(
            &metadata("https://oauth.example.com/prefix/", "/oauth/authorize"),
            "s",
        )
        .unwrap();
        assert_eq!(url.host_str(), Some("oauth.example.com"));
        assert_eq!(url.path(), "/prefix/oauth/authorize");

        let url = ImplicitGrantClient::authorization_url(
            &metadata("https://oauth.example.com/base/", "authorize"),
            "s",
        )
        .unwrap();
        assert_eq!(url.path(), "/base/authorize");
    }

    #[test]
    fn test_invalid_issuer_is_rejected() {
        let result = ImplicitGrantClient::authorization_url(&metadata("not a url", "/x"), "s");
        assert!(matches!(result, Err(OcAuthError::AuthenticationError { .. })));
    }

    #[test]
    fn test_no_scope_parameter_without_scopes() {
        let mut meta = metadata("https://x", "https://x/authorize");
        meta.scopes_supported.clear();
        let url = ImplicitGrantClient::authorization_url(&meta, "s").unwrap();
        assert!(url.query_pairs().all(|(key, _)| key != "scope"));
    }

    #[test]
    fn test_settings() {
        let settings = ClientSettings::default();
        assert!(settings.verify_tls);
        assert!(settings.user_agent.starts_with("oc-auth/"));
        assert!(!settings.with_insecure(true).verify_tls);
    }

    #[test]
    fn test_truncate_long_bodies() {
        let body = "x".repeat(MAX_ERROR_BODY + 10);
        let truncated = truncate(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.len(), MAX_ERROR_BODY + 3);
        assert_eq!(truncate("  short  "), "short");
    }
}
