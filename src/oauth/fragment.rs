//! Token extraction from an implicit-grant redirect.
//!
//! The authorization server does not return the token in a response body. It redirects
//! to a URL whose fragment holds the token as form-encoded fields:
//!
//! ```text
//! https://oauth.example.com/oauth/token/implicit#access_token=sha256~abc&token_type=Bearer&expires_in=86400
//! ```

use crate::core::{OcAuthError, Result};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// An access token read from a redirect fragment.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// The bearer token written to the kubeconfig
    pub access_token: String,
    /// Usually `Bearer`
    pub token_type: Option<String>,
    /// Lifetime in seconds, when the server states it
    pub expires_in: Option<u64>,
    /// Every field of the fragment, as received
    pub raw_fragment_fields: BTreeMap<String, String>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Parse the fragment of `url` as a query string and pull the token out of it.
///
/// When `expected_state` is given and the fragment echoes a `state`, the two must match.
///
/// # Errors
///
/// [`OcAuthError::AuthenticationError`] when the URL has no fragment, the fragment
/// reports an OAuth `error`, the state does not match, or `access_token` is missing.
pub fn token_from_fragment(url: &Url, expected_state: Option<&str>) -> Result<Token> {
    let fragment = url.fragment().filter(|fragment| !fragment.is_empty()).ok_or_else(|| {
        auth_error(format!("redirect to {} carries no URL fragment", redacted(url)))
    })?;

    let fields: BTreeMap<String, String> =
        url::form_urlencoded::parse(fragment.as_bytes()).into_owned().collect();

    if let Some(error) = fields.get("error") {
        let description = fields.get("error_description").map_or("", String::as_str);
        return Err(auth_error(format!("server returned '{error}' {description}").trim_end().into()));
    }

    if let (Some(expected), Some(received)) = (expected_state, fields.get("state")) {
        if expected != received {
            return Err(auth_error("state in redirect does not match the request".to_string()));
        }
    }

    let access_token = fields
        .get("access_token")
        .filter(|token| !token.is_empty())
        .cloned()
        .ok_or_else(|| auth_error("redirect fragment has no access_token".to_string()))?;

    Ok(Token {
        access_token,
        token_type: fields.get("token_type").cloned(),
        expires_in: fields.get("expires_in").and_then(|value| value.parse().ok()),
        raw_fragment_fields: fields,
    })
}

/// `url` without its fragment, safe to log.
pub(crate) fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.set_query(None);
    url.to_string()
}

fn auth_error(reason: String) -> OcAuthError {
    OcAuthError::AuthenticationError {
        reason,
    }
}
