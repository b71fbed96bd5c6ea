//! OAuth2 discovery and implicit-grant login against an OpenShift cluster.
//!
//! - [`metadata`] - the RFC 8414 discovery document
//! - [`client`] - the HTTP client and its login state machine
//! - [`fragment`] - reading the token out of the final redirect URL
//!
//! # Example
//!
//! ```rust,no_run
//! use oc_auth::oauth::{ClientSettings, ImplicitGrantClient};
//!
//! # async fn example() -> oc_auth::core::Result<()> {
//! let mut client = ImplicitGrantClient::new(ClientSettings::default())?;
//! let token = client.login("https://api.example.com:6443", "developer", "secret").await?;
//! println!("token type: {:?}", token.token_type);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod fragment;
pub mod metadata;


pub use client::{CLIENT_ID, ClientSettings, ClientState, ImplicitGrantClient};
pub use fragment::{Token, token_from_fragment};
pub use metadata::{OAuthServerMetadata, WELL_KNOWN_PATH};
