//! Session establishment with the streaming provider
//!
//! The provider handshake itself is opaque to the rest of the program: given
//! credentials we obtain a bearer token once at startup, and the resulting
//! [`AuthContext`] is passed by reference into every fetcher. No global
//! mutable state.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

/// OAuth scopes required by the saved-tracks and lyrics endpoints.
pub const SCOPES: &[&str] = &[
    "user-read-email",
    "playlist-read-private",
    "user-library-read",
    "user-follow-read",
];

const LOGIN_URL: &str = "https://accounts.spotify.com/api/token";

/// Established session: bearer token plus the shared HTTP client.
pub struct AuthContext {
    http: Client,
    token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl AuthContext {
    /// Log in with the configured credentials and obtain a bearer token for
    /// the scopes this tool needs.
    pub async fn establish(username: &str, password: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("spotiload/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let scopes = SCOPES.join(" ");
        let response = http
            .post(LOGIN_URL)
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
                ("scope", scopes.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach the login endpoint")?
            .error_for_status()
            .context("Login rejected by the provider")?;

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        Ok(Self {
            http,
            token: token.access_token,
        })
    }

    /// Build a context around an existing token.
    pub fn with_token(token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("spotiload/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            token: token.into(),
        })
    }

    pub fn bearer(&self) -> &str {
        &self.token
    }

    pub fn http(&self) -> &Client {
        &self.http
    }
}
