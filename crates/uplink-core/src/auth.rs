//! One-shot authentication against the status server.
//!
//! Credentials are transient: built at invocation time, sent once, never
//! persisted. The key is redacted from `Debug` output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::USER_AGENT;
use crate::error::{ClientError, ClientResult};

/// A username/key pair supplied by the user for one authenticate call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    key: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    status: String,
}

/// Client for the `POST /auth` endpoint.
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Creates a new auth client for the given server base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Authenticates with the server.
    ///
    /// Resolves `true` iff the response status is a success and the body's
    /// `status` field is the literal `"success"`. Every failure path -
    /// non-success status, network error, unparseable body - collapses to
    /// `false` with a diagnostic on stderr. This method never returns an
    /// error to its caller.
    pub async fn authenticate(&self, credentials: &Credentials) -> bool {
        match self.try_authenticate(credentials).await {
            Ok(ok) => ok,
            Err(err) => {
                eprintln!("Authentication error: {err}");
                false
            }
        }
    }

    async fn try_authenticate(&self, credentials: &Credentials) -> ClientResult<bool> {
        let url = format!("{}/auth", self.base_url);
        let request = AuthRequest {
            username: &credentials.username,
            key: &credentials.key,
        };

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header("user-agent", USER_AGENT)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::network(format!("auth request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::http_status(status.as_u16(), &body));
        }

        let parsed: AuthResponse = response
            .json()
            .await
            .map_err(|e| ClientError::parse(format!("Failed to parse auth response: {e}")))?;
        Ok(parsed.status == "success")
    }
}
