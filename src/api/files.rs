//! The two OAuth files kept in `.secrets/`.
//!
//! Both are produced outside of the ledger: `client_secret.json` is the client registration
//! downloaded from the Google Cloud Console and `token.json` comes out of the consent flow. The
//! ledger only reads them, and writes the token back after a refresh.

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use crate::utils;
use anyhow::{ensure, Context};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A token this close to its expiry is refreshed before use.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// A JSON value paired with the file it was read from.
#[derive(Debug, Clone)]
pub(super) struct Stored<T> {
    path: PathBuf,
    value: T,
}

impl<T> Stored<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(super) async fn read(path: impl Into<PathBuf>) -> Res<Self> {
        let path = path.into();
        let value = utils::deserialize(&path).await?;
        Ok(Self { path, value })
    }

    /// Writes the value back, readable by the owner only.
    pub(super) async fn persist(&self) -> Res<()> {
        let json = serde_json::to_string_pretty(&self.value)
            .with_context(|| format!("Unable to serialize {}", self.path.display()))?;
        utils::write(&self.path, json).await?;
        utils::restrict_permissions(&self.path)
    }

    pub(super) fn get(&self) -> &T {
        &self.value
    }

    pub(super) fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// `client_secret.json`. Google wraps the client in `installed` for desktop clients and in `web`
/// for web clients, either works for a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct ClientSecret {
    #[serde(alias = "web")]
    installed: OAuthClient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OAuthClient {
    client_id: String,
    client_secret: String,
    #[serde(default = "google_token_uri")]
    token_uri: String,
}

fn google_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl ClientSecret {
    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

/// `token.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredToken {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_token: Option<String>,
}

impl StoredToken {
    /// Fails unless the token was granted every scope the ledger uses, naming the missing ones.
    pub(super) fn check_scopes(&self) -> Res<()> {
        let missing: Vec<&str> = OAUTH_SCOPES
            .iter()
            .copied()
            .filter(|scope| !self.scopes.iter().any(|granted| granted.as_str() == *scope))
            .collect();
        ensure!(
            missing.is_empty(),
            "The OAuth token lacks the scopes {}, redo the consent flow with them",
            missing.join(", ")
        );
        Ok(())
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub(super) fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::minutes(REFRESH_MARGIN_MINUTES)
    }

    /// Records the result of a refresh. Google usually keeps the refresh token, in which case
    /// `refresh_token` is `None`.
    pub(super) fn refreshed(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.access_token = access_token;
        self.expires_at = expires_at;
        if let Some(refresh_token) = refresh_token {
            self.refresh_token = refresh_token;
        }
    }
}
