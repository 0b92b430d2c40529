//! Access token management for the Google Sheets API.
//!
//! The consent flow that produces `token.json` happens outside of this crate. Here we only load
//! the client secret and the token, and refresh the access token when it has expired.

use crate::api::files::{ClientSecret, Stored, StoredToken};
use crate::error::Res;
use anyhow::{anyhow, Context};
use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{ClientId, ClientSecret as OAuthClientSecret, RefreshToken, TokenResponse, TokenUrl};
use std::path::Path;
use tracing::{debug, info};

/// Used when the token endpoint does not say how long the new access token lives.
const DEFAULT_EXPIRY_SECONDS: i64 = 3600;

/// Holds the client secret and the token file, and hands out a valid access token.
#[derive(Debug, Clone)]
pub(crate) struct TokenProvider {
    secret: Stored<ClientSecret>,
    token: Stored<StoredToken>,
}

impl TokenProvider {
    /// Loads both credential files and checks that the token carries the required scopes.
    pub(crate) async fn load(
        client_secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Res<Self> {
        let secret = Stored::<ClientSecret>::read(client_secret_path.as_ref())
            .await
            .context("Unable to load the OAuth client secret file")?;
        let token = Stored::<StoredToken>::read(token_path.as_ref())
            .await
            .context("Unable to load the OAuth token file")?;
        token.get().check_scopes()?;
        Ok(Self { secret, token })
    }

    /// The current access token, which may have expired.
    pub(crate) fn token(&self) -> &str {
        self.token.get().access_token()
    }

    /// Returns the access token, refreshing it first if it has expired or is about to.
    pub(crate) async fn token_with_refresh(&mut self) -> Res<&str> {
        if self.token.get().needs_refresh(Utc::now()) {
            debug!("The access token has expired, refreshing");
            self.refresh().await?;
        }
        Ok(self.token())
    }

    /// Exchanges the refresh token for a new access token and saves it to the token file.
    pub(crate) async fn refresh(&mut self) -> Res<()> {
        let secret = self.secret.get();
        let client = BasicClient::new(ClientId::new(secret.client_id().to_string()))
            .set_client_secret(OAuthClientSecret::new(secret.client_secret().to_string()))
            .set_token_uri(
                TokenUrl::new(secret.token_uri().to_string())
                    .context("The token_uri in the client secret file is invalid")?,
            );

        let http_client = reqwest::ClientBuilder::new()
            // Following redirects opens the client to SSRF vulnerabilities
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Unable to build the HTTP client")?;

        let response = client
            .exchange_refresh_token(&RefreshToken::new(
                self.token.get().refresh_token().to_string(),
            ))
            .request_async(&http_client)
            .await
            .map_err(|e| anyhow!("Unable to refresh the access token: {e}"))?;

        let expires_in = match response.expires_in() {
            Some(duration) => chrono::Duration::from_std(duration)
                .context("The token expiry is out of range")?,
            None => chrono::Duration::seconds(DEFAULT_EXPIRY_SECONDS),
        };
        let expires_at = Utc::now() + expires_in;
        self.token.get_mut().refreshed(
            response.access_token().secret().to_string(),
            expires_at,
            response.refresh_token().map(|rt| rt.secret().to_string()),
        );
        self.token.persist().await?;
        info!("Refreshed the access token, valid until {expires_at}");
        Ok(())
    }
}
