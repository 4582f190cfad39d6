use std::sync::Arc;

use tracing::{debug, info, warn};

pub use claims::{decode_claims, ClaimsError, DecodedClaims};
pub use config::{ConfigStore, JsonFileConfig, MemoryConfig, REFRESH_TOKEN_KEY, TOKEN_ENDPOINT_KEY};
pub use error::{Error, Result};
pub use exchange::{HttpTransport, TokenTransport};
pub use feed::is_feed_url;
pub use refresh::TokenResponse;
pub use schedule::{Reauthenticate, Scheduler, TokioScheduler};
pub use skew::{skew_wait, Clock, SystemClock};

mod claims;
mod config;
mod error;
mod exchange;
mod feed;
mod refresh;
mod schedule;
mod skew;

/// Environment variable through which build agents hand out a ready-made access token.
pub const CI_ACCESS_TOKEN_VAR: &str = "SYSTEM_ACCESSTOKEN";

/// The access token provisioned by the CI system, if any. Bypasses the refresh flow.
pub fn ci_access_token() -> Option<String> {
    ci_access_token_from(|name| std::env::var(name).ok())
}

/// Like [`ci_access_token`], reading variables through `lookup`.
pub fn ci_access_token_from(lookup: impl FnOnce(&str) -> Option<String>) -> Option<String> {
    lookup(CI_ACCESS_TOKEN_VAR).filter(|t| !t.is_empty())
}

/// Exchanges the stored refresh token for a fresh access token.
///
/// Every exchange rotates the refresh token: the one the endpoint returns is
/// written back to the [`ConfigStore`] before the access token is handed out.
/// Calls against the same store must be serialized by the caller.
pub struct TokenRefresher {
    store: Arc<dyn ConfigStore>,
    transport: Arc<dyn TokenTransport>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    on_expiry: Option<Arc<dyn Reauthenticate>>,
}

impl TokenRefresher {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            transport: Arc::new(HttpTransport::new()),
            scheduler: Arc::new(TokioScheduler),
            clock: Arc::new(SystemClock),
            on_expiry: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn TokenTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Hook run once a refreshed token expires, typically the whole login and
    /// configuration flow. Without one, `expires_in` is ignored.
    pub fn on_expiry(mut self, hook: Arc<dyn Reauthenticate>) -> Self {
        self.on_expiry = Some(hook);
        self
    }

    /// Store a refresh token obtained elsewhere, e.g. from an interactive login.
    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.store.set(REFRESH_TOKEN_KEY, token)
    }

    /// Get an access token for the feed.
    ///
    /// Fails with [`Error::Configuration`] if no token endpoint is configured, and
    /// with [`Error::Authorization`] if there is no stored refresh token. Neither
    /// case touches the network.
    ///
    /// If the token's not-before lies ahead of the local clock, this waits it out
    /// before returning. If the token's claims cannot be decoded, it returns
    /// immediately.
    ///
    /// Must be polled within a Tokio runtime: the skew wait uses `tokio::time`, and the
    /// default [`TokioScheduler`] spawns onto the current runtime.
    pub async fn user_auth_token(&self) -> Result<String> {
        let endpoint = config::non_empty(self.store.as_ref(), TOKEN_ENDPOINT_KEY)?
            .ok_or_else(|| Error::config("invalid config, missing tokenEndpoint"))?;
        let refresh_token = config::non_empty(self.store.as_ref(), REFRESH_TOKEN_KEY)?
            .ok_or(Error::Authorization { field: REFRESH_TOKEN_KEY })?;

        debug!(%endpoint, "Refreshing access token");
        let url = refresh::refresh_url(&endpoint, &refresh_token)?;
        let body = self.transport.post(&url).await?;
        let response = TokenResponse::parse(&body)?;

        if let Some(expires_in) = response.expires_in {
            match &self.on_expiry {
                Some(hook) => {
                    info!("Re-authenticate after {}s", expires_in.as_secs());
                    self.scheduler.schedule(expires_in, hook.clone());
                }
                None => debug!("No re-authentication hook, ignoring expires_in"),
            }
        }

        self.store.set(REFRESH_TOKEN_KEY, &response.refresh_token)?;

        let claims = match decode_claims(&response.access_token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!("Could not decode access token claims: {e}");
                None
            }
        };
        log_new_token(claims.as_ref());

        if let Some(wait) = skew_wait(claims.as_ref(), self.clock.now()) {
            info!("Waiting out clock skew of {} milliseconds", wait.as_millis());
            tokio::time::sleep(wait).await;
        }

        Ok(response.access_token)
    }
}

fn log_new_token(claims: Option<&DecodedClaims>) {
    const UNAVAILABLE: &str = "unavailable";
    let nbf = claims.and_then(|c| c.nbf).map(|v| v.to_string());
    let exp = claims.and_then(|c| c.exp).map(|v| v.to_string());
    let scope = claims.and_then(|c| c.scp.as_deref());
    info!(
        nbf = nbf.as_deref().unwrap_or(UNAVAILABLE),
        exp = exp.as_deref().unwrap_or(UNAVAILABLE),
        scope = scope.unwrap_or(UNAVAILABLE),
        "New token received"
    );
}
