use async_trait::async_trait;
use httpclient::{Client, InMemoryError, InMemoryResponseExt};
use tracing::debug;

use crate::error::{Error, Result};

/// Sends the refresh request and returns the raw response body.
#[async_trait]
pub trait TokenTransport: Send + Sync {
    /// `POST url` with no body.
    async fn post(&self, url: &str) -> Result<String>;
}

/// [`TokenTransport`] over `httpclient`.
///
/// A non-success status means the endpoint answered but refused the exchange; it
/// surfaces as [`Error::Protocol`] carrying the response body. Only transport
/// failures become [`Error::Network`].
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenTransport for HttpTransport {
    async fn post(&self, url: &str) -> Result<String> {
        match self.client.post(url).await {
            Ok(res) => Ok(res.text()?),
            Err(InMemoryError::HttpError(res)) => {
                debug!(status = %res.status(), "Token endpoint rejected the exchange");
                Err(Error::Protocol { body: res.text()? })
            }
            Err(e) => Err(httpclient::Error::from(e).into()),
        }
    }
}
