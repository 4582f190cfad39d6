use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The local setup cannot be used, e.g. no token endpoint is configured.
    #[error("{0}")]
    Configuration(String),

    /// Credential material is missing; the user needs to log in again.
    #[error("missing {field}")]
    Authorization { field: &'static str },

    /// The endpoint answered, but not with a usable token response.
    #[error("malformed response body:\n{body}")]
    Protocol { body: String },

    #[error("token request failed: {0}")]
    Network(#[from] httpclient::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::Authorization { .. })
    }

    /// The raw response body, for protocol errors.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Protocol { body } => Some(body),
            _ => None,
        }
    }
}
