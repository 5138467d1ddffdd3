use thiserror::Error;

use crate::reshape::ReshapeError;

/// Errors surfaced by the providers and the transport underneath them.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request to {provider} failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned status {status}: {body}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {provider} response: {source}")]
    Parse {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} response is missing `{field}`")]
    MissingField {
        provider: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Reshape(#[from] ReshapeError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ServiceError {
    /// Whether the failure originated on the provider side (network, status or payload).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Upstream { .. }
                | Self::Parse { .. }
                | Self::MissingField { .. }
                | Self::Reshape(_)
        )
    }

    /// Whether the caller sent something the service refuses to forward.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }
}
