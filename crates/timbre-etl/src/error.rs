//! Error types for the feature provider boundary.

use thiserror::Error;

/// Errors that can occur while fetching track features.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider cannot be reached or refused our credentials.
    #[error("{source_name} unavailable: {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },

    /// No provider credentials were configured.
    #[error("no provider credentials configured (set provider.client_id and provider.client_secret)")]
    MissingCredentials,

    /// The provider has no data for this identifier.
    #[error("unknown track identifier: {id}")]
    UnknownIdentifier { id: String },

    /// The provider knows the track but part of the record is missing.
    #[error("incomplete record for {id}: no {what}")]
    Incomplete { id: String, what: String },

    /// An HTTP request returned an unexpected status.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The provider returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// A response could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the catalog layer.
    #[error("catalog error: {0}")]
    Catalog(#[from] timbre_core::Error),
}

impl ProviderError {
    /// Returns `true` when the error is transient and the request may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } => true,
            Self::Request(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` when the error means "no record for this
    /// identifier" rather than a failure of the provider as a whole.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Self::UnknownIdentifier { .. } | Self::Incomplete { .. } | Self::Parse { .. }
        )
    }

    /// Returns `true` when the whole provider is out of reach, so further
    /// requests in the same batch are pointless.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::MissingCredentials)
    }
}

/// Convenience alias for provider results.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
