use async_trait::async_trait;

use crate::entities::{Authenticator, HttpRequest, HttpResponse, Registry};
use crate::error::Error;

/// Performs a single HTTP round trip
#[async_trait]
pub trait RoundTripper: Send + Sync {
    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// Credential discovery for a registry host (Docker config, OS keyring, ...)
#[async_trait]
pub trait Keychain: Send + Sync {
    /// Resolve credentials for `registry`.
    ///
    /// Returns [`Authenticator::Anonymous`] when no credentials match; an
    /// error means the lookup itself failed.
    async fn resolve(&self, registry: &Registry) -> Result<Authenticator, Error>;
}

/// Receives non-fatal notices produced while configuring a lister
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Drops every notice
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardWarnings;

impl WarningSink for DiscardWarnings {
    fn warn(&self, _message: &str) {}
}
