use std::sync::Arc;

use tracing::debug;

use crate::context::ListContext;
use crate::entities::{Authenticator, HttpRequest, HttpResponse, Repository};
use crate::error::Error;
use crate::options::{configure, ListerConfig, ListerOption};
use crate::ports::{RoundTripper, WarningSink};

/// Values every lister starts from before any option runs
#[derive(Clone)]
pub struct ListerDefaults {
    pub transport: Arc<dyn RoundTripper>,
    pub context: ListContext,
}

impl ListerDefaults {
    pub fn new(transport: Arc<dyn RoundTripper>) -> Self {
        Self {
            transport,
            context: ListContext::new(),
        }
    }

    pub fn with_context(mut self, context: ListContext) -> Self {
        self.context = context;
        self
    }
}

/// A fully configured lister for one repository.
///
/// Built from a [`ListerConfig`] that has been through [`configure`]; its
/// fields no longer change.
pub struct Lister {
    transport: Arc<dyn RoundTripper>,
    auth: Authenticator,
    context: ListContext,
    repository: Repository,
}

impl Lister {
    /// Seed a config from `defaults`, apply `options` in order, and freeze the result.
    pub async fn new<I>(
        repository: Repository,
        defaults: &ListerDefaults,
        options: I,
        sink: &dyn WarningSink,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = ListerOption>,
    {
        let mut config = ListerConfig::new(repository, defaults);
        configure(&mut config, options, sink).await?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: ListerConfig) -> Self {
        debug!(
            repository = %config.repository,
            auth = %config.auth,
            "lister configured"
        );
        Self {
            transport: config.transport,
            auth: config.auth,
            context: config.context,
            repository: config.repository,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    pub fn context(&self) -> &ListContext {
        &self.context
    }

    pub fn transport(&self) -> &Arc<dyn RoundTripper> {
        &self.transport
    }

    /// Tag listing endpoint of the repository
    pub fn tags_url(&self) -> String {
        format!(
            "{}://{}/v2/{}/tags/list",
            self.repository.registry.scheme(),
            self.repository.registry,
            self.repository.path
        )
    }

    /// Send `request` through the configured transport with credentials attached.
    ///
    /// Fails without touching the transport when the context is cancelled or
    /// past its deadline.
    pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        self.context.check()?;

        if let Some(authorization) = self.auth.authorization() {
            request.set_header("Authorization", authorization);
        }

        debug!(method = %request.method, url = %request.url, "sending registry request");
        tokio::select! {
            _ = self.context.token().cancelled() => Err(Error::Cancelled),
            response = self.round_trip_before_deadline(request) => response,
        }
    }

    async fn round_trip_before_deadline(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        match self.context.remaining() {
            Some(remaining) => {
                tokio::time::timeout(remaining, self.transport.round_trip(request))
                    .await
                    .map_err(|_| Error::DeadlineExceeded)?
            }
            None => self.transport.round_trip(request).await,
        }
    }
}
