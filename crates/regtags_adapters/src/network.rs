//! Shared HTTP client configuration and the reqwest-backed transport.

use async_trait::async_trait;
use regtags_core::config::HttpSettings;
use regtags_core::entities::{HttpMethod, HttpRequest, HttpResponse};
use regtags_core::ports::RoundTripper;
use regtags_core::Error;
use reqwest::Client;
use tracing::{instrument, trace};

/// Build an HTTP client for registry requests.
///
/// Timeouts come from [`HttpSettings`]. Authorization is attached per request
/// by the lister; redirects keep reqwest's default policy.
pub fn build_registry_client(settings: &HttpSettings) -> Result<Client, Error> {
    Client::builder()
        .user_agent(&settings.user_agent)
        .timeout(settings.timeout())
        .connect_timeout(settings.connect_timeout())
        .build()
        .map_err(|e| Error::Network(format!("failed to create registry HTTP client: {}", e)))
}

/// [`RoundTripper`] over a `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &HttpSettings) -> Result<Self, Error> {
        Ok(Self::new(build_registry_client(settings)?))
    }
}

#[async_trait]
impl RoundTripper for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Head => self.client.head(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("request to {} failed: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response body: {}", e)))?
            .to_vec();

        trace!(status, bytes = body.len(), "registry response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
