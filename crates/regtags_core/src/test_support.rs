//! Port doubles shared by unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::entities::{Authenticator, HttpRequest, HttpResponse, Registry};
use crate::error::Error;
use crate::ports::{Keychain, RoundTripper, WarningSink};

/// Echoes the request back: status 200, request headers as response headers,
/// body is the transport name.
pub struct StubTransport {
    pub name: &'static str,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(name: &'static str) -> Arc<dyn RoundTripper> {
        Arc::new(Self::new(name))
    }
}

#[async_trait]
impl RoundTripper for StubTransport {
    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let headers = request.headers.clone();
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: 200,
            headers,
            body: self.name.as_bytes().to_vec(),
        })
    }
}

pub struct StaticKeychain(pub Authenticator);

impl StaticKeychain {
    pub fn arc(auth: Authenticator) -> Arc<Self> {
        Arc::new(Self(auth))
    }
}

#[async_trait]
impl Keychain for StaticKeychain {
    async fn resolve(&self, _registry: &Registry) -> Result<Authenticator, Error> {
        Ok(self.0.clone())
    }
}

pub struct FailingKeychain(pub &'static str);

impl FailingKeychain {
    pub fn arc(message: &'static str) -> Arc<Self> {
        Arc::new(Self(message))
    }
}

#[async_trait]
impl Keychain for FailingKeychain {
    async fn resolve(&self, _registry: &Registry) -> Result<Authenticator, Error> {
        Err(Error::Keychain(self.0.to_string()))
    }
}

/// Records every resolution it is asked for
pub struct CountingKeychain {
    pub auth: Authenticator,
    pub calls: AtomicUsize,
    pub registries: Mutex<Vec<Registry>>,
}

impl CountingKeychain {
    pub fn arc(auth: Authenticator) -> Arc<Self> {
        Arc::new(Self {
            auth,
            calls: AtomicUsize::new(0),
            registries: Mutex::new(Vec::new()),
        })
    }

    pub fn last_registry(&self) -> Option<Registry> {
        self.registries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Keychain for CountingKeychain {
    async fn resolve(&self, registry: &Registry) -> Result<Authenticator, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.registries.lock().unwrap().push(registry.clone());
        Ok(self.auth.clone())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl WarningSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
