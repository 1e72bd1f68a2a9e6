use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Registry that bare repository names resolve to
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

const DOCKER_HUB_ALIASES: &[&str] = &["docker.io", "registry-1.docker.io"];

/// A registry host, e.g. `gcr.io` or `localhost:5000`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Registry(String);

impl Registry {
    pub fn new(host: &str) -> Result<Self, Error> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(Error::InvalidReference(format!(
                "invalid registry host {:?}",
                host
            )));
        }

        let host = host.to_lowercase();
        if DOCKER_HUB_ALIASES.contains(&host.as_str()) {
            return Ok(Self(DEFAULT_REGISTRY.to_string()));
        }
        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_docker_hub(&self) -> bool {
        self.0 == DEFAULT_REGISTRY
    }

    /// Local registries are reached over plain HTTP
    pub fn scheme(&self) -> &'static str {
        let hostname = self.0.split(':').next().unwrap_or(&self.0);
        if hostname == "localhost"
            || hostname == "127.0.0.1"
            || hostname.ends_with(".local")
            || hostname.ends_with(".localhost")
        {
            "http"
        } else {
            "https"
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self(DEFAULT_REGISTRY.to_string())
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A repository within a registry (no tag, no digest)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub registry: Registry,
    pub path: String,
}

impl Repository {
    /// Parse `[host/]path`, falling back to [`DEFAULT_REGISTRY`] when no host is given.
    pub fn parse(reference: &str) -> Result<Self, Error> {
        Self::parse_with_default(reference, &Registry::default())
    }

    /// Parse `[host/]path`, falling back to `default_registry` when no host is given.
    ///
    /// The first component is treated as a host when it contains `.` or `:`
    /// or is `localhost`. Single-component names on Docker Hub get the
    /// `library/` namespace.
    pub fn parse_with_default(reference: &str, default_registry: &Registry) -> Result<Self, Error> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(Error::InvalidReference("empty reference".to_string()));
        }
        if reference.contains('@') {
            return Err(Error::InvalidReference(format!(
                "{}: digests are not allowed in a repository reference",
                reference
            )));
        }

        let (registry, path) = match reference.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Registry::new(first)?, rest)
            }
            _ => (default_registry.clone(), reference),
        };

        if path.contains(':') {
            return Err(Error::InvalidReference(format!(
                "{}: tags are not allowed in a repository reference",
                reference
            )));
        }
        validate_path(reference, path)?;

        let path = if registry.is_docker_hub() && !path.contains('/') {
            format!("library/{}", path)
        } else {
            path.to_string()
        };

        Ok(Self { registry, path })
    }
}

fn validate_path(reference: &str, path: &str) -> Result<(), Error> {
    let valid_chars = path
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-' | '/'));
    let valid_components = path.split('/').all(|component| !component.is_empty());

    if path.is_empty() || !valid_chars || !valid_components {
        return Err(Error::InvalidReference(format!(
            "{}: repository path must be lowercase alphanumerics separated by '/', '.', '_' or '-'",
            reference
        )));
    }
    Ok(())
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.path)
    }
}

/// Credential material attached to outgoing registry requests
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Authenticator {
    /// No credentials available
    #[default]
    Anonymous,
    Basic {
        username: String,
        password: String,
    },
    Bearer(String),
}

impl Authenticator {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Value for the `Authorization` header, if any
    pub fn authorization(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", encoded))
            }
            Self::Bearer(token) => Some(format!("Bearer {}", token)),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

impl fmt::Display for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Basic { username, .. } => write!(f, "basic ({})", username),
            Self::Bearer(_) => write!(f, "bearer token"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Head => write!(f, "HEAD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Replaces any existing header with the same name
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
