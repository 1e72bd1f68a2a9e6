//! Keychain backed by the Docker `config.json` credential file.
//!
//! Resolution order for the file: an explicit path, then
//! `$DOCKER_CONFIG/config.json`, then `~/.docker/config.json`. A missing file
//! simply has no credentials.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use directories::BaseDirs;
use regtags_core::entities::{Authenticator, Registry};
use regtags_core::ports::Keychain;
use regtags_core::Error;
use serde::Deserialize;
use tracing::{debug, instrument};

const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";
const CONFIG_FILE_NAME: &str = "config.json";
const DOCKER_HUB_LEGACY_KEY: &str = "https://index.docker.io/v1/";

#[derive(Debug, Default, Deserialize)]
struct DockerConfigFile {
    #[serde(default)]
    auths: BTreeMap<String, AuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    /// Base64-encoded "username:password"
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
    registrytoken: Option<String>,
}

impl DockerConfigFile {
    fn parse(contents: &str) -> Result<Self, Error> {
        serde_json::from_str(contents)
            .map_err(|e| Error::Keychain(format!("failed to parse Docker config: {}", e)))
    }

    /// Direct keys to try, most specific first
    fn candidate_keys(registry: &Registry) -> Vec<String> {
        let mut keys = vec![
            registry.as_str().to_string(),
            format!("https://{}", registry),
        ];
        if registry.is_docker_hub() {
            keys.push(DOCKER_HUB_LEGACY_KEY.to_string());
        }
        keys
    }

    /// Entries for `registry`: the direct keys in order, then any other key
    /// (URL with a path, `http://`, Docker Hub alias) that names the same host.
    fn entries<'a>(&'a self, registry: &'a Registry) -> impl Iterator<Item = &'a AuthEntry> + 'a {
        let keys = Self::candidate_keys(registry);
        let direct: Vec<&AuthEntry> = keys.iter().filter_map(|key| self.auths.get(key)).collect();
        let normalized = self
            .auths
            .iter()
            .filter(move |(key, _)| {
                !keys.contains(*key) && normalize_key(key).as_ref() == Some(registry)
            })
            .map(|(_, entry)| entry);
        direct.into_iter().chain(normalized)
    }

    /// First entry holding credentials wins; empty entries are skipped
    fn credentials(&self, registry: &Registry) -> Result<Authenticator, Error> {
        for entry in self.entries(registry) {
            let auth = entry.authenticator(registry)?;
            if !auth.is_anonymous() {
                return Ok(auth);
            }
        }
        Ok(Authenticator::Anonymous)
    }
}

impl AuthEntry {
    fn authenticator(&self, registry: &Registry) -> Result<Authenticator, Error> {
        if let Some(token) = non_empty(&self.registrytoken) {
            return Ok(Authenticator::Bearer(token.to_string()));
        }

        if let (Some(username), Some(password)) = (non_empty(&self.username), non_empty(&self.password)) {
            return Ok(Authenticator::basic(username, password));
        }

        if let Some(auth) = non_empty(&self.auth) {
            let (username, password) = decode_auth(auth).ok_or_else(|| {
                Error::Keychain(format!("malformed auth entry for {} in Docker config", registry))
            })?;
            return Ok(Authenticator::Basic { username, password });
        }

        Ok(Authenticator::Anonymous)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn normalize_key(key: &str) -> Option<Registry> {
    let host = key
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()?;
    Registry::new(host).ok()
}

/// Decode base64-encoded "username:password"
fn decode_auth(auth: &str) -> Option<(String, String)> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

pub struct DockerConfigKeychain {
    path: Option<PathBuf>,
}

impl DockerConfigKeychain {
    /// Use the default file location
    pub fn new() -> Self {
        Self { path: None }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        if let Some(dir) = std::env::var_os(DOCKER_CONFIG_ENV) {
            return Some(PathBuf::from(dir).join(CONFIG_FILE_NAME));
        }
        BaseDirs::new().map(|dirs| dirs.home_dir().join(".docker").join(CONFIG_FILE_NAME))
    }

    async fn load(path: &Path) -> Result<Option<DockerConfigFile>, Error> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => DockerConfigFile::parse(&contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Keychain(format!(
                "failed to read Docker config {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

impl Default for DockerConfigKeychain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Keychain for DockerConfigKeychain {
    #[instrument(skip(self))]
    async fn resolve(&self, registry: &Registry) -> Result<Authenticator, Error> {
        let Some(path) = self.config_path() else {
            debug!("cannot determine home directory, no Docker config");
            return Ok(Authenticator::Anonymous);
        };

        match Self::load(&path).await? {
            Some(config) => config.credentials(registry),
            None => {
                debug!(path = %path.display(), "Docker config not found");
                Ok(Authenticator::Anonymous)
            }
        }
    }
}
