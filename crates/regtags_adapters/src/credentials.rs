use async_trait::async_trait;
use keyring::Entry;
use regtags_core::entities::{Authenticator, Registry};
use regtags_core::ports::Keychain;
use regtags_core::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SERVICE_NAME: &str = "regtags";

/// What is stored in the keyring for one registry
#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    username: String,
    password: String,
}

/// Registry credentials kept in the OS keyring, one entry per registry host
pub struct KeyringKeychain {
    service: String,
}

impl KeyringKeychain {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn get_entry(&self, registry: &Registry) -> Result<Entry, Error> {
        Entry::new(&self.service, registry.as_str())
            .map_err(|e| Error::CredentialStorage(format!("failed to create keyring entry: {}", e)))
    }

    #[instrument(skip(self, password))]
    pub async fn store(
        &self,
        registry: &Registry,
        username: &str,
        password: &str,
    ) -> Result<(), Error> {
        let entry = self.get_entry(registry)?;
        let json = serde_json::to_string(&StoredCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
        .map_err(|e| Error::CredentialStorage(format!("failed to serialize credentials: {}", e)))?;

        // Keyring calls block
        tokio::task::spawn_blocking(move || {
            entry
                .set_password(&json)
                .map_err(|e| Error::CredentialStorage(format!("failed to store credentials: {}", e)))
        })
        .await
        .map_err(|e| Error::CredentialStorage(format!("task join error: {}", e)))?
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, registry: &Registry) -> Result<(), Error> {
        let entry = self.get_entry(registry)?;

        tokio::task::spawn_blocking(move || {
            match entry.delete_credential() {
                Ok(()) => Ok(()),
                Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
                Err(e) => Err(Error::CredentialStorage(format!(
                    "failed to delete credentials: {}",
                    e
                ))),
            }
        })
        .await
        .map_err(|e| Error::CredentialStorage(format!("task join error: {}", e)))?
    }
}

impl Default for KeyringKeychain {
    fn default() -> Self {
        Self::new()
    }
}

fn resolution_error(action: &str, e: keyring::Error) -> Error {
    Error::Keychain(format!("{}: {}", action, e))
}

fn decode_stored(registry: &Registry, json: &str) -> Result<Authenticator, Error> {
    let stored: StoredCredentials = serde_json::from_str(json).map_err(|e| {
        Error::Keychain(format!("malformed keyring entry for {}: {}", registry, e))
    })?;
    Ok(Authenticator::Basic {
        username: stored.username,
        password: stored.password,
    })
}

#[async_trait]
impl Keychain for KeyringKeychain {
    #[instrument(skip(self))]
    async fn resolve(&self, registry: &Registry) -> Result<Authenticator, Error> {
        let entry = Entry::new(&self.service, registry.as_str())
            .map_err(|e| resolution_error("failed to create keyring entry", e))?;

        let stored = tokio::task::spawn_blocking(move || match entry.get_password() {
            Ok(json) => Ok(Some(json)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(resolution_error("failed to read keyring", e)),
        })
        .await
        .map_err(|e| Error::Keychain(format!("task join error: {}", e)))??;

        match stored {
            Some(json) => decode_stored(registry, &json),
            None => {
                debug!(%registry, "no keyring entry");
                Ok(Authenticator::Anonymous)
            }
        }
    }
}
