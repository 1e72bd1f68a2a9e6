use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::entities::{Authenticator, Registry};
use crate::error::Error;
use crate::ports::Keychain;

/// Consults several keychains in order.
///
/// The first non-anonymous result wins. The first error stops the search and
/// is returned as is. Anonymous when no keychain has credentials.
#[derive(Clone, Default)]
pub struct MultiKeychain {
    keychains: Vec<Arc<dyn Keychain>>,
}

impl MultiKeychain {
    pub fn new(keychains: Vec<Arc<dyn Keychain>>) -> Self {
        Self { keychains }
    }

    pub fn push(&mut self, keychain: Arc<dyn Keychain>) {
        self.keychains.push(keychain);
    }

    pub fn len(&self) -> usize {
        self.keychains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keychains.is_empty()
    }
}

#[async_trait]
impl Keychain for MultiKeychain {
    async fn resolve(&self, registry: &Registry) -> Result<Authenticator, Error> {
        for (index, keychain) in self.keychains.iter().enumerate() {
            let auth = keychain.resolve(registry).await?;
            if !auth.is_anonymous() {
                debug!(%registry, keychain = index, "credentials found");
                return Ok(auth);
            }
        }
        Ok(Authenticator::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_support::{CountingKeychain, FailingKeychain, StaticKeychain};

    fn registry() -> Registry {
        Registry::new("ghcr.io").unwrap()
    }

    #[tokio::test]
    async fn test_empty_is_anonymous() {
        let keychain = MultiKeychain::default();
        assert!(keychain.is_empty());
        assert_eq!(
            keychain.resolve(&registry()).await.unwrap(),
            Authenticator::Anonymous
        );
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let later = CountingKeychain::arc(Authenticator::basic("later", "x"));
        let keychains: Vec<Arc<dyn Keychain>> = vec![
            StaticKeychain::arc(Authenticator::Anonymous),
            StaticKeychain::arc(Authenticator::basic("first", "y")),
            later.clone(),
        ];
        let keychain = MultiKeychain::new(keychains);

        let auth = keychain.resolve(&registry()).await.unwrap();

        assert_eq!(auth, Authenticator::basic("first", "y"));
        assert_eq!(later.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_anonymous() {
        let mut keychain = MultiKeychain::default();
        keychain.push(StaticKeychain::arc(Authenticator::Anonymous));
        keychain.push(StaticKeychain::arc(Authenticator::Anonymous));

        assert_eq!(keychain.len(), 2);
        assert!(keychain.resolve(&registry()).await.unwrap().is_anonymous());
    }

    #[tokio::test]
    async fn test_error_stops_search() {
        let later = CountingKeychain::arc(Authenticator::basic("later", "x"));
        let keychains: Vec<Arc<dyn Keychain>> =
            vec![FailingKeychain::arc("keyring locked"), later.clone()];
        let keychain = MultiKeychain::new(keychains);

        let result = keychain.resolve(&registry()).await;

        assert!(matches!(result, Err(Error::Keychain(ref msg)) if msg == "keyring locked"));
        assert_eq!(later.calls.load(Ordering::SeqCst), 0);
    }
}
