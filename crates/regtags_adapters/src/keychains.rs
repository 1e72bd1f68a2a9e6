use std::sync::Arc;

use regtags_core::config::RegistrySettings;
use regtags_core::keychain::MultiKeychain;
use tracing::debug;

use crate::credentials::KeyringKeychain;
use crate::docker_config::DockerConfigKeychain;

/// The keychain a lister resolves credentials with, as enabled in settings.
///
/// The Docker config is consulted before the OS keyring.
pub fn from_settings(settings: &RegistrySettings) -> MultiKeychain {
    let mut keychain = MultiKeychain::default();

    if settings.use_docker_config {
        let docker = match &settings.docker_config_path {
            Some(path) => DockerConfigKeychain::with_path(path),
            None => DockerConfigKeychain::new(),
        };
        debug!(path = ?docker.config_path(), "using Docker config credentials");
        keychain.push(Arc::new(docker));
    }

    if settings.use_keyring {
        debug!("using OS keyring credentials");
        keychain.push(Arc::new(KeyringKeychain::new()));
    }

    keychain
}
