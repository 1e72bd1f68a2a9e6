use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub http: HttpSettings,
    pub log_level: String,
}

/// Where credentials are discovered and which registry bare names resolve to.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistrySettings {
    pub default_registry: String,
    /// Overrides `$DOCKER_CONFIG` and `~/.docker/config.json`
    pub docker_config_path: Option<PathBuf>,
    pub use_docker_config: bool,
    pub use_keyring: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry: RegistrySettings::default(),
            http: HttpSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            default_registry: crate::entities::DEFAULT_REGISTRY.to_string(),
            docker_config_path: None,
            use_docker_config: true,
            use_keyring: false,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("regtags/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
