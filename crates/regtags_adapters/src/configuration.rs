use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use regtags_core::config::Settings;

pub fn get_configuration_with_paths(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    let config_directory = current_dir_path.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|p| p.join("config"))
            .unwrap_or_else(|_| PathBuf::from("config"))
    });

    let system_config_dir = if let Some(path) = system_config_dir_path {
        path
    } else {
        ProjectDirs::from("dev", "regtags", "regtags")
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config"))
    };

    let defaults = Settings::default();

    let settings = Config::builder()
        .set_default("registry.default_registry", defaults.registry.default_registry)?
        .set_default("registry.use_docker_config", defaults.registry.use_docker_config)?
        .set_default("registry.use_keyring", defaults.registry.use_keyring)?
        .set_default("http.user_agent", defaults.http.user_agent)?
        .set_default("http.timeout_secs", defaults.http.timeout_secs)?
        .set_default("http.connect_timeout_secs", defaults.http.connect_timeout_secs)?
        .set_default("log_level", defaults.log_level)?
        .add_source(File::from(system_config_dir.join("config.toml")).required(false))
        .add_source(File::from(config_directory.join("config.toml")).required(false))
        .add_source(Environment::with_prefix("REGTAGS").separator("__"))
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_with_paths(None, None)
}
