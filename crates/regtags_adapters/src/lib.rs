pub mod configuration;
pub mod credentials;
pub mod docker_config;
pub mod keychains;
pub mod network;
pub mod telemetry;
pub mod warnings;

// Re-exports for convenience
pub use credentials::KeyringKeychain;
pub use docker_config::DockerConfigKeychain;
pub use network::ReqwestTransport;
pub use warnings::TracingWarningSink;
