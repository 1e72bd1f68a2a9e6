use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Directory the rolling log files are written to
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("dev", "regtags", "regtags")
        .map(|d| d.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber: stderr for humans, a daily file for later.
///
/// `RUST_LOG` overrides `env_filter`. Keep the returned guard alive for the
/// lifetime of the program or buffered file output is lost.
pub fn init_subscriber(name: &str, env_filter: &str) -> WorkerGuard {
    LogTracer::init().expect("failed to initialize log tracer bridge");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    // stdout carries command output
    let formatting_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_appender = tracing_appender::rolling::daily(log_dir(), format!("{}.log", name));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(formatting_layer)
        .with(file_layer);

    set_global_default(subscriber).expect("failed to set global tracing subscriber");

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_ends_with_logs() {
        assert!(log_dir().ends_with("logs"));
    }

    // Installs the global subscriber, so only one test may do it
    #[test]
    fn test_init_subscriber() {
        let _guard = init_subscriber("regtags_test", "info");
        tracing::info!("subscriber installed");
    }
}
