use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use regtags_adapters::{configuration, keychains, telemetry};
use regtags_adapters::{KeyringKeychain, ReqwestTransport, TracingWarningSink};
use regtags_core::config::Settings;
use regtags_core::context::ListContext;
use regtags_core::entities::{HttpRequest, Registry, Repository};
use regtags_core::{
    with_auth_from_keychain, with_context, with_transport, Lister, ListerDefaults, ListerOption,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure a lister for a repository and show the resolved credentials
    Resolve {
        /// Repository, e.g. gcr.io/project/image or ubuntu
        repository: String,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Skip credential discovery and stay anonymous
        #[arg(long, default_value = "false")]
        anonymous: bool,

        /// Also send an authenticated request to the registry's /v2/ endpoint
        #[arg(long, default_value = "false")]
        check: bool,
    },

    /// Save registry credentials to the OS keyring
    Login {
        /// Registry host, e.g. ghcr.io
        registry: String,

        #[arg(short, long)]
        username: String,

        /// Read the password from this environment variable instead of prompting
        #[arg(long)]
        password_env: Option<String>,
    },

    /// Remove registry credentials from the OS keyring
    Logout {
        /// Registry host
        registry: String,
    },

    /// Print the effective settings
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = match configuration::get_configuration() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return Err(anyhow::anyhow!("configuration loading failed"));
        }
    };

    let _guard = telemetry::init_subscriber("regtags", &settings.log_level);

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            repository,
            timeout,
            anonymous,
            check,
        } => resolve(&settings, &repository, timeout, anonymous, check).await,
        Commands::Login {
            registry,
            username,
            password_env,
        } => login(&registry, &username, password_env.as_deref()).await,
        Commands::Logout { registry } => logout(&registry).await,
        Commands::ShowConfig => show_config(&settings),
    };

    if let Err(e) = &result {
        error!(error = %e, "command failed");
    }
    result
}

async fn resolve(
    settings: &Settings,
    reference: &str,
    timeout: Option<u64>,
    anonymous: bool,
    check: bool,
) -> anyhow::Result<()> {
    let default_registry = Registry::new(&settings.registry.default_registry)
        .context("invalid default registry in settings")?;
    let repository = Repository::parse_with_default(reference, &default_registry)?;

    let transport = Arc::new(ReqwestTransport::from_settings(&settings.http)?);
    let defaults = ListerDefaults::new(transport);

    let mut context = ListContext::new();
    if let Some(secs) = timeout {
        context = context.with_timeout(Duration::from_secs(secs));
    }
    cancel_on_ctrl_c(context.clone());

    let mut options: Vec<ListerOption> = vec![with_context(context.clone())];
    if anonymous {
        info!("credential discovery disabled");
    } else {
        let keychain = keychains::from_settings(&settings.registry);
        options.push(with_auth_from_keychain(Arc::new(keychain)));
    }

    // Keychain lookups may block on a store that ignores cancellation
    let lister = until_cancelled(&context, async {
        Ok(Lister::new(repository, &defaults, options, &TracingWarningSink).await?)
    })
    .await?;

    println!("Repository: {}", lister.repository());
    println!("Registry:   {}", lister.repository().registry);
    println!("Auth:       {}", lister.auth());
    println!("Tags URL:   {}", lister.tags_url());

    if check {
        let registry = &lister.repository().registry;
        let url = format!("{}://{}/v2/", registry.scheme(), registry);
        let response = lister.send(HttpRequest::get(url)).await?;
        let verdict = match response.status {
            200..=299 => "accepted",
            401 => "challenge (credentials rejected or token exchange required)",
            403 => "forbidden",
            _ => "unexpected status",
        };
        println!("Check:      HTTP {} {}", response.status, verdict);
    }

    Ok(())
}

/// First Ctrl-C cancels the context, a second one exits immediately
fn cancel_on_ctrl_c(context: ListContext) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("interrupted, cancelling (press Ctrl-C again to exit)");
        context.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

async fn until_cancelled<T>(
    context: &ListContext,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    tokio::select! {
        _ = context.token().cancelled() => Err(anyhow::anyhow!("interrupted")),
        result = fut => result,
    }
}

async fn login(registry: &str, username: &str, password_env: Option<&str>) -> anyhow::Result<()> {
    let registry = Registry::new(registry)?;

    let password = match password_env {
        Some(var) => std::env::var(var)
            .with_context(|| format!("environment variable {} is not set", var))?,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        anyhow::bail!("empty password");
    }

    KeyringKeychain::new()
        .store(&registry, username, &password)
        .await?;
    println!("Saved credentials for {} ({})", registry, username);
    Ok(())
}

async fn logout(registry: &str) -> anyhow::Result<()> {
    let registry = Registry::new(registry)?;
    KeyringKeychain::new().delete(&registry).await?;
    println!("Removed credentials for {}", registry);
    Ok(())
}

fn show_config(settings: &Settings) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::parse_from(["regtags", "resolve", "gcr.io/p/i", "--timeout", "5", "--check"]);
        match cli.command {
            Commands::Resolve {
                repository,
                timeout,
                anonymous,
                check,
            } => {
                assert_eq!(repository, "gcr.io/p/i");
                assert_eq!(timeout, Some(5));
                assert!(!anonymous);
                assert!(check);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[tokio::test]
    async fn test_until_cancelled_interrupts_pending_work() {
        let context = ListContext::new();
        context.cancel();

        let result: anyhow::Result<()> =
            until_cancelled(&context, std::future::pending()).await;

        assert_eq!(result.unwrap_err().to_string(), "interrupted");
    }

    #[tokio::test]
    async fn test_until_cancelled_cancel_mid_flight() {
        let context = ListContext::new();
        let cancel = context.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let result: anyhow::Result<()> =
            until_cancelled(&context, std::future::pending()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_until_cancelled_passes_result_through() {
        let context = ListContext::new();

        let value = until_cancelled(&context, async { Ok(7) }).await.unwrap();

        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_login() {
        let cli = Cli::parse_from(["regtags", "login", "ghcr.io", "-u", "me"]);
        assert!(matches!(
            cli.command,
            Commands::Login { ref registry, ref username, password_env: None }
                if registry == "ghcr.io" && username == "me"
        ));
    }
}
