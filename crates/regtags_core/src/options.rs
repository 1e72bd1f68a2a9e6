//! Lister configuration options.
//!
//! A lister is configured by applying an ordered list of [`ListerOption`]s to
//! a [`ListerConfig`] seeded from [`ListerDefaults`]. Options apply strictly
//! left to right, each at most once; the first failure stops the sequence and
//! leaves earlier mutations in place. Later options overwrite earlier ones
//! targeting the same field.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::context::ListContext;
use crate::entities::{Authenticator, Registry, Repository};
use crate::error::Error;
use crate::lister::ListerDefaults;
use crate::ports::{Keychain, RoundTripper, WarningSink};

/// Mutable configuration a lister is built from
#[derive(Clone)]
pub struct ListerConfig {
    pub transport: Arc<dyn RoundTripper>,
    pub auth: Authenticator,
    pub context: ListContext,
    pub repository: Repository,
}

impl ListerConfig {
    pub fn new(repository: Repository, defaults: &ListerDefaults) -> Self {
        Self {
            transport: Arc::clone(&defaults.transport),
            auth: Authenticator::Anonymous,
            context: defaults.context.clone(),
            repository,
        }
    }
}

impl fmt::Debug for ListerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListerConfig")
            .field("auth", &self.auth)
            .field("context", &self.context)
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

/// Advisory produced by an option; never an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AnonymousFallback { registry: Registry },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AnonymousFallback { registry } => write!(
                f,
                "No matching credentials were found for {}, falling back on anonymous",
                registry
            ),
        }
    }
}

/// Outcome of a successfully applied option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub notice: Option<Notice>,
}

impl Applied {
    fn done() -> Self {
        Self::default()
    }
}

pub enum ListerOption {
    Transport(Arc<dyn RoundTripper>),
    Auth(Authenticator),
    AuthFromKeychain(Arc<dyn Keychain>),
    Context(ListContext),
}

impl ListerOption {
    pub fn kind(&self) -> &'static str {
        match self {
            ListerOption::Transport(_) => "transport",
            ListerOption::Auth(_) => "auth",
            ListerOption::AuthFromKeychain(_) => "auth_from_keychain",
            ListerOption::Context(_) => "context",
        }
    }

    /// Apply this option to `config`.
    ///
    /// Only [`ListerOption::AuthFromKeychain`] can fail, and its error is the
    /// keychain's own, returned unchanged.
    pub async fn apply(self, config: &mut ListerConfig) -> Result<Applied, Error> {
        match self {
            ListerOption::Transport(transport) => {
                config.transport = transport;
                Ok(Applied::done())
            }
            ListerOption::Auth(auth) => {
                config.auth = auth;
                Ok(Applied::done())
            }
            ListerOption::AuthFromKeychain(keychain) => {
                let registry = &config.repository.registry;
                let auth = keychain.resolve(registry).await?;

                let notice = auth.is_anonymous().then(|| Notice::AnonymousFallback {
                    registry: registry.clone(),
                });
                config.auth = auth;
                Ok(Applied { notice })
            }
            ListerOption::Context(context) => {
                config.context = context;
                Ok(Applied::done())
            }
        }
    }
}

impl fmt::Debug for ListerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListerOption::Auth(auth) => f.debug_tuple("Auth").field(auth).finish(),
            ListerOption::Context(context) => f.debug_tuple("Context").field(context).finish(),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Override the transport used for registry requests
pub fn with_transport(transport: Arc<dyn RoundTripper>) -> ListerOption {
    ListerOption::Transport(transport)
}

/// Override the authenticator used for registry requests
pub fn with_auth(auth: Authenticator) -> ListerOption {
    ListerOption::Auth(auth)
}

/// Resolve the authenticator from `keychain` against the configured registry.
///
/// Falls back on anonymous (with a notice) when the keychain has nothing for
/// the registry.
pub fn with_auth_from_keychain(keychain: Arc<dyn Keychain>) -> ListerOption {
    ListerOption::AuthFromKeychain(keychain)
}

/// Override the context carried into resolution and listing calls
pub fn with_context(context: ListContext) -> ListerOption {
    ListerOption::Context(context)
}

/// Apply `options` to `config` in order, stopping at the first failure.
///
/// Notices are forwarded to `sink`. On failure `config` keeps whatever the
/// options before the failing one wrote; callers should discard it.
pub async fn configure<I>(
    config: &mut ListerConfig,
    options: I,
    sink: &dyn WarningSink,
) -> Result<(), Error>
where
    I: IntoIterator<Item = ListerOption>,
{
    for option in options {
        trace!(option = option.kind(), "applying lister option");
        let applied = option.apply(config).await?;
        if let Some(notice) = applied.notice {
            sink.warn(&notice.to_string());
        }
    }
    Ok(())
}

/// Owning variant of [`configure`]
pub async fn configure_new<I>(
    mut config: ListerConfig,
    options: I,
    sink: &dyn WarningSink,
) -> Result<ListerConfig, Error>
where
    I: IntoIterator<Item = ListerOption>,
{
    configure(&mut config, options, sink).await?;
    Ok(config)
}
