pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod keychain;
pub mod lister;
pub mod options;
pub mod ports;

pub use error::Error;
pub use lister::{Lister, ListerDefaults};
pub use options::{
    configure, configure_new, with_auth, with_auth_from_keychain, with_context, with_transport,
    ListerConfig, ListerOption,
};

#[cfg(test)]
pub(crate) mod test_support;
