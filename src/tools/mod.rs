//! Host administration operations.
//!
//! | Operation | What it does |
//! |---|---|
//! | [`Tools::initialize_directory`] | creates the base directory tree and the admin entry |
//! | [`Tools::set_admin_password`] | changes the directory admin password |
//! | [`Tools::rename_domain`] | moves every configuration file and service to a new main domain |
//! | [`Tools::postinstall`] | first-time setup, runs the three above in order |
//!
//! Each operation stops at the first failure. Nothing done before the failure is undone, so
//! a failed [`Tools::rename_domain`] or [`Tools::postinstall`] can leave the host half
//! configured.

use crate::command::{DynRunner, SystemRunner};
use crate::config::{Config, SharedConfig};
use crate::directory::{DynConnector, LdapConnector};
use crate::state::{DynHostState, FileHostState};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod adminpw;
pub mod ldapinit;
pub mod lemon;
pub mod maindomain;
pub mod postinstall;

pub use maindomain::Step;

/// Everything an operation touches: the config, the process runner, the persisted host
/// state and the directory.
#[derive(Clone)]
pub struct Tools {
    config: SharedConfig,
    runner: DynRunner,
    state: DynHostState,
    directory: DynConnector,
}

impl Tools {
    #[must_use]
    pub fn new(
        config: SharedConfig,
        runner: DynRunner,
        state: DynHostState,
        directory: DynConnector,
    ) -> Self {
        Self {
            config,
            runner,
            state,
            directory,
        }
    }

    /// Tools acting on the real host: spawned processes, state files and the configured
    /// LDAP server.
    #[must_use]
    pub fn system(config: SharedConfig) -> Self {
        let state = Arc::new(RwLock::new(FileHostState::new(&config)));
        let directory = Arc::new(LdapConnector::new(&config.ldap_url));
        Self::new(config, Arc::new(SystemRunner), state, directory)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
