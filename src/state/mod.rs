//! Persisted host state.
//!
//! The host keeps three pieces of state outside the directory: the current main domain, the
//! install marker and the certificate authority's serial/index database. [`HostState`]
//! wraps them behind explicit read/write calls.
//!
//! Two implementations are provided, [`memory::InMemoryHostState`] and
//! [`file::FileHostState`]. The latter reads and writes the real files named by the
//! [`Config`][crate::config::Config].

use crate::domain::Domain;
use crate::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod file;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use file::FileHostState;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryHostState;

/// `DynHostState` is a type alias for a [`HostState`] shared through an [`Arc`] and a
/// [`RwLock`].
#[allow(clippy::module_name_repetitions)]
pub type DynHostState = Arc<RwLock<dyn HostState + Send + Sync>>;

/// An async trait describing the host's persisted state.
#[async_trait::async_trait]
pub trait HostState {
    /// The persisted main domain, unvalidated. Surrounding whitespace is trimmed.
    async fn current_domain(&self) -> Result<String, Error>;

    /// Persist `domain` as the main domain.
    async fn set_current_domain(&mut self, domain: &Domain) -> Result<(), Error>;

    /// Whether the install marker is present.
    async fn installed(&self) -> Result<bool, Error>;

    /// Create the install marker. The marker is never removed.
    async fn mark_installed(&mut self) -> Result<(), Error>;

    /// Reset the CA serial counter to `01` and empty the issued certificate index.
    async fn reset_ca_database(&mut self) -> Result<(), Error>;
}
