//! Directory service access.
//!
//! A [`Connector`] opens an authenticated [`Directory`] session. Sessions must be released
//! with [`Directory::close`] once the caller is done, whether or not its work succeeded.
//!
//! Two implementations are provided, [`ldap::LdapConnector`] talking to a real LDAP server
//! and [`memory::InMemoryDirectory`] for tests.

use crate::error::Error;
use std::sync::Arc;

pub mod ldap;
pub mod memory;
pub mod schema;

pub use ldap::LdapConnector;
pub use memory::InMemoryDirectory;
pub use schema::{Attributes, Schema};

/// An open, authenticated directory session.
pub type Session = Box<dyn Directory + Send>;

/// `DynConnector` is a type alias for a [`Connector`] shared by a
/// [`Tools`][crate::tools::Tools] context.
#[allow(clippy::module_name_repetitions)]
pub type DynConnector = Arc<dyn Connector + Send + Sync>;

#[async_trait::async_trait]
pub trait Connector {
    /// Bind as `bind_dn` with `password`.
    async fn connect(&self, bind_dn: &str, password: &str) -> Result<Session, Error>;
}

/// An async trait for writing directory entries, addressed by full DN.
#[async_trait::async_trait]
pub trait Directory {
    /// Create a new entry.
    ///
    /// Returns [`Error::EntryExists`] if `dn` is already present.
    async fn add(&mut self, dn: &str, attrs: &Attributes) -> Result<(), Error>;

    /// Replace the given attributes of an entry, leaving the others untouched.
    async fn update(&mut self, dn: &str, attrs: &Attributes) -> Result<(), Error>;

    /// Release the session.
    async fn close(&mut self) -> Result<(), Error>;
}

/// Close `session`, then hand back `res`. A close failure is only reported when `res`
/// succeeded.
///
/// # Errors
///
/// Returns the error in `res`, or the error from [`Directory::close`].
pub async fn release<T>(mut session: Session, res: Result<T, Error>) -> Result<T, Error> {
    let closed = session.close().await;
    match res {
        Ok(value) => closed.map(|()| value),
        Err(err) => {
            if let Err(close_err) = closed {
                tracing::warn!("failed to close directory session: {close_err}");
            }
            Err(err)
        }
    }
}
