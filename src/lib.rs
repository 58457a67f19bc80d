//! YunoHost tools
//!
//! Host administration for a self-hosted [YunoHost] server: directory bootstrap, admin
//! password changes, main domain changes and first-time setup ("postinstall").
//!
//! There is no long-running component. Every operation is a fixed sequence of file edits,
//! directory writes and external commands, run once and stopped at the first failure. See
//! [`tools`] for the operations themselves.
//!
//! Everything the operations touch outside the process goes through a swappable seam:
//!
//! * external programs through a [`command::Runner`],
//! * the current domain, install marker and CA database through a [`state::HostState`],
//! * the LDAP directory through a [`directory::Connector`].
//!
//! [YunoHost]: https://yunohost.org
//!
#![warn(clippy::pedantic)]

pub mod command;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod state;
pub mod tools;

pub use config::{Config, SharedConfig};
pub use domain::Domain;
pub use error::Error;
pub use tools::Tools;
