//! Error types.

/// Error enumerates the possible failure states of the administration tools.
///
/// Every error is fatal to the operation that produced it. Nothing done before the failure
/// is undone.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a domain doesn't match the hostname grammar, see
    /// [`Domain::parse`][crate::domain::Domain::parse].
    #[error("invalid domain: \"{0}\"")]
    InvalidDomain(String),

    /// Returned when a [`Config`][crate::config::Config] is well-formed JSON but unusable,
    /// e.g. an empty collaborator command.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Returned by [`Tools::set_admin_password`][crate::tools::Tools::set_admin_password] when
    /// the new password is shorter than
    /// [`MIN_PASSWORD_LEN`][crate::tools::adminpw::MIN_PASSWORD_LEN] characters.
    #[error("password is too short")]
    PasswordTooShort,

    /// Returned when the directory password tool rejects the current admin password.
    #[error("invalid password")]
    InvalidPassword,

    /// Returned by [`Tools::postinstall`][crate::tools::Tools::postinstall] once the install
    /// marker exists.
    #[error("YunoHost is already installed")]
    AlreadyInstalled,

    /// Returned when an external command exits with a non-zero status. `task` names the
    /// sequence the command belonged to, not the individual command.
    #[error("there was a problem during {task}")]
    CommandFailed { task: &'static str },

    /// Returned when adding a directory entry whose DN is already present.
    #[error("directory entry already exists: \"{0}\"")]
    EntryExists(String),

    /// Returned when updating a directory entry that isn't present.
    #[error("no such directory entry: \"{0}\"")]
    NoSuchEntry(String),

    /// Returned when the LDAP server can't be reached or rejects an operation.
    #[error("LDAP error")]
    Ldap(#[from] ldap3::LdapError),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when the [`Config`][crate::config::Config] or the directory
    /// [`Schema`][crate::directory::Schema] file holds invalid JSON.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}

impl Error {
    /// The errno-style code reported for this error, also used as the process exit status.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidDomain(_)
            | Error::InvalidConfig(_)
            | Error::PasswordTooShort
            | Error::InvalidPassword => 22,
            Error::AlreadyInstalled | Error::CommandFailed { .. } | Error::EntryExists(_) => 17,
            Error::NoSuchEntry(_) => 2,
            Error::Ldap(_) | Error::IO(_) | Error::InvalidJSON(_) => 5,
        }
    }
}
