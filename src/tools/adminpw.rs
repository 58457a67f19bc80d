use crate::command::Command;
use crate::error::Error;
use crate::tools::Tools;

/// Shortest accepted admin password, in characters.
pub const MIN_PASSWORD_LEN: usize = 4;

impl Tools {
    /// Change the directory admin password from `old` to `new` with `ldappasswd`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordTooShort`] without running anything if `new` has fewer than
    /// [`MIN_PASSWORD_LEN`] characters, and [`Error::InvalidPassword`] if `ldappasswd` exits
    /// non-zero.
    pub async fn set_admin_password(&self, old: &str, new: &str) -> Result<(), Error> {
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::PasswordTooShort);
        }

        // Not logged: the arguments carry both passwords.
        let cmd = Command::new("ldappasswd")
            .arg("-H")
            .arg(&self.config.ldap_url)
            .arg("-D")
            .arg(self.config.admin_dn())
            .args(["-w", old, "-a", old, "-s", new]);
        if self.runner.run(&cmd).await.success() {
            tracing::debug!("ldappasswd accepted the change for {}", self.config.admin_dn());
            Ok(())
        } else {
            Err(Error::InvalidPassword)
        }
    }
}
