use crate::command::{self, Command};
use crate::directory::{self, Schema, Session};
use crate::domain::Domain;
use crate::error::Error;
use crate::tools::adminpw::MIN_PASSWORD_LEN;
use crate::tools::Tools;

impl Tools {
    /// First-time host setup.
    ///
    /// In order: refuse if the install marker exists, create the required directories,
    /// create a fresh certificate authority, populate the directory, move from the default
    /// domain to `domain`, change the admin password from the default one to `password`,
    /// optionally subscribe to dynamic DNS, and finally create the install marker.
    ///
    /// The directory session is bound with the default admin password for the whole run and
    /// released whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInstalled`] if the marker exists, and
    /// [`Error::InvalidDomain`] or [`Error::PasswordTooShort`] before any change is made if
    /// the arguments are unusable. Any later failure is returned as-is and leaves the host
    /// as far as it got: CA regeneration is not idempotent, so a re-run needs manual
    /// cleanup first.
    pub async fn postinstall(&self, domain: &str, password: &str, dyndns: bool) -> Result<(), Error> {
        if self.state.read().await.installed().await? {
            return Err(Error::AlreadyInstalled);
        }
        let domain = Domain::parse(domain)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::PasswordTooShort);
        }
        let schema = Schema::try_from_file(&self.config.schema_path)?;
        tracing::info!("installing YunoHost");

        let mut session = self
            .directory
            .connect(&self.config.admin_dn(), &self.config.default_password)
            .await?;
        let res = self
            .postinstall_with(&mut session, &schema, &domain, password, dyndns)
            .await;
        directory::release(session, res).await?;

        Ok(())
    }

    async fn postinstall_with(
        &self,
        session: &mut Session,
        schema: &Schema,
        domain: &Domain,
        password: &str,
        dyndns: bool,
    ) -> Result<(), Error> {
        for dir in &self.config.required_dirs {
            tokio::fs::create_dir_all(dir).await?;
        }

        self.create_ca().await?;
        self.populate_directory(session, schema).await?;
        self.rename_domain(Some(self.config.default_domain.as_str()), domain.as_str())
            .await?;
        self.set_admin_password(&self.config.default_password, password)
            .await?;

        if dyndns {
            let subscribe = Command::from_argv(&self.config.dyndns_subscribe_command)
                .ok_or_else(|| Error::InvalidConfig("dyndns_subscribe_command is empty".into()))?;
            command::ensure_success(&self.runner, "DynDNS subscription", &subscribe).await?;
        }

        self.state.write().await.mark_installed().await?;
        tracing::info!(
            "install marker created at {}",
            self.config.install_marker_path.display()
        );
        Ok(())
    }

    /// Reset the CA database, issue a new self-signed CA certificate and add it to the
    /// system trust store.
    async fn create_ca(&self) -> Result<(), Error> {
        let ca_dir = &self.config.ca_dir;
        let cacert = ca_dir.join("ca/cacert.pem");
        let cakey = ca_dir.join("ca/cakey.pem");

        self.state.write().await.reset_ca_database().await?;
        command::run_all(
            &self.runner,
            "CA creation",
            &[
                Command::new("openssl")
                    .args(["req", "-x509", "-new", "-config"])
                    .arg(ca_dir.join("openssl.cnf"))
                    .args(["-days", "3650", "-out"])
                    .arg(&cacert)
                    .arg("-keyout")
                    .arg(&cakey)
                    .args(["-nodes", "-batch"]),
                Command::copy(&cacert, &self.config.ca_trust_path),
                Command::new("update-ca-certificates"),
            ],
        )
        .await?;
        tracing::info!("CA certificate issued to {}", cacert.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RecordingRunner;
    use crate::config::Config;
    use crate::directory::InMemoryDirectory;
    use crate::state::InMemoryHostState;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    struct Fixture {
        _tmp: tempfile::TempDir,
        config: Config,
        runner: RecordingRunner,
        state: Arc<RwLock<InMemoryHostState>>,
        directory: InMemoryDirectory,
        tools: Tools,
    }

    fn fixture(runner: RecordingRunner) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(tmp.path());
        for f in &config.config_files {
            std::fs::create_dir_all(f.parent().unwrap()).unwrap();
            std::fs::write(f, "yunohost.org\n").unwrap();
        }
        std::fs::create_dir_all(config.lemon_fragment_path.parent().unwrap()).unwrap();
        std::fs::create_dir_all(config.schema_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config.schema_path,
            include_str!("../../data/ldap_scheme.json"),
        )
        .unwrap();

        let state = Arc::new(RwLock::new(InMemoryHostState::with_domain("yunohost.org")));
        let directory = InMemoryDirectory::with_entry(
            "cn=admin,dc=yunohost,dc=org",
            [("cn".to_string(), vec!["admin".to_string()])].into(),
        );
        let tools = Tools::new(
            Arc::new(config.clone()),
            Arc::new(runner.clone()),
            state.clone(),
            Arc::new(directory.clone()),
        );
        Fixture {
            _tmp: tmp,
            config,
            runner,
            state,
            directory,
            tools,
        }
    }

    #[tokio::test]
    async fn second_run_is_a_state_conflict() {
        let fx = fixture(RecordingRunner::new());
        fx.tools
            .postinstall("example.org", "Sup3rSecret", false)
            .await
            .unwrap();
        assert!(fx.state.read().await.installed);

        let ran_before = fx.runner.history().await.len();
        assert!(matches!(
            fx.tools.postinstall("example.org", "Sup3rSecret", false).await,
            Err(Error::AlreadyInstalled)
        ));
        assert_eq!(fx.runner.history().await.len(), ran_before);
    }

    #[tokio::test]
    async fn ca_is_created_before_directory_and_rename() {
        let fx = fixture(RecordingRunner::new());
        fx.tools
            .postinstall("example.org", "Sup3rSecret", false)
            .await
            .unwrap();

        let state = fx.state.read().await;
        assert_eq!(state.ca_serial.as_deref(), Some("01"));
        assert_eq!(state.ca_index.as_deref(), Some(""));

        let ran: Vec<String> = fx
            .runner
            .history()
            .await
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(ran[0].starts_with("openssl req -x509 -new -config "));
        assert!(ran[0].ends_with("-nodes -batch"));
        assert_eq!(ran[2], "update-ca-certificates");
        assert_eq!(ran[3], "yunohost domain add --main example.org");
        assert!(ran.last().unwrap().starts_with("ldappasswd "));
        assert!(!ran.iter().any(|c| c.contains("dyndns")));

        for dir in &fx.config.required_dirs {
            assert!(dir.is_dir());
        }
        assert!(fx
            .directory
            .entries()
            .await
            .contains_key("cn=admin,dc=yunohost,dc=org"));
        assert_eq!(fx.directory.open_sessions(), 0);
    }

    #[tokio::test]
    async fn dyndns_runs_after_password_change() {
        let fx = fixture(RecordingRunner::new());
        fx.tools
            .postinstall("example.nohost.me", "Sup3rSecret", true)
            .await
            .unwrap();
        let history = fx.runner.history().await;
        let last = history.last().unwrap().to_string();
        assert_eq!(last, "yunohost dyndns subscribe");
        assert!(history[history.len() - 2].to_string().starts_with("ldappasswd "));
    }

    #[tokio::test]
    async fn ca_failure_stops_before_directory() {
        let fx = fixture(RecordingRunner::failing_on("update-ca-certificates"));
        let err = fx
            .tools
            .postinstall("example.org", "Sup3rSecret", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { task: "CA creation" }));
        assert_eq!(fx.directory.entries().await.len(), 1);
        assert_eq!(fx.directory.open_sessions(), 0);
        assert!(!fx.state.read().await.installed);
    }

    #[tokio::test]
    async fn bad_arguments_change_nothing() {
        let fx = fixture(RecordingRunner::new());
        assert!(matches!(
            fx.tools.postinstall("nodots", "Sup3rSecret", false).await,
            Err(Error::InvalidDomain(_))
        ));
        assert!(matches!(
            fx.tools.postinstall("example.org", "abc", false).await,
            Err(Error::PasswordTooShort)
        ));
        assert!(fx.runner.history().await.is_empty());
        assert!(!fx.config.required_dirs[0].exists());
    }
}
