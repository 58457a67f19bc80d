use crate::command::{self, Command};
use crate::domain::Domain;
use crate::error::Error;
use crate::tools::{lemon, Tools};
use regex::bytes::{NoExpand, Regex};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const TASK: &str = "domain changing";

/// Web server fragments copied from the templates directory into the new domain's
/// directory.
const APACHE_FIXED_CONFS: [&str; 3] = ["sso.fixed.conf", "admin.fixed.conf", "user.fixed.conf"];

/// One step of the final phase of a main domain change.
///
/// Steps run in order and the first failure aborts the change. None of them is undone:
/// service restarts can't be, and copies and links are only ever redone by a later
/// successful change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run(Command),
    PersistDomain(Domain),
}

impl Tools {
    /// Move the host from `old` to `new` as its main domain. When `old` is `None` the
    /// persisted current domain is used.
    ///
    /// Every literal occurrence of `old` in the configuration file set is replaced by `new`,
    /// substrings of longer names included. `new` is then registered, the auth-proxy
    /// fragment written, stale web server and TLS links removed, and the steps of
    /// [`Tools::rename_plan`] run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDomain`] before touching anything if either domain is
    /// malformed, [`Error::IO`] if a configuration file can't be rewritten, and
    /// [`Error::CommandFailed`] on the first failing external command.
    pub async fn rename_domain(&self, old: Option<&str>, new: &str) -> Result<(), Error> {
        let old = match old {
            Some(old) => old.to_string(),
            None => self.state.read().await.current_domain().await?,
        };
        let old = Domain::parse(&old)?;
        let new = Domain::parse(new)?;
        tracing::info!("changing main domain from {old} to {new}");

        let files = self.config_file_set().await?;
        for path in &files {
            rewrite_file(path, &old, &new).await?;
        }
        tracing::info!("rewrote {} configuration files", files.len());

        let domain_add = Command::from_argv(&self.config.domain_add_command)
            .ok_or_else(|| Error::InvalidConfig("domain_add_command is empty".into()))?
            .arg(new.as_str());
        command::ensure_success(&self.runner, TASK, &domain_add).await?;

        let frag = lemon::fragment(
            &new,
            &old,
            &self.config.default_domain,
            &self.config.ldap_base_dn,
        );
        fs::write(&self.config.lemon_fragment_path, frag).await?;

        self.remove_stale(&old).await;

        let plan = self.rename_plan(&new);
        let steps = plan.len();
        for step in plan {
            match step {
                Step::Run(cmd) => command::ensure_success(&self.runner, TASK, &cmd).await?,
                Step::PersistDomain(domain) => {
                    self.state.write().await.set_current_domain(&domain).await?;
                }
            }
        }

        tracing::info!("ran {steps} steps, {new} persisted as main domain");
        Ok(())
    }

    /// The ordered steps that finish a change to `new`: install web server fragments,
    /// regenerate the auth-proxy config, re-run hostname setup, link the new TLS key and
    /// certificate, persist the domain, then reload the web server and restart the message
    /// router and mail transfer agent.
    #[must_use]
    pub fn rename_plan(&self, new: &Domain) -> Vec<Step> {
        let conf = &self.config;
        let domain_dir = conf.apache_domain_dir(new);
        let cert_dir = conf.certs_dir.join(new.as_str());
        let key = cert_dir.join("key.pem");
        let crt = cert_dir.join("crt.pem");

        let mut steps: Vec<Step> = APACHE_FIXED_CONFS
            .iter()
            .map(|name| {
                Step::Run(Command::copy(
                    &conf.apache_templates_dir.join(name),
                    &domain_dir.join(name),
                ))
            })
            .collect();
        steps.extend([
            Step::Run(Command::new(&conf.lemon_moulinette)),
            Step::Run(Command::new(&conf.hostname_script)),
            Step::Run(Command::copy(&key, &conf.metronome_key_path)),
            Step::Run(Command::new("chown").arg("metronome:").arg(&conf.metronome_key_path)),
            Step::Run(Command::symlink(&key, &conf.ssl_key_link)),
            Step::Run(Command::symlink(&crt, &conf.ssl_cert_link)),
            Step::PersistDomain(new.clone()),
            Step::Run(Command::service("apache2", "reload")),
            Step::Run(Command::service("metronome", "restart")),
            Step::Run(Command::service("postfix", "restart")),
        ]);
        steps
    }

    /// The fixed configuration files followed by every file directly under the extra
    /// configuration directories.
    async fn config_file_set(&self) -> Result<Vec<PathBuf>, Error> {
        let mut files = self.config.config_files.clone();
        for dir in &self.config.extra_config_dirs {
            let mut found = Vec::new();
            let mut entries = fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    found.push(entry.path());
                }
            }
            found.sort();
            files.extend(found);
        }
        Ok(files)
    }

    /// Best effort: the old domain's fixed web server fragments and the system-wide TLS
    /// links. Nothing here may exist yet on a fresh host.
    async fn remove_stale(&self, old: &Domain) {
        let old_dir = self.config.apache_domain_dir(old);
        match fs::read_dir(&old_dir).await {
            Ok(mut entries) => {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    if entry.file_name().to_string_lossy().ends_with(".fixed.conf") {
                        remove_ignoring_failure(&entry.path()).await;
                    }
                }
            }
            Err(err) => tracing::debug!("skipping {}: {err}", old_dir.display()),
        }
        remove_ignoring_failure(&self.config.ssl_key_link).await;
        remove_ignoring_failure(&self.config.ssl_cert_link).await;
    }
}

/// Replace every occurrence of `old` with `new` in the file at `path`, in place. Works on
/// raw bytes: configuration files aren't required to be UTF-8.
async fn rewrite_file(path: &Path, old: &Domain, new: &Domain) -> Result<(), Error> {
    let pattern = Regex::new(&regex::escape(old.as_str()))
        .map_err(|_| Error::InvalidDomain(old.to_string()))?;
    let contents = fs::read(path).await?;
    let count = pattern.find_iter(&contents).count();
    let rewritten = pattern.replace_all(&contents, NoExpand(new.as_str().as_bytes()));
    fs::write(path, rewritten).await?;
    tracing::debug!("rewrote {} ({count} replacements)", path.display());
    Ok(())
}

async fn remove_ignoring_failure(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => tracing::debug!("removed {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("unable to remove {}: {err}", path.display()),
    }
}
