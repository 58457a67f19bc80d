use crate::domain::Domain;
use crate::error::Error;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type SharedConfig = Arc<Config>;

/// Host layout and collaborator locations.
///
/// Every field has a default matching a stock YunoHost host, so a config file only needs to
/// name what differs.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Single-line file holding the current main domain.
    pub current_host_path: PathBuf,
    /// Sentinel file created once postinstall completes.
    pub install_marker_path: PathBuf,
    /// Files rewritten on a main domain change.
    pub config_files: Vec<PathBuf>,
    /// Every file directly under these directories is rewritten too.
    pub extra_config_dirs: Vec<PathBuf>,
    pub lemon_fragment_path: PathBuf,
    pub apache_domains_dir: PathBuf,
    pub apache_templates_dir: PathBuf,
    pub certs_dir: PathBuf,
    pub ssl_key_link: PathBuf,
    pub ssl_cert_link: PathBuf,
    pub metronome_key_path: PathBuf,
    pub ca_dir: PathBuf,
    pub ca_trust_path: PathBuf,
    /// Created, if absent, at the start of postinstall.
    pub required_dirs: Vec<PathBuf>,
    pub schema_path: PathBuf,
    pub ldap_url: String,
    pub ldap_base_dn: String,
    /// Factory domain in place before the first postinstall.
    pub default_domain: Domain,
    /// Factory admin password in place before the first postinstall.
    pub default_password: String,
    pub lemon_moulinette: PathBuf,
    pub hostname_script: PathBuf,
    /// Registers a domain as the main domain. The domain is appended as the last argument.
    pub domain_add_command: Vec<String>,
    pub dyndns_subscribe_command: Vec<String>,
}

lazy_static! {
    static ref DEFAULT_DOMAIN: Domain = Domain::parse("yunohost.org").unwrap();
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_host_path: "/etc/yunohost/current_host".into(),
            install_marker_path: "/etc/yunohost/installed".into(),
            config_files: [
                "/etc/postfix/main.cf",
                "/etc/metronome/metronome.cfg.lua",
                "/etc/dovecot/dovecot.conf",
                "/etc/lemonldap-ng/lemonldap-ng.ini",
                "/etc/hosts",
                "/usr/share/yunohost/yunohost-config/others/startup",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            extra_config_dirs: Vec::new(),
            lemon_fragment_path: "/tmp/tmplemonconf".into(),
            apache_domains_dir: "/etc/yunohost/apache/domains".into(),
            apache_templates_dir: "/etc/yunohost/apache/templates".into(),
            certs_dir: "/etc/yunohost/certs".into(),
            ssl_key_link: "/etc/ssl/private/yunohost_key.pem".into(),
            ssl_cert_link: "/etc/ssl/certs/yunohost_crt.pem".into(),
            metronome_key_path: "/etc/metronome/certs/yunohost_key.pem".into(),
            ca_dir: "/usr/share/yunohost/yunohost-config/ssl/yunoCA".into(),
            ca_trust_path: "/etc/ssl/certs/ca-yunohost_crt.pem".into(),
            required_dirs: [
                "/etc/yunohost/apps",
                "/etc/yunohost/certs",
                "/var/cache/yunohost/repo",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            schema_path: "/usr/share/yunohost/yunohost-config/moulinette/ldap_scheme.json".into(),
            ldap_url: "ldap://localhost:389".to_string(),
            ldap_base_dn: "dc=yunohost,dc=org".to_string(),
            default_domain: DEFAULT_DOMAIN.clone(),
            default_password: "yunohost".to_string(),
            lemon_moulinette: "/usr/share/lemonldap-ng/bin/lmYnhMoulinette".into(),
            hostname_script: "/etc/init.d/hostname.sh".into(),
            domain_add_command: vec!["yunohost".into(), "domain".into(), "add".into(), "--main".into()],
            dyndns_subscribe_command: vec!["yunohost".into(), "dyndns".into(), "subscribe".into()],
        }
    }
}

impl Config {
    /// Load a [`Config`] from the JSON file at `p`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file can't be read, [`Error::InvalidJSON`] if it isn't a
    /// valid config (including a `default_domain` outside the hostname grammar), and
    /// [`Error::InvalidConfig`] if a collaborator command is empty.
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.commands_are_set()?;
        Ok(conf)
    }

    /// The stock layout with every filesystem path moved under `root`. Executables and
    /// collaborator commands are left alone.
    #[must_use]
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let reroot = |p: &Path| root.join(p.strip_prefix("/").unwrap_or(p));
        let stock = Self::default();
        Self {
            current_host_path: reroot(&stock.current_host_path),
            install_marker_path: reroot(&stock.install_marker_path),
            config_files: stock.config_files.iter().map(|p| reroot(p)).collect(),
            extra_config_dirs: stock.extra_config_dirs.iter().map(|p| reroot(p)).collect(),
            lemon_fragment_path: reroot(&stock.lemon_fragment_path),
            apache_domains_dir: reroot(&stock.apache_domains_dir),
            apache_templates_dir: reroot(&stock.apache_templates_dir),
            certs_dir: reroot(&stock.certs_dir),
            ssl_key_link: reroot(&stock.ssl_key_link),
            ssl_cert_link: reroot(&stock.ssl_cert_link),
            metronome_key_path: reroot(&stock.metronome_key_path),
            ca_dir: reroot(&stock.ca_dir),
            ca_trust_path: reroot(&stock.ca_trust_path),
            required_dirs: stock.required_dirs.iter().map(|p| reroot(p)).collect(),
            schema_path: reroot(&stock.schema_path),
            ..stock
        }
    }

    /// DN of the directory admin account.
    #[must_use]
    pub fn admin_dn(&self) -> String {
        self.dn("cn=admin")
    }

    /// Full DN for an entry `rdn` relative to the base DN.
    #[must_use]
    pub fn dn(&self, rdn: &str) -> String {
        format!("{rdn},{}", self.ldap_base_dn)
    }

    /// Directory holding the web server fragments of `domain`.
    #[must_use]
    pub fn apache_domain_dir(&self, domain: &Domain) -> PathBuf {
        self.apache_domains_dir.join(format!("{domain}.d"))
    }

    fn commands_are_set(&self) -> Result<(), Error> {
        if self.domain_add_command.is_empty() {
            return Err(Error::InvalidConfig("domain_add_command is empty".into()));
        }
        if self.dyndns_subscribe_command.is_empty() {
            return Err(Error::InvalidConfig(
                "dyndns_subscribe_command is empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"default_domain": "example.net", "extra_config_dirs": ["/etc/extra"]}}"#)
            .unwrap();
        let conf = Config::try_from_file(f.path()).unwrap();
        assert_eq!(conf.default_domain.as_str(), "example.net");
        assert_eq!(conf.extra_config_dirs, vec![PathBuf::from("/etc/extra")]);
        assert_eq!(conf.config_files.len(), 6);
        assert_eq!(conf.ldap_base_dn, "dc=yunohost,dc=org");
    }

    #[test]
    fn rejects_bad_default_domain() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"default_domain": "-nope"}}"#).unwrap();
        assert!(matches!(
            Config::try_from_file(f.path()),
            Err(Error::InvalidJSON(_))
        ));
    }

    #[test]
    fn rejects_empty_command() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"domain_add_command": []}}"#).unwrap();
        assert!(matches!(
            Config::try_from_file(f.path()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rooted_at_moves_paths_only() {
        let conf = Config::rooted_at("/stage");
        assert_eq!(
            conf.install_marker_path,
            PathBuf::from("/stage/etc/yunohost/installed")
        );
        assert!(conf.config_files.iter().all(|p| p.starts_with("/stage")));
        assert_eq!(
            conf.hostname_script,
            PathBuf::from("/etc/init.d/hostname.sh")
        );
        assert_eq!(conf.admin_dn(), "cn=admin,dc=yunohost,dc=org");
    }
}
