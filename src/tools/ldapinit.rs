use crate::directory::{self, Attributes, Schema, Session};
use crate::error::Error;
use crate::tools::Tools;

/// The admin account written after the schema entries. `uidNumber`/`gidNumber` 1007 are
/// reserved for it.
#[must_use]
pub fn admin_entry() -> Attributes {
    let single = |k: &str, v: &str| (k.to_string(), vec![v.to_string()]);
    [
        single("cn", "admin"),
        single("uid", "admin"),
        single("description", "LDAP Administrator"),
        single("gidNumber", "1007"),
        single("uidNumber", "1007"),
        single("homeDirectory", "/home/admin"),
        single("loginShell", "/bin/bash"),
        (
            "objectClass".to_string(),
            vec![
                "organizationalRole".to_string(),
                "posixAccount".to_string(),
                "simpleSecurityObject".to_string(),
            ],
        ),
    ]
    .into_iter()
    .collect()
}

impl Tools {
    /// Create the base directory tree described by the schema file, then write the admin
    /// account entry. Binds as the admin with `password` and releases the session before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] or [`Error::InvalidJSON`] if the schema file can't be loaded,
    /// [`Error::EntryExists`] if a schema entry is already present, [`Error::NoSuchEntry`]
    /// if the admin entry doesn't exist, and [`Error::Ldap`] for any other directory failure. Entries created before the failure are kept.
    pub async fn initialize_directory(&self, password: &str) -> Result<(), Error> {
        let schema = Schema::try_from_file(&self.config.schema_path)?;
        let mut session = self
            .directory
            .connect(&self.config.admin_dn(), password)
            .await?;
        let res = self.populate_directory(&mut session, &schema).await;
        directory::release(session, res).await
    }

    pub(crate) async fn populate_directory(
        &self,
        session: &mut Session,
        schema: &Schema,
    ) -> Result<(), Error> {
        let mut added = 0usize;
        for (rdn, attrs) in schema.entries() {
            session.add(&self.config.dn(rdn), attrs).await?;
            added += 1;
        }
        session.update(&self.config.admin_dn(), &admin_entry()).await?;
        tracing::info!("added {added} schema entries, updated {}", self.config.admin_dn());
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

    fn tools_with(dir: &InMemoryDirectory, schema_path: &std::path::Path) -> Tools {
        let config = Config {
            schema_path: schema_path.to_path_buf(),
            ..Config::default()
        };
        Tools::new(
            Arc::new(config),
            Arc::new(RecordingRunner::new()),
            Arc::new(RwLock::new(InMemoryHostState::default())),
            Arc::new(dir.clone()),
        )
    }

    /// The admin entry as the directory server's own configuration seeds it.
    fn seeded_directory() -> InMemoryDirectory {
        let rootdn: Attributes = [
            ("cn", vec!["admin"]),
            ("objectClass", vec!["organizationalRole", "simpleSecurityObject"]),
            ("userPassword", vec!["yunohost"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect();
        InMemoryDirectory::with_entry("cn=admin,dc=yunohost,dc=org", rootdn)
    }

    fn write_schema(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("ldap_scheme.json");
        std::fs::write(&path, include_str!("../../data/ldap_scheme.json")).unwrap();
        path
    }

    #[tokio::test]
    async fn creates_schema_then_admin() {
        let tmp = tempfile::tempdir().unwrap();
        let directory = seeded_directory();
        let tools = tools_with(&directory, &write_schema(&tmp));

        tools.initialize_directory("yunohost").await.unwrap();

        let entries = directory.entries().await;
        assert!(entries.contains_key("ou=users,dc=yunohost,dc=org"));
        assert!(entries.contains_key("cn=admins,ou=groups,dc=yunohost,dc=org"));
        let admin = &entries["cn=admin,dc=yunohost,dc=org"];
        assert_eq!(admin["uidNumber"], vec!["1007"]);
        assert_eq!(admin["objectClass"].len(), 3);
        assert_eq!(admin["userPassword"], vec!["yunohost"]);
        assert_eq!(directory.open_sessions(), 0);
    }

    #[tokio::test]
    async fn missing_admin_entry_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let directory = InMemoryDirectory::new();
        let tools = tools_with(&directory, &write_schema(&tmp));

        let err = tools.initialize_directory("yunohost").await.unwrap_err();
        assert!(matches!(err, Error::NoSuchEntry(dn) if dn == "cn=admin,dc=yunohost,dc=org"));
        assert!(!directory
            .entries()
            .await
            .contains_key("cn=admin,dc=yunohost,dc=org"));
        assert_eq!(directory.open_sessions(), 0);
    }

    #[tokio::test]
    async fn duplicate_entry_is_fatal_and_session_released() {
        let tmp = tempfile::tempdir().unwrap();
        let directory = seeded_directory();
        let tools = tools_with(&directory, &write_schema(&tmp));

        tools.initialize_directory("yunohost").await.unwrap();
        let err = tools.initialize_directory("yunohost").await.unwrap_err();
        assert!(matches!(err, Error::EntryExists(_)));
        assert_eq!(directory.open_sessions(), 0);
    }

    #[tokio::test]
    async fn missing_schema_never_connects() {
        let tmp = tempfile::tempdir().unwrap();
        let directory = InMemoryDirectory::new();
        let tools = tools_with(&directory, &tmp.path().join("absent.json"));

        assert!(matches!(
            tools.initialize_directory("yunohost").await,
            Err(Error::IO(_))
        ));
        assert!(directory.entries().await.is_empty());
    }
}
