use crate::directory::{Attributes, Connector, Directory, Session};
use crate::error::Error;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A directory held in memory. Clones, and every session opened from them, share the same
/// entries.
#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct InMemoryDirectory {
    entries: Arc<Mutex<BTreeMap<String, Attributes>>>,
    open_sessions: Arc<AtomicUsize>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory already holding one entry, typically the admin entry seeded by the
    /// directory server's own configuration.
    #[must_use]
    pub fn with_entry(dn: &str, attrs: Attributes) -> Self {
        let entries = BTreeMap::from([(dn.to_string(), attrs)]);
        Self {
            entries: Arc::new(Mutex::new(entries)),
            ..Self::default()
        }
    }

    /// A copy of every entry, keyed by DN.
    pub async fn entries(&self) -> BTreeMap<String, Attributes> {
        self.entries.lock().await.clone()
    }

    /// Sessions connected but not yet closed.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for InMemoryDirectory {
    async fn connect(&self, _bind_dn: &str, _password: &str) -> Result<Session, Error> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemorySession {
            directory: self.clone(),
            closed: false,
        }))
    }
}

struct InMemorySession {
    directory: InMemoryDirectory,
    closed: bool,
}

#[async_trait::async_trait]
impl Directory for InMemorySession {
    async fn add(&mut self, dn: &str, attrs: &Attributes) -> Result<(), Error> {
        let mut entries = self.directory.entries.lock().await;
        if entries.contains_key(dn) {
            return Err(Error::EntryExists(dn.to_string()));
        }
        entries.insert(dn.to_string(), attrs.clone());
        Ok(())
    }

    async fn update(&mut self, dn: &str, attrs: &Attributes) -> Result<(), Error> {
        let mut entries = self.directory.entries.lock().await;
        let entry = entries
            .get_mut(dn)
            .ok_or_else(|| Error::NoSuchEntry(dn.to_string()))?;
        for (name, values) in attrs {
            entry.insert(name.clone(), values.clone());
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Error> {
        if !self.closed {
            self.closed = true;
            self.directory.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), vec![(*v).to_string()]))
            .collect()
    }

    #[tokio::test]
    async fn add_rejects_duplicates() {
        let dir = InMemoryDirectory::new();
        let mut session = dir.connect("cn=admin", "pw").await.unwrap();
        session.add("ou=users,dc=x", &attrs(&[("ou", "users")])).await.unwrap();
        assert!(matches!(
            session.add("ou=users,dc=x", &attrs(&[("ou", "users")])).await,
            Err(Error::EntryExists(_))
        ));
        session.close().await.unwrap();
        assert_eq!(dir.open_sessions(), 0);
    }

    #[tokio::test]
    async fn update_replaces_named_attributes() {
        let dir = InMemoryDirectory::new();
        let mut session = dir.connect("cn=admin", "pw").await.unwrap();
        session
            .add("cn=admin,dc=x", &attrs(&[("cn", "admin"), ("userPassword", "x")]))
            .await
            .unwrap();
        session
            .update("cn=admin,dc=x", &attrs(&[("loginShell", "/bin/bash")]))
            .await
            .unwrap();
        let entries = dir.entries().await;
        let admin = &entries["cn=admin,dc=x"];
        assert_eq!(admin["userPassword"], vec!["x"]);
        assert_eq!(admin["loginShell"], vec!["/bin/bash"]);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_never_creates_entries() {
        let dir = InMemoryDirectory::new();
        let mut session = dir.connect("cn=admin", "pw").await.unwrap();
        assert!(matches!(
            session
                .update("cn=admin,dc=x", &attrs(&[("loginShell", "/bin/bash")]))
                .await,
            Err(Error::NoSuchEntry(dn)) if dn == "cn=admin,dc=x"
        ));
        assert!(dir.entries().await.is_empty());
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn seeded_entry_can_be_updated() {
        let dir = InMemoryDirectory::with_entry("cn=admin,dc=x", attrs(&[("cn", "admin")]));
        let mut session = dir.connect("cn=admin", "pw").await.unwrap();
        session
            .update("cn=admin,dc=x", &attrs(&[("uidNumber", "1007")]))
            .await
            .unwrap();
        assert_eq!(dir.entries().await["cn=admin,dc=x"].len(), 2);
        session.close().await.unwrap();
    }
}
