//! An [`ldap3`] backed implementation of the [`Directory`][super::Directory] trait.
use crate::directory::{Attributes, Connector, Directory, Session};
use crate::error::Error;
use ldap3::{Ldap, LdapConnAsync, Mod};
use std::collections::HashSet;

const LDAP_NO_SUCH_OBJECT: u32 = 32;
const LDAP_ALREADY_EXISTS: u32 = 68;

/// Connects to the LDAP server at a fixed URL, e.g. `ldap://localhost:389`.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct LdapConnector {
    url: String,
}

impl LdapConnector {
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Connector for LdapConnector {
    async fn connect(&self, bind_dn: &str, password: &str) -> Result<Session, Error> {
        tracing::debug!("connecting to {}", self.url);
        let (conn, mut ldap) = LdapConnAsync::new(&self.url).await?;
        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                tracing::warn!("LDAP connection driver error: {err}");
            }
        });

        tracing::debug!("binding as {bind_dn}");
        ldap.simple_bind(bind_dn, password).await?.success()?;
        Ok(Box::new(LdapSession { ldap }))
    }
}

struct LdapSession {
    ldap: Ldap,
}

#[async_trait::async_trait]
impl Directory for LdapSession {
    async fn add(&mut self, dn: &str, attrs: &Attributes) -> Result<(), Error> {
        let attrs: Vec<(&str, HashSet<&str>)> = attrs
            .iter()
            .map(|(name, values)| (name.as_str(), values.iter().map(String::as_str).collect()))
            .collect();
        let res = self.ldap.add(dn, attrs).await?;
        if res.rc == LDAP_ALREADY_EXISTS {
            return Err(Error::EntryExists(dn.to_string()));
        }
        res.success()?;
        tracing::debug!("added {dn}");
        Ok(())
    }

    async fn update(&mut self, dn: &str, attrs: &Attributes) -> Result<(), Error> {
        let mods: Vec<Mod<&str>> = attrs
            .iter()
            .map(|(name, values)| {
                Mod::Replace(name.as_str(), values.iter().map(String::as_str).collect())
            })
            .collect();
        let res = self.ldap.modify(dn, mods).await?;
        if res.rc == LDAP_NO_SUCH_OBJECT {
            return Err(Error::NoSuchEntry(dn.to_string()));
        }
        res.success()?;
        tracing::debug!("updated {dn}");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.ldap.unbind().await?;
        Ok(())
    }
}
