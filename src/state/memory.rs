use crate::domain::Domain;
use crate::error::Error;
use crate::state::HostState;
use std::io;

/// Host state that lives only as long as the value does.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct InMemoryHostState {
    pub current_domain: Option<String>,
    pub installed: bool,
    pub ca_serial: Option<String>,
    pub ca_index: Option<String>,
}

impl InMemoryHostState {
    #[must_use]
    pub fn with_domain(domain: &str) -> Self {
        Self {
            current_domain: Some(domain.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl HostState for InMemoryHostState {
    async fn current_domain(&self) -> Result<String, Error> {
        self.current_domain
            .as_ref()
            .map(|d| d.trim().to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no current domain").into())
    }

    async fn set_current_domain(&mut self, domain: &Domain) -> Result<(), Error> {
        self.current_domain = Some(domain.to_string());
        Ok(())
    }

    async fn installed(&self) -> Result<bool, Error> {
        Ok(self.installed)
    }

    async fn mark_installed(&mut self) -> Result<(), Error> {
        self.installed = true;
        Ok(())
    }

    async fn reset_ca_database(&mut self) -> Result<(), Error> {
        self.ca_serial = Some("01".to_string());
        self.ca_index = Some(String::new());
        Ok(())
    }
}
