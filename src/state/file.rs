//! A file-backed implementation of the [`HostState`][super::HostState] trait.
use crate::config::Config;
use crate::domain::Domain;
use crate::error::Error;
use crate::state::HostState;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// Host state kept in plain files: a one-line domain file, a presence-only marker file and
/// the CA's `serial` and `index.txt`.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileHostState {
    current_host_path: PathBuf,
    install_marker_path: PathBuf,
    ca_dir: PathBuf,
}

impl FileHostState {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            current_host_path: config.current_host_path.clone(),
            install_marker_path: config.install_marker_path.clone(),
            ca_dir: config.ca_dir.clone(),
        }
    }
}

#[async_trait::async_trait]
impl HostState for FileHostState {
    async fn current_domain(&self) -> Result<String, Error> {
        let contents = fs::read_to_string(&self.current_host_path).await?;
        Ok(contents.lines().next().unwrap_or_default().trim().to_string())
    }

    async fn set_current_domain(&mut self, domain: &Domain) -> Result<(), Error> {
        fs::write(&self.current_host_path, format!("{domain}\n")).await?;
        Ok(())
    }

    async fn installed(&self) -> Result<bool, Error> {
        match fs::metadata(&self.install_marker_path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Error::IO(err)),
        }
    }

    async fn mark_installed(&mut self) -> Result<(), Error> {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.install_marker_path)
            .await?;
        Ok(())
    }

    async fn reset_ca_database(&mut self) -> Result<(), Error> {
        fs::write(self.ca_dir.join("serial"), "01\n").await?;
        fs::write(self.ca_dir.join("index.txt"), "").await?;
        Ok(())
    }
}
