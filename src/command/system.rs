//! A [`Runner`][super::Runner] backed by real processes.
use crate::command::{Command, Outcome, Runner};

/// Spawns each command with inherited stdio and waits for it to exit.
#[derive(Default, Debug, Clone, Copy)]
#[allow(clippy::module_name_repetitions)]
pub struct SystemRunner;

#[async_trait::async_trait]
impl Runner for SystemRunner {
    async fn run(&self, command: &Command) -> Outcome {
        let status = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .status()
            .await;
        match status {
            Ok(status) => Outcome {
                code: status.code(),
            },
            Err(err) => {
                tracing::warn!("unable to spawn `{command}`: {err}");
                Outcome { code: None }
            }
        }
    }
}
