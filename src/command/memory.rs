use crate::command::{Command, Outcome, Runner};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Records every command instead of running it. Clones share the same history.
///
/// Commands succeed unless their program or one of their arguments equals the configured
/// failure trigger.
#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct RecordingRunner {
    history: Arc<Mutex<Vec<Command>>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    /// A runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner where any command mentioning `trigger` as its program or an argument fails
    /// with exit status 1.
    #[must_use]
    pub fn failing_on(trigger: &str) -> Self {
        Self {
            history: Arc::default(),
            fail_on: Some(trigger.to_string()),
        }
    }

    /// Every command run so far, oldest first.
    pub async fn history(&self) -> Vec<Command> {
        self.history.lock().await.clone()
    }

    fn should_fail(&self, command: &Command) -> bool {
        match &self.fail_on {
            None => false,
            Some(trigger) => {
                command.program == trigger.as_str()
                    || command.args.iter().any(|a| a == trigger.as_str())
            }
        }
    }
}

#[async_trait::async_trait]
impl Runner for RecordingRunner {
    async fn run(&self, command: &Command) -> Outcome {
        self.history.lock().await.push(command.clone());
        if self.should_fail(command) {
            Outcome { code: Some(1) }
        } else {
            Outcome::SUCCESS
        }
    }
}
