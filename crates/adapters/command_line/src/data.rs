//! Command data provider: runs the command and keeps its latest output.

use std::sync::Arc;
use std::time::Duration;

use crate::error::CommandLineError;
use crate::runner::CommandRunner;

/// Latest output of one command.
///
/// Each [`refresh`](Self::refresh) makes exactly one attempt and overwrites
/// the stored value: the trimmed output on success, `None` on any failure.
pub struct CommandSensorData<R> {
    runner: Arc<R>,
    command: String,
    timeout: Duration,
    value: Option<String>,
}

impl<R: CommandRunner> CommandSensorData<R> {
    pub fn new(runner: Arc<R>, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            command: command.into(),
            timeout,
            value: None,
        }
    }

    /// Output of the last run, `None` if it failed or never ran.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Run the command once. Failures are logged, never returned.
    pub async fn refresh(&mut self) {
        self.value = match self.runner.run(&self.command, self.timeout).await {
            Ok(output) => Some(output),
            Err(err) => {
                log_failure(&self.command, &err);
                None
            }
        };
    }
}

fn log_failure(command: &str, err: &CommandLineError) {
    match err {
        CommandLineError::Failed { stderr, .. } if !stderr.is_empty() => {
            tracing::error!(command, stderr = %stderr, "{err}");
        }
        CommandLineError::Spawn(source) => {
            tracing::error!(command, error = %source, "{err}");
        }
        _ => tracing::error!(command, "{err}"),
    }
}
