//! Command execution: the process boundary of the adapter.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;

use crate::error::CommandLineError;

/// Runs a command string and returns its trimmed standard output.
pub trait CommandRunner: Send + Sync + 'static {
    /// Run `command`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails with [`CommandLineError::Spawn`], [`CommandLineError::Timeout`]
    /// or [`CommandLineError::Failed`] (non-zero exit).
    fn run(
        &self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, CommandLineError>> + Send;
}

/// Runs commands through `sh -c`.
///
/// The child inherits the daemon's environment and working directory, gets
/// no stdin, and is killed when its timeout elapses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str, timeout: Duration) -> Result<String, CommandLineError> {
        tracing::debug!(command, timeout_secs = timeout.as_secs(), "running command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).kill_on_drop(true);

        // dropping the output future on timeout kills the child
        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| CommandLineError::Timeout(timeout))?
            .map_err(CommandLineError::Spawn)?;

        if !output.status.success() {
            return Err(CommandLineError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn should_capture_trimmed_stdout() {
        let out = ShellCommandRunner.run("echo '  ON  '", TIMEOUT).await.unwrap();
        assert_eq!(out, "ON");
    }

    #[tokio::test]
    async fn should_run_through_shell() {
        let out = ShellCommandRunner
            .run("printf 'a\\nb\\n' | wc -l | tr -d ' '", TIMEOUT)
            .await
            .unwrap();
        assert_eq!(out, "2");
    }

    #[tokio::test]
    async fn should_report_non_zero_exit() {
        let err = ShellCommandRunner
            .run("echo oops >&2; exit 3", TIMEOUT)
            .await
            .unwrap_err();
        match err {
            CommandLineError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_time_out_slow_command() {
        let err = ShellCommandRunner
            .run("sleep 5", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandLineError::Timeout(_)));
    }
}
