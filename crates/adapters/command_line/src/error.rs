//! Command-line adapter error types.

use std::time::Duration;

use cmdhub_app::template::TemplateError;
use cmdhub_domain::error::{HubError, ValidationError};

/// Errors specific to the command-line adapter.
#[derive(Debug, thiserror::Error)]
pub enum CommandLineError {
    /// The shell could not be started.
    #[error("error trying to exec command")]
    Spawn(#[source] std::io::Error),

    /// The command did not finish within its timeout and was killed.
    #[error("timeout for command after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The command exited unsuccessfully.
    #[error("command failed (with return code {})", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Failed { code: Option<i32>, stderr: String },

    /// The value template does not parse.
    #[error("invalid value template")]
    Template(#[source] TemplateError),

    /// The sensor configuration violates a domain invariant.
    #[error("invalid sensor configuration")]
    Invalid(#[source] ValidationError),
}

impl From<CommandLineError> for HubError {
    fn from(err: CommandLineError) -> Self {
        match err {
            CommandLineError::Invalid(err) => HubError::Validation(err),
            other => HubError::Integration(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_return_code() {
        let err = CommandLineError::Failed {
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "command failed (with return code 2)");
    }

    #[test]
    fn should_display_missing_return_code_for_signals() {
        let err = CommandLineError::Failed {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "command failed (with return code none)");
    }

    #[test]
    fn should_display_timeout_in_seconds() {
        let err = CommandLineError::Timeout(Duration::from_secs(15));
        assert_eq!(err.to_string(), "timeout for command after 15s");
    }

    #[test]
    fn should_convert_invalid_config_to_validation_error() {
        let err: HubError = CommandLineError::Invalid(ValidationError::EmptyCommand).into();
        assert!(matches!(
            err,
            HubError::Validation(ValidationError::EmptyCommand)
        ));
    }

    #[test]
    fn should_convert_spawn_error_to_integration_error() {
        let err: HubError = CommandLineError::Spawn(std::io::Error::other("nope")).into();
        assert!(matches!(err, HubError::Integration(_)));
    }
}
