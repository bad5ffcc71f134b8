//! Test doubles shared by the adapter's unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::CommandLineError;
use crate::runner::CommandRunner;

/// Replays canned results in order and records every call.
///
/// Once the script runs out, every call times out.
#[derive(Default)]
pub struct FakeRunner {
    results: Mutex<Vec<Result<String, CommandLineError>>>,
    pub calls: Mutex<Vec<(String, Duration)>>,
}

impl FakeRunner {
    pub fn scripted(mut results: Vec<Result<String, CommandLineError>>) -> Self {
        results.reverse();
        Self {
            results: Mutex::new(results),
            calls: Mutex::default(),
        }
    }

    pub fn returning(results: Vec<Result<String, CommandLineError>>) -> Arc<Self> {
        Arc::new(Self::scripted(results))
    }

    pub fn outputs(outputs: &[&str]) -> Arc<Self> {
        Self::returning(ok_all(outputs))
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, command: &str, timeout: Duration) -> Result<String, CommandLineError> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), timeout));
        self.results
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(CommandLineError::Timeout(timeout)))
    }
}

pub fn failed() -> Result<String, CommandLineError> {
    Err(CommandLineError::Failed {
        code: Some(1),
        stderr: "boom".to_string(),
    })
}

pub fn ok_all(outputs: &[&str]) -> Vec<Result<String, CommandLineError>> {
    outputs.iter().map(|o| Ok((*o).to_string())).collect()
}
