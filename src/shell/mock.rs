//! Scripted command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning anything.
//! Responses are registered per program name (the file name of the
//! program path), and every invocation is recorded for later assertion.
//!
//! # Example
//!
//! ```
//! use tracker_setup::shell::{CommandRunner, CommandSpec, MockResponse, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.on("python3", MockResponse::ok("Python 3.10.4\n"));
//!
//! let result = runner.run(&CommandSpec::new("/usr/bin/python3").arg("--version")).unwrap();
//! assert!(result.stdout.contains("3.10.4"));
//! assert_eq!(runner.calls_to("python3").len(), 1);
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::error::{Result, SetupError};

use super::command::{CommandResult, CommandRunner, CommandSpec};

/// A canned process outcome.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Exit code; `None` simulates death by signal.
    pub exit_code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl MockResponse {
    /// Exit 0 with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Exit with `code` and the given stderr.
    pub fn fail(code: i32, stderr: &str) -> Self {
        Self {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn into_result(self) -> CommandResult {
        if self.exit_code == Some(0) {
            CommandResult::success(self.stdout, self.stderr, Duration::ZERO)
        } else {
            CommandResult::failure(self.exit_code, self.stdout, self.stderr, Duration::ZERO)
        }
    }
}

/// Command runner that replays scripted responses.
///
/// Programs with no registered response fail to spawn with
/// `ErrorKind::NotFound`, the same way a missing binary does.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: RefCell<HashMap<String, MockResponse>>,
    queues: RefCell<HashMap<String, VecDeque<MockResponse>>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl MockRunner {
    /// Create a runner with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to every call of `program` with `response`.
    pub fn on(&self, program: &str, response: MockResponse) {
        self.responses
            .borrow_mut()
            .insert(program.to_string(), response);
    }

    /// Respond to successive calls of `program` in order.
    ///
    /// After the queue is exhausted, falls back to the response set with
    /// [`on`](Self::on).
    pub fn queue(&self, program: &str, responses: Vec<MockResponse>) {
        self.queues
            .borrow_mut()
            .insert(program.to_string(), responses.into());
    }

    /// All recorded invocations in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Recorded invocations of one program.
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program_name() == program)
            .cloned()
            .collect()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        self.calls.borrow_mut().push(spec.clone());
        let name = spec.program_name();

        if let Some(queue) = self.queues.borrow_mut().get_mut(&name) {
            if let Some(response) = queue.pop_front() {
                return Ok(response.into_result());
            }
        }

        match self.responses.borrow().get(&name) {
            Some(response) => Ok(response.clone().into_result()),
            None => Err(SetupError::CommandSpawn {
                command: spec.display(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            }),
        }
    }
}
