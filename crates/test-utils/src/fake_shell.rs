use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use synthkit::errors::Result;
use synthkit::exec::{BoxFuture, CapturedOutput, ShellBackend, ShellRequest};

/// A fake shell backend that:
/// - records every command it was asked to run, in order
/// - returns a configured exit code per command (default 0)
/// - answers `capture` with configured stdout
#[derive(Clone, Default)]
pub struct FakeShell {
    executed: Arc<Mutex<Vec<ShellRequest>>>,
    codes: Arc<Mutex<BTreeMap<String, VecDeque<i32>>>>,
    outputs: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` exits with `code` (every time).
    pub fn exit_with(self, command: &str, code: i32) -> Self {
        self.codes
            .lock()
            .unwrap()
            .insert(command.to_string(), VecDeque::from([code]));
        self
    }

    /// `command` exits with each of `codes` in turn; the last one sticks.
    pub fn exit_sequence(self, command: &str, codes: &[i32]) -> Self {
        self.codes
            .lock()
            .unwrap()
            .insert(command.to_string(), codes.iter().copied().collect());
        self
    }

    pub fn stdout_for(self, command: &str, stdout: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), stdout.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<ShellRequest> {
        self.executed.lock().unwrap().clone()
    }

    fn code_for(&self, command: &str) -> i32 {
        let mut codes = self.codes.lock().unwrap();
        match codes.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(0),
            Some(queue) => queue.front().copied().unwrap_or(0),
            None => 0,
        }
    }
}

impl ShellBackend for FakeShell {
    fn run<'a>(&'a self, request: &'a ShellRequest) -> BoxFuture<'a, Result<i32>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(request.clone());
            Ok(self.code_for(&request.command))
        })
    }

    fn capture<'a>(&'a self, request: &'a ShellRequest) -> BoxFuture<'a, Result<CapturedOutput>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(request.clone());
            let stdout = self
                .outputs
                .lock()
                .unwrap()
                .get(&request.command)
                .cloned()
                .unwrap_or_default();
            Ok(CapturedOutput {
                code: self.code_for(&request.command),
                stdout,
            })
        })
    }
}
