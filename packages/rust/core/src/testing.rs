//! Scripted [`ToolRunner`] for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use ontodocs_shared::Result;

use crate::runner::{Invocation, ToolExit, ToolRunner};

type Script = dyn Fn(&Invocation) -> Result<ToolExit> + Send + Sync;

/// Answers every invocation from a closure and records what it was asked to run.
pub(crate) struct FakeRunner {
    script: Box<Script>,
    calls: Mutex<Vec<Invocation>>,
    limits: Mutex<Vec<Duration>>,
}

impl FakeRunner {
    pub(crate) fn new(script: impl Fn(&Invocation) -> Result<ToolExit> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            limits: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Time limit passed with each call, in call order.
    pub(crate) fn limits(&self) -> Vec<Duration> {
        self.limits.lock().unwrap().clone()
    }
}

impl ToolRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation, limit: Duration) -> Result<ToolExit> {
        self.calls.lock().unwrap().push(invocation.clone());
        self.limits.lock().unwrap().push(limit);
        (self.script)(invocation)
    }
}

/// A clean exit with the given stderr.
pub(crate) fn exited(code: i32, stderr: &str) -> ToolExit {
    ToolExit::Exited {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
