//! Scripted collaborators for tests.
//!
//! [`FakeRunner`] records every invocation and answers `restore` calls from a
//! queue of exit codes; [`FakeInstaller`] stands in for the CLI installer.

use crate::installer::{Installer, TOOL_BINARY};
use crate::runner::{ExecOptions, ToolOutput, ToolRunner};
use async_trait::async_trait;
use boringcache_core::{Error, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Program as passed to the runner.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<String>,
    /// Extra environment given to the child.
    pub env: Vec<(String, String)>,
}

/// [`ToolRunner`] that never spawns anything.
#[derive(Debug, Default)]
pub struct FakeRunner {
    versions: HashMap<String, String>,
    failing: HashSet<String>,
    restore_codes: Mutex<VecDeque<i32>>,
    default_code: i32,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    /// Runner where every `restore` exits 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `restore` calls with these exit codes, in order.
    #[must_use]
    pub fn with_exit_codes(self, codes: impl IntoIterator<Item = i32>) -> Self {
        if let Ok(mut queue) = self.restore_codes.lock() {
            queue.extend(codes);
        }
        self
    }

    /// Exit code once the scripted codes run out.
    #[must_use]
    pub fn with_default_exit_code(mut self, code: i32) -> Self {
        self.default_code = code;
        self
    }

    /// `boringcache --version` on `PATH` reports `output`.
    #[must_use]
    pub fn with_version(self, output: &str) -> Self {
        self.with_version_for(TOOL_BINARY, output)
    }

    /// `<program> --version` reports `output`.
    #[must_use]
    pub fn with_version_for(mut self, program: &str, output: &str) -> Self {
        self.versions.insert(program.to_string(), output.to_string());
        self
    }

    /// Invocations of `program` fail to spawn.
    #[must_use]
    pub fn failing_program(mut self, program: &str) -> Self {
        self.failing.insert(program.to_string());
        self
    }

    /// Every recorded call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Calls whose program is `program`.
    #[must_use]
    pub fn calls_to(&self, program: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    /// Argument vectors of every `restore` call.
    #[must_use]
    pub fn restore_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.args.first().is_some_and(|a| a == "restore"))
            .map(|c| c.args)
            .collect()
    }

    fn record(&self, tool: &Path, args: &[String], env: &[(String, String)]) -> String {
        let program = tool.display().to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                program: program.clone(),
                args: args.to_vec(),
                env: env.to_vec(),
            });
        }
        program
    }

    fn next_code(&self) -> i32 {
        self.restore_codes
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(self.default_code)
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn exec_tool(
        &self,
        tool: &Path,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<i32> {
        let program = self.record(tool, args, &options.env);
        if self.failing.contains(&program) {
            return Err(Error::exec(program, "Installation failed"));
        }

        let code = if args.first().is_some_and(|a| a == "restore") {
            self.next_code()
        } else {
            0
        };
        if code != 0 && !options.ignore_non_zero {
            return Err(Error::exec(program, format!("exited with code {code}")));
        }
        Ok(code)
    }

    async fn capture(&self, tool: &Path, args: &[String]) -> Result<ToolOutput> {
        let program = self.record(tool, args, &[]);
        match self.versions.get(&program) {
            Some(stdout) => Ok(ToolOutput {
                code: 0,
                stdout: stdout.clone(),
            }),
            None => Err(Error::exec(program, "No such file or directory")),
        }
    }
}

/// [`Installer`] that succeeds or fails without touching anything.
#[derive(Debug, Default)]
pub struct FakeInstaller {
    failure: Option<String>,
    requested: Mutex<Vec<String>>,
}

impl FakeInstaller {
    /// Installer that always succeeds with `boringcache` on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installer that always fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            requested: Mutex::default(),
        }
    }

    /// Versions requested so far.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Installer for FakeInstaller {
    async fn ensure_tool(&self, version: &str) -> Result<PathBuf> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(version.to_string());
        }
        match &self.failure {
            Some(message) => Err(Error::installation(message.clone())),
            None => Ok(PathBuf::from(TOOL_BINARY)),
        }
    }
}
