//! External process execution.
//!
//! Every call to the cache CLI (and the installer's helper processes) goes
//! through [`ToolRunner`]. Calls are awaited one at a time; nothing here
//! spawns work in the background.

use async_trait::async_trait;
use boringcache_core::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// How a tool invocation should behave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Report a non-zero exit as a plain exit code instead of an error.
    pub ignore_non_zero: bool,
    /// Discard the child's stdout and stderr.
    pub silent: bool,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

impl ExecOptions {
    /// Options for a cache CLI call whose exit code signals hit or miss.
    #[must_use]
    pub fn ignore_exit_code() -> Self {
        Self {
            ignore_non_zero: true,
            ..Self::default()
        }
    }
}

/// Captured result of a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `1` when the child was killed by a signal.
    pub code: i32,
    /// Captured stdout, trimmed.
    pub stdout: String,
}

/// Runs external programs.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `tool` with `args` and return its exit code.
    async fn exec_tool(&self, tool: &Path, args: &[String], options: &ExecOptions)
    -> Result<i32>;

    /// Run `tool` with `args`, capturing stdout. Never fails on a non-zero exit.
    async fn capture(&self, tool: &Path, args: &[String]) -> Result<ToolOutput>;
}

/// [`ToolRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

fn exec_error(tool: &Path, err: &std::io::Error) -> Error {
    Error::exec(tool.display().to_string(), err.to_string())
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn exec_tool(
        &self,
        tool: &Path,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<i32> {
        tracing::debug!(tool = %tool.display(), ?args, "Executing tool");

        let mut cmd = Command::new(tool);
        cmd.args(args)
            .envs(options.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null());
        if options.silent {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let status = cmd.status().await.map_err(|e| exec_error(tool, &e))?;
        let code = status.code().unwrap_or(1);
        tracing::debug!(tool = %tool.display(), code, "Tool exited");

        if code != 0 && !options.ignore_non_zero {
            return Err(Error::exec(
                tool.display().to_string(),
                format!("exited with code {code}"),
            ));
        }
        Ok(code)
    }

    async fn capture(&self, tool: &Path, args: &[String]) -> Result<ToolOutput> {
        let output = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| exec_error(tool, &e))?;

        Ok(ToolOutput {
            code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        })
    }
}
