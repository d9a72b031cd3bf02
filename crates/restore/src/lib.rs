//! BoringCache restore step for CI pipelines.
//!
//! The step installs the `boringcache` CLI, restores the requested entries
//! with the primary key, falls back to the ordered restore keys on a miss
//! and reports `cache-hit`, `cache-primary-key` and `cache-matched-key`.
//!
//! ```ignore
//! let env = SystemEnv;
//! let reporter = GitHubReporter::from_env(&env);
//! let runner = ProcessRunner;
//! let installer = CliInstaller::new(&runner, &reporter, &env);
//! let ok = Restorer::new(&runner, &installer, &reporter, &env)
//!     .run(&inputs)
//!     .await;
//! ```

/// CLI argument parsing.
pub mod cli;
/// Installation of the cache CLI.
pub mod installer;
/// Primary and fallback restore flow.
pub mod orchestrator;
/// Messages and outputs for the CI platform.
pub mod reporter;
/// External process execution.
pub mod runner;
/// Scripted collaborators for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
/// Tracing and logging configuration.
pub mod tracing;

pub use installer::{CliInstaller, Installer};
pub use orchestrator::{RestoreOutcome, Restorer, restore_args};
pub use reporter::{GitHubReporter, MemoryReporter, Reporter};
pub use runner::{ExecOptions, ProcessRunner, ToolRunner};
