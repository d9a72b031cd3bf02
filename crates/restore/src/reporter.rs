//! Pipeline-facing messages and step outputs.
//!
//! [`GitHubReporter`] speaks the GitHub Actions workflow-command protocol:
//! annotations on stdout, outputs appended to `$GITHUB_OUTPUT`, extra `PATH`
//! entries appended to `$GITHUB_PATH`.

// Workflow commands are read from stdout by the runner.
#![allow(clippy::print_stdout)]

use boringcache_core::env::{GITHUB_OUTPUT, GITHUB_PATH};
use boringcache_core::{EnvProvider, Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Channel back to the CI platform.
pub trait Reporter: Send + Sync {
    /// Informational log line.
    fn info(&self, message: &str);

    /// Non-fatal warning annotation.
    fn warning(&self, message: &str);

    /// Fatal failure. The caller stops after reporting it.
    fn set_failed(&self, message: &str);

    /// Hide a secret value from all later log output.
    fn mask(&self, secret: &str);

    /// Set several step outputs at once.
    ///
    /// Either every output is written or none is.
    fn set_outputs(&self, outputs: &[(&str, &str)]) -> Result<()>;

    /// Set a step output.
    fn set_output(&self, name: &str, value: &str) -> Result<()> {
        self.set_outputs(&[(name, value)])
    }

    /// Prepend a directory to `PATH` for later steps.
    fn add_path(&self, dir: &Path) -> Result<()>;
}

/// Escape data for a workflow command.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

fn append_line(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(e, path, "open"))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(e, path, "append"))
}

/// Reporter for GitHub Actions runners.
#[derive(Debug, Clone, Default)]
pub struct GitHubReporter {
    output_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
}

impl GitHubReporter {
    /// Create a reporter writing to the given command files.
    #[must_use]
    pub fn new(output_file: Option<PathBuf>, path_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            path_file,
        }
    }

    /// Create a reporter from `GITHUB_OUTPUT` / `GITHUB_PATH`.
    #[must_use]
    pub fn from_env(env: &dyn EnvProvider) -> Self {
        Self::new(
            env.var(GITHUB_OUTPUT).map(PathBuf::from),
            env.var(GITHUB_PATH).map(PathBuf::from),
        )
    }
}

impl Reporter for GitHubReporter {
    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn warning(&self, message: &str) {
        println!("::warning::{}", escape_data(message));
    }

    fn set_failed(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }

    fn mask(&self, secret: &str) {
        println!("::add-mask::{}", escape_data(secret));
    }

    fn set_outputs(&self, outputs: &[(&str, &str)]) -> Result<()> {
        let Some(file) = &self.output_file else {
            for (name, value) in outputs {
                println!(
                    "::set-output name={}::{}",
                    escape_property(name),
                    escape_data(value)
                );
            }
            return Ok(());
        };

        // One append for the whole batch.
        let records: String = outputs
            .iter()
            .map(|(name, value)| {
                let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
                format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
            })
            .collect();
        append_line(file, &records)
    }

    fn add_path(&self, dir: &Path) -> Result<()> {
        let Some(file) = &self.path_file else {
            println!("::add-path::{}", escape_data(&dir.display().to_string()));
            return Ok(());
        };
        append_line(file, &format!("{}\n", dir.display()))
    }
}

/// One message recorded by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// [`Reporter::info`]
    Info(String),
    /// [`Reporter::warning`]
    Warning(String),
    /// [`Reporter::set_failed`]
    Failed(String),
    /// [`Reporter::mask`]
    Mask(String),
    /// One step output.
    Output {
        /// Output name
        name: String,
        /// Output value
        value: String,
    },
    /// [`Reporter::add_path`]
    AddPath(PathBuf),
}

/// Reporter that records everything in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    /// Create an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Step outputs as `(name, value)` pairs.
    #[must_use]
    pub fn outputs(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Output { name, value } => Some((name, value)),
                _ => None,
            })
            .collect()
    }

    /// Value of one step output, if it was set.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<String> {
        self.outputs()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Failure messages.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Failed(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Warning messages.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Warning(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.record(ReportEvent::Info(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.record(ReportEvent::Warning(message.to_string()));
    }

    fn set_failed(&self, message: &str) {
        self.record(ReportEvent::Failed(message.to_string()));
    }

    fn mask(&self, secret: &str) {
        self.record(ReportEvent::Mask(secret.to_string()));
    }

    fn set_outputs(&self, outputs: &[(&str, &str)]) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.extend(outputs.iter().map(|(name, value)| ReportEvent::Output {
                name: (*name).to_string(),
                value: (*value).to_string(),
            }));
        }
        Ok(())
    }

    fn add_path(&self, dir: &Path) -> Result<()> {
        self.record(ReportEvent::AddPath(dir.to_path_buf()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boringcache_core::MapEnv;
    use tempfile::TempDir;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\nnext"), "50%25 done%0Anext");
        assert_eq!(escape_property("a:b,c"), "a%3Ab%2Cc");
    }

    #[test]
    fn test_outputs_are_appended_with_delimiters() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output");
        let reporter = GitHubReporter::new(Some(output.clone()), None);

        reporter.set_output("cache-hit", "true").unwrap();
        reporter.set_output("cache-matched-key", "").unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("cache-hit<<ghadelimiter_"));
        assert_eq!(lines[1], "true");
        assert_eq!(lines[2], lines[0].trim_start_matches("cache-hit<<"));
        assert!(lines[3].starts_with("cache-matched-key<<ghadelimiter_"));
        assert_eq!(lines[4], "");
    }

    #[test]
    fn test_output_batch_is_one_append() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output");
        std::fs::write(&output, "earlier<<EOF\nx\nEOF\n").unwrap();
        let reporter = GitHubReporter::new(Some(output.clone()), None);

        reporter
            .set_outputs(&[
                ("cache-hit", "true"),
                ("cache-primary-key", "deps"),
                ("cache-matched-key", "deps"),
            ])
            .unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let names: Vec<&str> = content
            .lines()
            .filter_map(|l| l.split_once("<<").map(|(name, _)| name))
            .collect();
        assert_eq!(
            names,
            vec!["earlier", "cache-hit", "cache-primary-key", "cache-matched-key"]
        );
    }

    #[test]
    fn test_failed_output_batch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let reporter = GitHubReporter::new(Some(dir.path().to_path_buf()), None);

        let err = reporter
            .set_outputs(&[("cache-hit", "true"), ("cache-primary-key", "deps")])
            .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_add_path_appends_directory() {
        let dir = TempDir::new().unwrap();
        let path_file = dir.path().join("path");
        let env = MapEnv::new().with_var(GITHUB_PATH, path_file.display().to_string());
        let reporter = GitHubReporter::from_env(&env);

        reporter.add_path(Path::new("/opt/boringcache/bin")).unwrap();

        let content = std::fs::read_to_string(&path_file).unwrap();
        assert_eq!(content, "/opt/boringcache/bin\n");
    }

    #[test]
    fn test_unwritable_output_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let reporter = GitHubReporter::new(Some(dir.path().join("missing/output")), None);
        let err = reporter.set_output("cache-hit", "false").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_memory_reporter_records_in_order() {
        let reporter = MemoryReporter::new();
        reporter.info("hello");
        reporter.warning("careful");
        reporter.set_output("cache-hit", "false").unwrap();
        reporter.set_failed("boom");

        assert_eq!(reporter.events().len(), 4);
        assert_eq!(reporter.warnings(), vec!["careful"]);
        assert_eq!(reporter.failures(), vec!["boom"]);
        assert_eq!(reporter.output("cache-hit").as_deref(), Some("false"));
        assert_eq!(reporter.output("cache-primary-key"), None);
    }
}
