//! Restore flow: primary entries first, then fallback keys in order.

use crate::installer::Installer;
use crate::reporter::Reporter;
use crate::runner::{ExecOptions, ToolRunner};
use boringcache_core::env::BORINGCACHE_API_TOKEN;
use boringcache_core::{
    CACHE_MISS_MESSAGE, CONFLICTING_SHAPES_WARNING, CacheEntry, EnvProvider, Error, Inputs,
    PathResolver, Platform, Result, derive_entries, entries_to_string, primary_key,
    resolve_workspace, validate,
};
use std::path::Path;
use tracing::{debug, info, instrument};

/// `"true"` or `"false"`.
pub const OUTPUT_CACHE_HIT: &str = "cache-hit";
/// Joined tags of the primary entries when they hit.
pub const OUTPUT_PRIMARY_KEY: &str = "cache-primary-key";
/// Key that produced the hit.
pub const OUTPUT_MATCHED_KEY: &str = "cache-matched-key";

/// Result of one restore run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Any key restored something.
    pub cache_hit: bool,
    /// Comma-joined tags of the primary entries. Empty unless they hit.
    pub primary_key: String,
    /// Key that produced the hit, primary or fallback. Empty on a miss.
    pub matched_key: String,
}

impl RestoreOutcome {
    fn miss() -> Self {
        Self::default()
    }
}

/// Drives the installer and the cache CLI for one run.
pub struct Restorer<'a> {
    runner: &'a dyn ToolRunner,
    installer: &'a dyn Installer,
    reporter: &'a dyn Reporter,
    env: &'a dyn EnvProvider,
    platform: Platform,
}

impl<'a> Restorer<'a> {
    /// Create a restorer for the current platform.
    #[must_use]
    pub fn new(
        runner: &'a dyn ToolRunner,
        installer: &'a dyn Installer,
        reporter: &'a dyn Reporter,
        env: &'a dyn EnvProvider,
    ) -> Self {
        Self {
            runner,
            installer,
            reporter,
            env,
            platform: Platform::current(),
        }
    }

    /// Use a fixed platform for key suffixes.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Run the action end to end and report the result.
    ///
    /// Every error is reported once through [`Reporter::set_failed`]; outputs
    /// are only written when the restore completed. Returns `false` when the
    /// run failed.
    pub async fn run(&self, inputs: &Inputs) -> bool {
        if let Some(token) = self.env.var(BORINGCACHE_API_TOKEN) {
            self.reporter.mask(&token);
        }

        let result = match self.restore(inputs).await {
            Ok(outcome) => self.write_outputs(&outcome),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(Error::CacheMiss) => {
                self.reporter.set_failed(CACHE_MISS_MESSAGE);
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Cache restore failed");
                self.reporter
                    .set_failed(&format!("Cache restore failed: {e}"));
                false
            }
        }
    }

    /// Restore the cache without writing outputs.
    ///
    /// Fails with [`Error::CacheMiss`] when nothing hit and
    /// `fail_on_cache_miss` is set.
    #[instrument(skip_all)]
    pub async fn restore(&self, inputs: &Inputs) -> Result<RestoreOutcome> {
        let resolution = validate(inputs)?;
        if resolution.conflicting {
            self.reporter.warning(CONFLICTING_SHAPES_WARNING);
        }

        let key_suffix = self.key_suffix(inputs);
        let resolver = PathResolver::from_env(self.env);
        let entries = derive_entries(&resolution.shape, &key_suffix, &resolver)?;
        let workspace = resolve_workspace(inputs, self.env);
        debug!(%workspace, entries = entries.len(), "Inputs normalised");

        let tool = self.installer.ensure_tool(&inputs.cli_version).await?;

        let entry_string = entries_to_string(&entries);
        self.reporter
            .info(&format!("Attempting to restore cache entries: {entry_string}"));

        let outcome = if self
            .attempt(&tool, &workspace, &entry_string, inputs)
            .await?
        {
            self.reporter.info("Cache hit with primary entries");
            let key = primary_key(&entries);
            RestoreOutcome {
                cache_hit: true,
                primary_key: key.clone(),
                matched_key: key,
            }
        } else {
            self.reporter.info("Cache miss with primary entries");
            self.restore_fallback(&tool, &workspace, &entries, &key_suffix, inputs)
                .await?
        };

        if inputs.fail_on_cache_miss && !outcome.cache_hit {
            return Err(Error::CacheMiss);
        }
        Ok(outcome)
    }

    /// Try each restore key in order, stopping at the first hit.
    ///
    /// Only the first entry's path takes part in fallback restores.
    async fn restore_fallback(
        &self,
        tool: &Path,
        workspace: &str,
        entries: &[CacheEntry],
        key_suffix: &str,
        inputs: &Inputs,
    ) -> Result<RestoreOutcome> {
        let restore_keys = inputs.restore_key_list();
        let Some(first) = entries.first() else {
            return Ok(RestoreOutcome::miss());
        };
        if restore_keys.is_empty() {
            return Ok(RestoreOutcome::miss());
        }

        self.reporter.info("Trying restore keys...");
        for restore_key in restore_keys {
            let full_key = format!("{restore_key}{key_suffix}");
            let fallback = CacheEntry {
                tag: full_key.clone(),
                path: first.path.clone(),
            };
            let fallback = fallback.to_string();

            self.reporter
                .info(&format!("Attempting restore key: {fallback}"));
            if self.attempt(tool, workspace, &fallback, inputs).await? {
                self.reporter
                    .info(&format!("Cache hit with restore key: {full_key}"));
                return Ok(RestoreOutcome {
                    cache_hit: true,
                    primary_key: String::new(),
                    matched_key: full_key,
                });
            }
        }

        Ok(RestoreOutcome::miss())
    }

    /// One `boringcache restore` call. `true` on exit code 0.
    async fn attempt(
        &self,
        tool: &Path,
        workspace: &str,
        entry_string: &str,
        inputs: &Inputs,
    ) -> Result<bool> {
        let args = restore_args(workspace, entry_string, inputs);
        let code = self
            .runner
            .exec_tool(tool, &args, &ExecOptions::ignore_exit_code())
            .await?;
        info!(code, entries = %entry_string, "Restore attempt finished");
        Ok(code == 0)
    }

    fn key_suffix(&self, inputs: &Inputs) -> String {
        self.platform
            .suffix(inputs.enable_platform_suffix, inputs.enable_cross_os_archive)
    }

    fn write_outputs(&self, outcome: &RestoreOutcome) -> Result<()> {
        let cache_hit = outcome.cache_hit.to_string();
        self.reporter.set_outputs(&[
            (OUTPUT_CACHE_HIT, cache_hit.as_str()),
            (OUTPUT_PRIMARY_KEY, outcome.primary_key.as_str()),
            (OUTPUT_MATCHED_KEY, outcome.matched_key.as_str()),
        ])
    }
}

/// Arguments for `boringcache restore`.
#[must_use]
pub fn restore_args(workspace: &str, entry_string: &str, inputs: &Inputs) -> Vec<String> {
    let mut args = vec![
        "restore".to_string(),
        workspace.to_string(),
        entry_string.to_string(),
    ];
    if inputs.wants_no_platform() {
        args.push("--no-platform".to_string());
    }
    if inputs.fail_on_cache_miss {
        args.push("--fail-on-cache-miss".to_string());
    }
    if inputs.lookup_only {
        args.push("--lookup-only".to_string());
    }
    if inputs.verbose {
        args.push("--verbose".to_string());
    }
    args
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::reporter::{GitHubReporter, MemoryReporter, ReportEvent};
    use crate::test_utils::{FakeInstaller, FakeRunner};
    use boringcache_core::{Arch, MapEnv, Os};

    fn env() -> MapEnv {
        MapEnv::new()
            .with_home("/home/runner")
            .with_cwd("/work/repo")
    }

    fn cli_inputs(entries: &str) -> Inputs {
        Inputs {
            cli_version: "v1.0.0".into(),
            workspace: Some("my-org/my-project".into()),
            entries: Some(entries.into()),
            ..Inputs::default()
        }
    }

    #[test]
    fn test_restore_args_flags() {
        let inputs = Inputs {
            enable_cross_os_archive: true,
            fail_on_cache_miss: true,
            lookup_only: true,
            verbose: true,
            ..Inputs::default()
        };
        assert_eq!(
            restore_args("a/b", "t:/p", &inputs),
            vec![
                "restore",
                "a/b",
                "t:/p",
                "--no-platform",
                "--fail-on-cache-miss",
                "--lookup-only",
                "--verbose"
            ]
        );

        let inputs = Inputs {
            no_platform: true,
            ..Inputs::default()
        };
        assert_eq!(
            restore_args("a/b", "t:/p", &inputs),
            vec!["restore", "a/b", "t:/p", "--no-platform"]
        );
        assert_eq!(
            restore_args("a/b", "t:/p", &Inputs::default()),
            vec!["restore", "a/b", "t:/p"]
        );
    }

    #[tokio::test]
    async fn test_primary_hit_skips_restore_keys() {
        let runner = FakeRunner::new().with_exit_codes([0]);
        let installer = FakeInstaller::new();
        let reporter = MemoryReporter::new();
        let env = env();
        let restorer = Restorer::new(&runner, &installer, &reporter, &env);

        let inputs = Inputs {
            restore_keys: Some("v1-".into()),
            ..cli_inputs("deps:node_modules,build:dist")
        };
        let outcome = restorer.restore(&inputs).await.unwrap();

        assert!(outcome.cache_hit);
        assert_eq!(outcome.primary_key, "deps,build");
        assert_eq!(outcome.matched_key, "deps,build");
        assert_eq!(
            runner.restore_calls(),
            vec![vec![
                "restore".to_string(),
                "my-org/my-project".to_string(),
                "deps:/work/repo/node_modules,build:/work/repo/dist".to_string(),
            ]]
        );
        assert_eq!(installer.requested(), vec!["v1.0.0"]);
    }

    #[tokio::test]
    async fn test_fallback_uses_first_entry_path_and_platform_suffix() {
        let runner = FakeRunner::new().with_exit_codes([1, 1, 0]);
        let installer = FakeInstaller::new();
        let reporter = MemoryReporter::new();
        let env = env();
        let restorer = Restorer::new(&runner, &installer, &reporter, &env)
            .with_platform(Platform::new(Os::Linux, Arch::Amd64));

        let inputs = Inputs {
            restore_keys: Some("v2-\nv1-\nv0-".into()),
            enable_platform_suffix: true,
            ..cli_inputs("deps:node_modules,build:dist")
        };
        let outcome = restorer.restore(&inputs).await.unwrap();

        assert!(outcome.cache_hit);
        assert_eq!(outcome.primary_key, "");
        assert_eq!(outcome.matched_key, "v1--linux-amd64");

        let calls = runner.restore_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1][2], "v2--linux-amd64:/work/repo/node_modules");
        assert_eq!(calls[2][2], "v1--linux-amd64:/work/repo/node_modules");
    }

    #[tokio::test]
    async fn test_cross_os_archive_drops_suffix_and_passes_no_platform() {
        let runner = FakeRunner::new().with_exit_codes([1, 0]);
        let installer = FakeInstaller::new();
        let reporter = MemoryReporter::new();
        let env = env();
        let restorer = Restorer::new(&runner, &installer, &reporter, &env)
            .with_platform(Platform::new(Os::Darwin, Arch::Arm64));

        let inputs = Inputs {
            restore_keys: Some("v1-".into()),
            enable_platform_suffix: true,
            enable_cross_os_archive: true,
            ..cli_inputs("deps:node_modules")
        };
        let outcome = restorer.restore(&inputs).await.unwrap();

        assert_eq!(outcome.matched_key, "v1-");
        for call in runner.restore_calls() {
            assert_eq!(call.last().map(String::as_str), Some("--no-platform"));
        }
    }

    #[tokio::test]
    async fn test_all_misses_without_strict_mode() {
        let runner = FakeRunner::new().with_default_exit_code(1);
        let installer = FakeInstaller::new();
        let reporter = MemoryReporter::new();
        let env = env();
        let restorer = Restorer::new(&runner, &installer, &reporter, &env);

        let inputs = Inputs {
            restore_keys: Some("a\nb".into()),
            ..cli_inputs("deps:node_modules")
        };
        let outcome = restorer.restore(&inputs).await.unwrap();

        assert_eq!(outcome, RestoreOutcome::miss());
        assert_eq!(runner.restore_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_conflicting_shapes_warn() {
        let runner = FakeRunner::new();
        let installer = FakeInstaller::new();
        let reporter = MemoryReporter::new();
        let env = env();
        let restorer = Restorer::new(&runner, &installer, &reporter, &env);

        let inputs = Inputs {
            path: Some("dist".into()),
            key: Some("build".into()),
            ..cli_inputs("deps:node_modules")
        };
        let outcome = restorer.restore(&inputs).await.unwrap();

        assert_eq!(outcome.primary_key, "deps");
        assert_eq!(reporter.warnings(), vec![CONFLICTING_SHAPES_WARNING]);
    }

    #[tokio::test]
    async fn test_run_masks_token_and_writes_outputs() {
        let runner = FakeRunner::new();
        let installer = FakeInstaller::new();
        let reporter = MemoryReporter::new();
        let env = env().with_var(BORINGCACHE_API_TOKEN, "s3cret");
        let restorer = Restorer::new(&runner, &installer, &reporter, &env);

        assert!(restorer.run(&cli_inputs("deps:node_modules")).await);

        assert_eq!(
            reporter.events().first(),
            Some(&ReportEvent::Mask("s3cret".into()))
        );
        assert_eq!(
            reporter.outputs(),
            vec![
                (OUTPUT_CACHE_HIT.to_string(), "true".to_string()),
                (OUTPUT_PRIMARY_KEY.to_string(), "deps".to_string()),
                (OUTPUT_MATCHED_KEY.to_string(), "deps".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unwritable_output_file_fails_the_run_without_outputs() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let installer = FakeInstaller::new();
        let reporter = GitHubReporter::new(Some(dir.path().to_path_buf()), None);
        let env = env();
        let restorer = Restorer::new(&runner, &installer, &reporter, &env);

        assert!(!restorer.run(&cli_inputs("deps:node_modules")).await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_installer_failure_is_fatal() {
        let runner = FakeRunner::new();
        let installer = FakeInstaller::failing("Installation failed");
        let reporter = MemoryReporter::new();
        let env = env();
        let restorer = Restorer::new(&runner, &installer, &reporter, &env);

        assert!(!restorer.run(&cli_inputs("deps:node_modules")).await);

        assert_eq!(
            reporter.failures(),
            vec!["Cache restore failed: Failed to install BoringCache CLI: Installation failed"]
        );
        assert!(reporter.outputs().is_empty());
        assert!(runner.calls().is_empty());
    }
}
