//! Installation and version check of the `boringcache` CLI.

use crate::reporter::Reporter;
use crate::runner::{ExecOptions, ToolRunner};
use async_trait::async_trait;
use boringcache_core::env::BORINGCACHE_API_TOKEN;
use boringcache_core::{EnvProvider, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Name of the cache CLI binary.
pub const TOOL_BINARY: &str = "boringcache";

/// Install script used when `BORINGCACHE_INSTALL_URL` is not set.
pub const DEFAULT_INSTALL_URL: &str = "https://install.boringcache.com/install.sh";

/// Overrides [`DEFAULT_INSTALL_URL`].
pub const BORINGCACHE_INSTALL_URL: &str = "BORINGCACHE_INSTALL_URL";

/// Makes the cache CLI available.
#[async_trait]
pub trait Installer: Send + Sync {
    /// Ensure `version` of the CLI is installed and return the program to run.
    async fn ensure_tool(&self, version: &str) -> Result<PathBuf>;
}

/// Whether `reported` (the `--version` output) satisfies `requested`.
fn version_matches(reported: &str, requested: &str) -> bool {
    let requested = requested.trim().trim_start_matches('v');
    if requested.is_empty() || requested == "latest" {
        return true;
    }
    reported
        .split_whitespace()
        .any(|word| word.trim_start_matches('v') == requested)
}

/// Installs the CLI with the upstream install script.
///
/// Checks `boringcache --version` on `PATH` first; only when the binary is
/// missing or reports a different version is the script run. The script
/// drops the binary into `~/.boringcache/bin`, which is then added to the
/// job `PATH`.
pub struct CliInstaller<'a> {
    runner: &'a dyn ToolRunner,
    reporter: &'a dyn Reporter,
    env: &'a dyn EnvProvider,
}

impl<'a> CliInstaller<'a> {
    /// Create an installer.
    #[must_use]
    pub fn new(
        runner: &'a dyn ToolRunner,
        reporter: &'a dyn Reporter,
        env: &'a dyn EnvProvider,
    ) -> Self {
        Self {
            runner,
            reporter,
            env,
        }
    }

    fn install_dir(&self) -> Result<PathBuf> {
        self.env
            .home_dir()
            .map(|home| home.join(".boringcache").join("bin"))
            .ok_or_else(|| Error::installation("home directory is unknown"))
    }

    /// Version reported by `tool`, or `None` if it cannot be run.
    async fn installed_version(&self, tool: &Path) -> Option<String> {
        match self.runner.capture(tool, &["--version".to_string()]).await {
            Ok(output) if output.code == 0 => Some(output.stdout),
            Ok(output) => {
                debug!(code = output.code, "Version check failed");
                None
            }
            Err(e) => {
                debug!(error = %e, "CLI not runnable");
                None
            }
        }
    }

    async fn install(&self, version: &str) -> Result<PathBuf> {
        let url = self
            .env
            .var(BORINGCACHE_INSTALL_URL)
            .unwrap_or_else(|| DEFAULT_INSTALL_URL.to_string());
        let dir = self.install_dir()?;

        let mut env = vec![
            ("BORINGCACHE_VERSION".to_string(), version.to_string()),
            (
                "BORINGCACHE_INSTALL_DIR".to_string(),
                dir.display().to_string(),
            ),
        ];
        if let Some(token) = self.env.var(BORINGCACHE_API_TOKEN) {
            env.push((BORINGCACHE_API_TOKEN.to_string(), token));
        }

        self.reporter
            .info(&format!("Installing BoringCache CLI {version}"));
        info!(%url, %version, dir = %dir.display(), "Running install script");

        let options = ExecOptions {
            ignore_non_zero: false,
            silent: false,
            env,
        };
        self.runner
            .exec_tool(
                Path::new("bash"),
                &["-c".to_string(), format!("curl -fsSL '{url}' | bash")],
                &options,
            )
            .await?;

        self.reporter.add_path(&dir)?;
        Ok(dir.join(TOOL_BINARY))
    }
}

#[async_trait]
impl Installer for CliInstaller<'_> {
    #[instrument(skip(self))]
    async fn ensure_tool(&self, version: &str) -> Result<PathBuf> {
        let on_path = PathBuf::from(TOOL_BINARY);
        if let Some(reported) = self.installed_version(&on_path).await {
            if version_matches(&reported, version) {
                debug!(%reported, "Using installed CLI");
                return Ok(on_path);
            }
            info!(%reported, requested = %version, "Installed CLI version differs");
        }

        let installed = self
            .install(version)
            .await
            .map_err(|e| match e {
                Error::Installation { .. } => e,
                other => Error::installation(other.to_string()),
            })?;

        if self.installed_version(&installed).await.is_none() {
            return Err(Error::installation(format!(
                "{} did not run after installation",
                installed.display()
            )));
        }
        Ok(installed)
    }
}
