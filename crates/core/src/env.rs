//! Environment lookups behind a provider trait.
//!
//! Everything this crate reads from the process environment goes through
//! [`EnvProvider`], so tests can supply fixed values with [`MapEnv`] instead
//! of mutating global state.

use std::collections::HashMap;
use std::path::PathBuf;

/// Repository identifier set by GitHub Actions (`owner/repo`).
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// API token forwarded to the installer and the cache CLI.
pub const BORINGCACHE_API_TOKEN: &str = "BORINGCACHE_API_TOKEN";
/// Workspace used when no `workspace` input is given.
pub const BORINGCACHE_DEFAULT_WORKSPACE: &str = "BORINGCACHE_DEFAULT_WORKSPACE";
/// File that step outputs are appended to.
pub const GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";
/// File that extra `PATH` entries are appended to.
pub const GITHUB_PATH: &str = "GITHUB_PATH";

/// Source of environment variables and well-known directories.
pub trait EnvProvider: Send + Sync {
    /// Look up a variable. Empty values are reported as absent.
    fn var(&self, name: &str) -> Option<String>;

    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// The directory relative paths are resolved against.
    fn current_dir(&self) -> Option<PathBuf>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        std::env::current_dir().ok()
    }
}

/// Fixed environment for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
    cwd: Option<PathBuf>,
}

impl MapEnv {
    /// Create an empty environment with no home or working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Set the home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl EnvProvider for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        self.cwd.clone()
    }
}
