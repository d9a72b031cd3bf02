//! Cache entries: `tag:path` pairs and their canonical string form.

use crate::env::EnvProvider;
use crate::inputs::InputShape;
use crate::{Error, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// One directory restored under one cache key segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Cache key segment.
    pub tag: String,
    /// Absolute location on disk.
    pub path: PathBuf,
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag, self.path.display())
    }
}

/// Turns user-supplied paths into absolute ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    home: Option<PathBuf>,
    cwd: Option<PathBuf>,
}

impl PathResolver {
    /// Create a resolver with explicit directories.
    #[must_use]
    pub fn new(home: Option<PathBuf>, cwd: Option<PathBuf>) -> Self {
        Self { home, cwd }
    }

    /// Create a resolver from an environment provider.
    #[must_use]
    pub fn from_env(env: &dyn EnvProvider) -> Self {
        Self::new(env.home_dir(), env.current_dir())
    }

    /// Resolve one path.
    ///
    /// Absolute paths are returned untouched, `~/...` is joined onto the home
    /// directory and anything else onto the working directory.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf> {
        let raw = raw.trim();
        let path = Path::new(raw);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }

        if let Some(rest) = raw.strip_prefix("~/") {
            let home = self.home.as_ref().ok_or_else(|| {
                Error::validation(format!(
                    "Cannot expand '{raw}': home directory is unknown"
                ))
            })?;
            return Ok(normalize(&home.join(rest)));
        }

        let cwd = self.cwd.as_ref().ok_or_else(|| {
            Error::validation(format!(
                "Cannot resolve '{raw}': working directory is unknown"
            ))
        })?;
        Ok(normalize(&cwd.join(path)))
    }
}

/// Lexically collapse `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Parse a comma separated `tag:path` list.
///
/// Only the first `:` splits, so paths keep any colons of their own
/// (`C:\cache`).
pub fn parse_entries(input: &str, resolver: &PathResolver) -> Result<Vec<CacheEntry>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| -> Result<CacheEntry> {
            let (tag, raw_path) = segment
                .split_once(':')
                .ok_or_else(|| Error::invalid_entry(segment))?;
            Ok(CacheEntry {
                tag: tag.to_string(),
                path: resolver.resolve(raw_path)?,
            })
        })
        .collect()
}

/// Synthesize entries from the `actions/cache` style inputs.
///
/// Every path in the newline separated `path` input gets the same tag,
/// `key` followed by `key_suffix`.
pub fn legacy_entries(
    path: &str,
    key: &str,
    key_suffix: &str,
    resolver: &PathResolver,
) -> Result<Vec<CacheEntry>> {
    let tag = format!("{key}{key_suffix}");
    path.lines()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| -> Result<CacheEntry> {
            Ok(CacheEntry {
                tag: tag.clone(),
                path: resolver.resolve(p)?,
            })
        })
        .collect()
}

/// The `actions/cache` inputs rendered as a CLI `entries` string.
pub fn legacy_entries_string(
    path: &str,
    key: &str,
    key_suffix: &str,
    resolver: &PathResolver,
) -> Result<String> {
    Ok(entries_to_string(&legacy_entries(
        path, key, key_suffix, resolver,
    )?))
}

/// Derive the ordered entries for the selected input shape.
///
/// `key_suffix` only applies to the legacy shape, where the tag is computed
/// from `key`.
pub fn derive_entries(
    shape: &InputShape,
    key_suffix: &str,
    resolver: &PathResolver,
) -> Result<Vec<CacheEntry>> {
    let entries = match shape {
        InputShape::Cli { entries, .. } => parse_entries(entries, resolver)?,
        InputShape::Legacy { path, key } => legacy_entries(path, key, key_suffix, resolver)?,
    };

    if entries.is_empty() {
        return Err(Error::validation("No cache entries to restore"));
    }
    Ok(entries)
}

/// `tag:path[,tag:path...]` as passed to `boringcache restore`.
#[must_use]
pub fn entries_to_string(entries: &[CacheEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Comma-joined tags, reported as the primary key.
#[must_use]
pub fn primary_key(entries: &[CacheEntry]) -> String {
    entries
        .iter()
        .map(|e| e.tag.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
