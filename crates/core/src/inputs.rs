//! Action inputs and the two accepted input shapes.
//!
//! The action accepts either the CLI shape (`workspace` + `entries`) or the
//! `actions/cache` compatible shape (`path` + `key`). When both are present
//! the CLI shape wins; [`ShapeResolution::conflicting`] records that the
//! legacy inputs were ignored so the caller can warn about it.

use crate::env::{BORINGCACHE_DEFAULT_WORKSPACE, EnvProvider, GITHUB_REPOSITORY};
use crate::{Error, Result};

/// Workspace used when nothing else identifies one.
pub const DEFAULT_WORKSPACE: &str = "default/default";

/// CLI version installed when `cli-version` is empty.
pub const DEFAULT_CLI_VERSION: &str = "v1.0.0";

/// Warning emitted when both input shapes are populated.
pub const CONFLICTING_SHAPES_WARNING: &str = "Both CLI format (workspace/entries) and actions/cache format (path/key) provided. Using CLI format.";

/// Flat record of everything the action was configured with.
///
/// String inputs are `None` when the runner passed an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    /// Requested `boringcache` CLI version.
    pub cli_version: String,
    /// `namespace/project`, validated against a `/`.
    pub workspace: Option<String>,
    /// Comma separated `tag:path` list.
    pub entries: Option<String>,
    /// Newline separated paths (`actions/cache` shape).
    pub path: Option<String>,
    /// Cache key (`actions/cache` shape).
    pub key: Option<String>,
    /// Newline separated fallback keys.
    pub restore_keys: Option<String>,
    /// Share entries across operating systems.
    pub enable_cross_os_archive: bool,
    /// Append the platform suffix to derived keys.
    pub enable_platform_suffix: bool,
    /// Pass `--no-platform` to the cache CLI.
    pub no_platform: bool,
    /// Fail the run when nothing hits.
    pub fail_on_cache_miss: bool,
    /// Check for a hit without downloading.
    pub lookup_only: bool,
    /// Pass `--verbose` to the cache CLI.
    pub verbose: bool,
}

/// Which input shape drives this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShape {
    /// `workspace` (optional) + `entries`
    Cli {
        /// Explicit workspace, if given
        workspace: Option<String>,
        /// Raw `entries` input
        entries: String,
    },
    /// `path` (newline separated) + `key`
    Legacy {
        /// Raw `path` input
        path: String,
        /// Raw `key` input
        key: String,
    },
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeResolution {
    /// The shape this run uses.
    pub shape: InputShape,
    /// Both shapes were populated and the legacy one was ignored.
    pub conflicting: bool,
}

impl Inputs {
    /// Fallback restore keys in the order given, trimmed, blanks dropped.
    #[must_use]
    pub fn restore_key_list(&self) -> Vec<String> {
        self.restore_keys
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect()
    }

    /// Whether the cache CLI should be told to ignore platform differences.
    #[must_use]
    pub fn wants_no_platform(&self) -> bool {
        self.enable_cross_os_archive || self.no_platform
    }

    fn has_cli_shape(&self) -> bool {
        self.workspace.is_some() || self.entries.is_some()
    }

    fn has_legacy_shape(&self) -> bool {
        self.path.is_some() || self.key.is_some()
    }
}

/// Check the inputs and pick the shape to use.
pub fn validate(inputs: &Inputs) -> Result<ShapeResolution> {
    let has_cli = inputs.has_cli_shape();
    let has_legacy = inputs.has_legacy_shape();

    if !has_cli && !has_legacy {
        return Err(Error::validation(
            "Either (workspace + entries) or (path + key) inputs are required",
        ));
    }

    let shape = if has_cli {
        let Some(entries) = inputs.entries.clone() else {
            return Err(Error::validation(
                r#"Input "entries" is required when using CLI format"#,
            ));
        };
        InputShape::Cli {
            workspace: inputs.workspace.clone(),
            entries,
        }
    } else {
        let Some(path) = inputs.path.clone() else {
            return Err(Error::validation(
                r#"Input "path" is required when using actions/cache format"#,
            ));
        };
        let Some(key) = inputs.key.clone() else {
            return Err(Error::validation(
                r#"Input "key" is required when using actions/cache format"#,
            ));
        };
        InputShape::Legacy { path, key }
    };

    if let Some(workspace) = &inputs.workspace
        && !workspace.contains('/')
    {
        return Err(Error::validation(
            r#"Workspace must be in format "namespace/workspace" (e.g., "my-org/my-project")"#,
        ));
    }

    Ok(ShapeResolution {
        shape,
        conflicting: has_cli && has_legacy,
    })
}

/// Resolve the `namespace/project` workspace for this run.
///
/// Order: explicit input, `BORINGCACHE_DEFAULT_WORKSPACE`, the
/// `GITHUB_REPOSITORY` owner/repo pair, then [`DEFAULT_WORKSPACE`].
#[must_use]
pub fn resolve_workspace(inputs: &Inputs, env: &dyn EnvProvider) -> String {
    if let Some(workspace) = &inputs.workspace {
        return workspace.clone();
    }

    if let Some(workspace) = env.var(BORINGCACHE_DEFAULT_WORKSPACE)
        && workspace.contains('/')
    {
        return workspace;
    }

    if let Some(repo) = env.var(GITHUB_REPOSITORY) {
        let mut parts = repo.split('/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        return format!("{owner}/{name}");
    }

    DEFAULT_WORKSPACE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    fn cli_inputs(workspace: Option<&str>, entries: Option<&str>) -> Inputs {
        Inputs {
            workspace: workspace.map(String::from),
            entries: entries.map(String::from),
            ..Inputs::default()
        }
    }

    #[test]
    fn test_validate_requires_some_shape() {
        let err = validate(&Inputs::default()).unwrap_err();
        assert!(
            err.to_string()
                .contains("Either (workspace + entries) or (path + key) inputs are required")
        );
    }

    #[test]
    fn test_validate_cli_shape_requires_entries() {
        let err = validate(&cli_inputs(Some("org/proj"), None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Input "entries" is required when using CLI format"#
        );
    }

    #[test]
    fn test_validate_legacy_shape_requires_both() {
        let inputs = Inputs {
            path: Some("~/.npm".into()),
            ..Inputs::default()
        };
        assert!(
            validate(&inputs)
                .unwrap_err()
                .to_string()
                .contains(r#"Input "key" is required"#)
        );

        let inputs = Inputs {
            key: Some("deps".into()),
            ..Inputs::default()
        };
        assert!(
            validate(&inputs)
                .unwrap_err()
                .to_string()
                .contains(r#"Input "path" is required"#)
        );
    }

    #[test]
    fn test_validate_rejects_workspace_without_slash() {
        let err = validate(&cli_inputs(Some("noSlash"), Some("deps:node_modules"))).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("namespace/workspace"));

        let inputs = Inputs {
            workspace: Some("noSlash".into()),
            entries: Some("deps:node_modules".into()),
            path: Some("dist".into()),
            key: Some("k".into()),
            ..Inputs::default()
        };
        assert!(validate(&inputs).is_err());
    }

    #[test]
    fn test_validate_entries_without_workspace_is_cli_shape() {
        let resolution = validate(&cli_inputs(None, Some("deps:node_modules"))).unwrap();
        assert_eq!(
            resolution.shape,
            InputShape::Cli {
                workspace: None,
                entries: "deps:node_modules".into()
            }
        );
        assert!(!resolution.conflicting);
    }

    #[test]
    fn test_validate_cli_shape_wins_over_legacy() {
        let inputs = Inputs {
            workspace: Some("org/proj".into()),
            entries: Some("deps:node_modules".into()),
            path: Some("dist".into()),
            key: Some("build".into()),
            ..Inputs::default()
        };
        let resolution = validate(&inputs).unwrap();
        assert!(resolution.conflicting);
        assert!(matches!(resolution.shape, InputShape::Cli { .. }));
    }

    #[test]
    fn test_validate_legacy_shape() {
        let inputs = Inputs {
            path: Some("~/.npm".into()),
            key: Some("deps-hash".into()),
            ..Inputs::default()
        };
        let resolution = validate(&inputs).unwrap();
        assert_eq!(
            resolution.shape,
            InputShape::Legacy {
                path: "~/.npm".into(),
                key: "deps-hash".into()
            }
        );
    }

    #[test]
    fn test_restore_key_list_drops_blanks() {
        let inputs = Inputs {
            restore_keys: Some("v1-\n\n  \n v0- \n".into()),
            ..Inputs::default()
        };
        assert_eq!(inputs.restore_key_list(), vec!["v1-", "v0-"]);
        assert!(Inputs::default().restore_key_list().is_empty());
    }

    #[test]
    fn test_resolve_workspace_order() {
        let env = MapEnv::new()
            .with_var(GITHUB_REPOSITORY, "owner/repo")
            .with_var(BORINGCACHE_DEFAULT_WORKSPACE, "team/shared");

        let explicit = cli_inputs(Some("my-org/my-project"), None);
        assert_eq!(resolve_workspace(&explicit, &env), "my-org/my-project");
        assert_eq!(resolve_workspace(&Inputs::default(), &env), "team/shared");

        let env = MapEnv::new().with_var(GITHUB_REPOSITORY, "owner/repo");
        assert_eq!(resolve_workspace(&Inputs::default(), &env), "owner/repo");

        assert_eq!(
            resolve_workspace(&Inputs::default(), &MapEnv::new()),
            DEFAULT_WORKSPACE
        );
    }

    #[test]
    fn test_resolve_workspace_ignores_malformed_override() {
        let env = MapEnv::new().with_var(BORINGCACHE_DEFAULT_WORKSPACE, "shared");
        assert_eq!(resolve_workspace(&Inputs::default(), &env), DEFAULT_WORKSPACE);
    }
}
