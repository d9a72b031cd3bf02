//! Command-line surface.
//!
//! Every option can also be supplied through the `INPUT_*` variable GitHub
//! Actions sets for the matching action input, so the same binary works as
//! an action step and as a local command.

use crate::reporter::Reporter;
use crate::tracing::{LogLevel, TracingFormat};
use boringcache_core::{DEFAULT_CLI_VERSION, Inputs};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::ffi::OsString;

/// Parse an action boolean input.
///
/// Accepts the YAML 1.2 core schema spellings. An empty value counts as
/// `false`, matching an omitted input.
fn parse_bool_input(value: &str) -> Result<bool, String> {
    match value.trim() {
        "" | "false" | "False" | "FALSE" => Ok(false),
        "true" | "True" | "TRUE" => Ok(true),
        other => Err(format!(
            "Input does not meet YAML 1.2 \"Core Schema\" specification: {other}. \
             Support boolean input list: `true | True | TRUE | false | False | FALSE`"
        )),
    }
}

/// Restore BoringCache entries in a CI job.
#[derive(Debug, Parser)]
#[command(name = "boringcache-restore", version, about)]
pub struct Cli {
    /// Version of the boringcache CLI to install
    #[arg(long, env = "INPUT_CLI-VERSION")]
    pub cli_version: Option<String>,

    /// Workspace as namespace/project
    #[arg(long, env = "INPUT_WORKSPACE")]
    pub workspace: Option<String>,

    /// Comma separated tag:path entries
    #[arg(long, env = "INPUT_ENTRIES")]
    pub entries: Option<String>,

    /// Newline separated paths (actions/cache format)
    #[arg(long, env = "INPUT_PATH")]
    pub path: Option<String>,

    /// Cache key (actions/cache format)
    #[arg(long, env = "INPUT_KEY")]
    pub key: Option<String>,

    /// Newline separated fallback keys, tried in order
    #[arg(long, env = "INPUT_RESTORE-KEYS")]
    pub restore_keys: Option<String>,

    /// Share cache entries across operating systems
    #[arg(
        long,
        env = "INPUT_ENABLECROSSOSARCHIVE",
        value_name = "BOOL",
        value_parser = parse_bool_input,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub enable_cross_os_archive: bool,

    /// Append an OS/architecture suffix to keys
    #[arg(
        long,
        env = "INPUT_ENABLE-PLATFORM-SUFFIX",
        value_name = "BOOL",
        value_parser = parse_bool_input,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub enable_platform_suffix: bool,

    /// Tell the cache CLI to ignore platform differences
    #[arg(
        long,
        env = "INPUT_NO-PLATFORM",
        value_name = "BOOL",
        value_parser = parse_bool_input,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub no_platform: bool,

    /// Fail the step when no key hits
    #[arg(
        long,
        env = "INPUT_FAIL-ON-CACHE-MISS",
        value_name = "BOOL",
        value_parser = parse_bool_input,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub fail_on_cache_miss: bool,

    /// Check for a hit without downloading
    #[arg(
        long,
        env = "INPUT_LOOKUP-ONLY",
        value_name = "BOOL",
        value_parser = parse_bool_input,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub lookup_only: bool,

    /// Verbose cache CLI output and debug logging
    #[arg(
        long,
        env = "INPUT_VERBOSE",
        value_name = "BOOL",
        value_parser = parse_bool_input,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub verbose: bool,

    /// Log level for diagnostics on stderr
    #[arg(long, value_enum, env = "BORINGCACHE_LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,

    /// Log format for diagnostics on stderr
    #[arg(long, value_enum, env = "BORINGCACHE_LOG_FORMAT", default_value = "compact")]
    pub log_format: TracingFormat,
}

/// Treat empty strings as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Cli {
    /// Convert into normalised action inputs.
    #[must_use]
    pub fn into_inputs(self) -> Inputs {
        Inputs {
            cli_version: non_empty(self.cli_version)
                .unwrap_or_else(|| DEFAULT_CLI_VERSION.to_string()),
            workspace: non_empty(self.workspace),
            entries: non_empty(self.entries),
            path: non_empty(self.path),
            key: non_empty(self.key),
            restore_keys: non_empty(self.restore_keys),
            enable_cross_os_archive: self.enable_cross_os_archive,
            enable_platform_suffix: self.enable_platform_suffix,
            no_platform: self.no_platform,
            fail_on_cache_miss: self.fail_on_cache_miss,
            lookup_only: self.lookup_only,
            verbose: self.verbose,
        }
    }
}

/// Parse the process arguments, see [`parse_from`].
pub fn parse(reporter: &dyn Reporter) -> Option<Cli> {
    parse_from(std::env::args_os(), reporter)
}

/// Parse `args`, reporting invalid input as a failed run.
///
/// Help and version requests print and exit as usual. Any other error is
/// passed to [`Reporter::set_failed`] and `None` is returned.
pub fn parse_from<I, T>(args: I, reporter: &dyn Reporter) -> Option<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Some(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            reporter.set_failed(&format!("Cache restore failed: {}", failure_message(&e)));
            None
        }
    }
}

/// The cause of a parse error without clap's `error:` prefix and usage hint.
fn failure_message(err: &clap::Error) -> String {
    if let Some(source) = std::error::Error::source(err) {
        return source.to_string();
    }
    let rendered = err.render().to_string();
    rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}
