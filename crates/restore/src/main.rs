//! boringcache-restore binary
//!
//! Runs as a GitHub Actions step (inputs from `INPUT_*`) or locally with
//! flags. Failures are reported as `::error::` annotations and a non-zero
//! exit status.

use boringcache_core::SystemEnv;
use boringcache_restore::cli;
use boringcache_restore::tracing::{TracingConfig, init_tracing};
use boringcache_restore::{CliInstaller, GitHubReporter, ProcessRunner, Reporter, Restorer};
use std::process::ExitCode;

fn main() -> ExitCode {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    #[allow(clippy::print_stderr)]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let env = SystemEnv;
    let reporter = GitHubReporter::from_env(&env);
    let Some(cli) = cli::parse(&reporter) else {
        return ExitCode::FAILURE;
    };

    let config = TracingConfig::for_run(cli.log_format, cli.log_level, cli.verbose);
    if let Err(e) = init_tracing(config) {
        reporter.warning(&format!("{e}"));
    }

    let inputs = cli.into_inputs();

    // A single thread keeps every tool invocation strictly sequential.
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            reporter.set_failed(&format!(
                "Cache restore failed: Failed to create tokio runtime: {e}"
            ));
            return ExitCode::FAILURE;
        }
    };

    let ok = rt.block_on(async {
        let runner = ProcessRunner;
        let installer = CliInstaller::new(&runner, &reporter, &env);
        Restorer::new(&runner, &installer, &reporter, &env)
            .run(&inputs)
            .await
    });

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
