//! Wireproof Verify CLI

use clap::{Arg, ArgAction, Command};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};
use wireproof_verify::{exit_status, run, Config};

/// Returns the version of the crate.
pub const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Flag for verbose output
const VERBOSE_FLAG: &str = "verbose";

/// Entrypoint for the Wireproof Verify CLI
fn main() -> ExitCode {
    // Define application
    let matches = Command::new("wireproof-verify")
        .version(crate_version())
        .about("Verify native type sizes and serialization plans against an external description.")
        .arg(
            Arg::new(VERBOSE_FLAG)
                .short('v')
                .long(VERBOSE_FLAG)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("external")
                .long("external")
                .required(true)
                .help("Path to the external JSON description")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("native")
                .long("native")
                .help("Path to the native JSON description (defaults to the built-in catalog, sizes only)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("type")
                .long("type")
                .action(ArgAction::Append)
                .help("Only verify this type (may be repeated)")
                .value_parser(clap::value_parser!(String)),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag(VERBOSE_FLAG) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Parse arguments
    let Some(external) = matches.get_one::<PathBuf>("external").cloned() else {
        error!("missing external description");
        return ExitCode::FAILURE;
    };
    let config = Config {
        external,
        native: matches.get_one::<PathBuf>("native").cloned(),
        types: matches
            .get_many::<String>("type")
            .map(|types| types.cloned().collect())
            .unwrap_or_default(),
    };

    // Verify
    let report = match run(&config) {
        Ok(report) => report,
        Err(e) => {
            error!(error=?e, "failed to load descriptions");
            return ExitCode::FAILURE;
        }
    };
    print!("{report}");
    let errors = report.errors();
    info!(errors, "verification complete");
    ExitCode::from(exit_status(errors))
}
