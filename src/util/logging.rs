// GuidSleuth - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --verbose (sets level to debug)
//   - Config file: [logging] level = "debug"
//
// Output: stderr only, so stdout carries nothing but the extraction result.
// Never logs device identifiers above debug level.

use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// `verbose` is true when the user passed --verbose on the CLI.
/// `config_level` is the level from config.toml (if present).
///
/// Priority: RUST_LOG env var > CLI --verbose flag > config level > default "info".
pub fn init(verbose: bool, config_level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    // try_init: a second call (tests, embedding) keeps the first subscriber.
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .try_init();

    if result.is_err() {
        tracing::debug!("Logging already initialised; keeping existing subscriber");
        return;
    }

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "Logging initialised"
    );
}
