// GuidSleuth - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading, with CLI flags taking precedence
// 3. Logging initialisation (debug mode support)
// 4. Rule loading (built-in + user-defined)
// 5. The extraction run and its report
//
// Exit code 0 when a GUID was found; 1 when none was found or the run failed.

use clap::Parser;
use guidsleuth::app::report::ExtractionReport;
use guidsleuth::app::run::{self, RunRequest};
use guidsleuth::app::rules_mgr;
use guidsleuth::platform::config::{self, PlatformPaths};
use guidsleuth::util;
use std::path::PathBuf;
use std::process::ExitCode;

/// GuidSleuth: recover the Books container GUID from device logs.
#[derive(Parser, Debug)]
#[command(name = "guidsleuth", version, about)]
struct Cli {
    /// Device UDID (detected with ideviceinfo if omitted).
    udid: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Scan an existing log directory instead of collecting from a device.
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Keep the collected .logarchive after the run.
    #[arg(long = "keep-logs")]
    keep_logs: bool,

    /// Print the report as JSON.
    #[arg(long = "json")]
    json: bool,

    /// Corpus size ceiling in MiB.
    #[arg(long = "max-size-mb", value_parser = clap::value_parser!(u64).range(1..=2048))]
    max_size_mb: Option<u64>,

    /// Additional directory containing user-defined extraction rules.
    #[arg(long = "rules-dir")]
    rules_dir: Option<PathBuf>,

    /// Log collection timeout in seconds.
    #[arg(
        long = "timeout-secs",
        value_parser = clap::value_parser!(u64).range(
            util::constants::MIN_COLLECT_TIMEOUT_SECS..=util::constants::MAX_COLLECT_TIMEOUT_SECS
        )
    )]
    timeout_secs: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let (mut app_config, config_warnings) = config::load_config(&platform_paths.config_dir);

    util::logging::init(cli.verbose, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        verbose = cli.verbose,
        "GuidSleuth starting"
    );

    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    // CLI flags override config.toml.
    if let Some(mb) = cli.max_size_mb {
        app_config.size_ceiling_bytes = mb * 1024 * 1024;
    }
    if let Some(secs) = cli.timeout_secs {
        app_config.collect_timeout_secs = secs;
    }

    // Rule directory: CLI override > config > platform default
    let rules_dir = cli
        .rules_dir
        .clone()
        .or_else(|| app_config.user_rule_dir.clone())
        .unwrap_or_else(|| platform_paths.user_rules_dir.clone());
    let rules = rules_mgr::load_rule_set(Some(&rules_dir));

    let request = RunRequest {
        udid: cli.udid.clone(),
        log_dir: cli.log_dir.clone(),
        keep_logs: cli.keep_logs || app_config.keep_logs,
    };

    if request.log_dir.is_none() && request.udid.is_none() {
        eprintln!("Searching for a connected device...");
    }

    let outcome = match run::run_extraction(&request, &app_config, rules) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Extraction failed");
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    let report = ExtractionReport::from_run(&outcome);
    let stdout = std::io::stdout().lock();
    let written = if cli.json {
        report.write_json(stdout).map_err(std::io::Error::from)
    } else {
        report.write_text(stdout)
    };
    if let Err(e) = written {
        tracing::error!(error = %e, "Failed to write report");
        return ExitCode::from(1);
    }
    if cli.json {
        println!();
    }

    if report.found {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
