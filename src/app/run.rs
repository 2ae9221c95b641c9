// GuidSleuth - app/run.rs
//
// One full extraction run:
//
//   device UDID -> log acquisition -> file listing -> extraction -> cleanup
//
// With an explicit log directory the first two steps are skipped and nothing
// is deleted afterwards. A collected archive is removed when the run ends,
// on success or failure, unless the request keeps it.

use crate::core::discovery::{self, ListingConfig};
use crate::core::model::ExtractionOutcome;
use crate::core::pipeline::{ExtractionConfig, ExtractionPipeline};
use crate::core::rules::RuleSet;
use crate::platform::acquire::Collector;
use crate::platform::config::AppConfig;
use crate::platform::device;
use crate::util::error::{ExtractError, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// What the user asked for.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Device UDID; detected when `None` and logs must be collected.
    pub udid: Option<String>,

    /// Existing log directory to scan instead of collecting from a device.
    pub log_dir: Option<PathBuf>,

    /// Keep the collected archive after the run.
    pub keep_logs: bool,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub udid: Option<String>,
    pub log_dir: PathBuf,
    pub files_listed: usize,
    pub outcome: ExtractionOutcome,
    pub elapsed: Duration,
}

pub fn extraction_config(config: &AppConfig) -> ExtractionConfig {
    ExtractionConfig {
        size_ceiling_bytes: config.size_ceiling_bytes,
        window_bytes: config.window_bytes,
        fallback_threshold: config.fallback_threshold,
        decode_chunk_bytes: config.decode_chunk_bytes,
    }
}

pub fn listing_config(config: &AppConfig) -> ListingConfig {
    ListingConfig {
        max_files: config.max_files,
        max_depth: config.max_depth,
        include_patterns: config.include_patterns.clone(),
    }
}

/// Run an extraction with the default log collector.
pub fn run_extraction(request: &RunRequest, config: &AppConfig, rules: RuleSet) -> Result<RunOutcome> {
    let collector = Collector {
        timeout: Duration::from_secs(config.collect_timeout_secs),
        ..Default::default()
    };
    run_with_collector(request, config, rules, &collector)
}

pub fn run_with_collector(
    request: &RunRequest,
    config: &AppConfig,
    rules: RuleSet,
    collector: &Collector,
) -> Result<RunOutcome> {
    let started = Instant::now();

    // `_archive` lives until the end of the run; dropping it removes the
    // collected directory.
    let (udid, log_dir, _archive) = match &request.log_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Scanning existing log directory");
            (request.udid.clone(), dir.clone(), None)
        }
        None => {
            let udid = match &request.udid {
                Some(u) => u.clone(),
                None => device::detect_connected_udid()?,
            };
            let work_dir = config
                .work_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            let mut archive = collector.collect(&udid, &work_dir)?;
            archive.set_keep(request.keep_logs);
            let dir = archive.path().to_path_buf();
            (Some(udid), dir, Some(archive))
        }
    };

    let files = discovery::list_log_files(&log_dir, &listing_config(config))?;
    tracing::info!(files = files.len(), "Log files listed");
    if files.is_empty() {
        return Err(ExtractError::NoLogFiles.into());
    }

    let pipeline = ExtractionPipeline::new(extraction_config(config), rules)?;
    let outcome = pipeline.run(&files)?;

    Ok(RunOutcome {
        udid,
        log_dir,
        files_listed: files.len(),
        outcome,
        elapsed: started.elapsed(),
    })
}
