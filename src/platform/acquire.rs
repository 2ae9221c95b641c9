// GuidSleuth - platform/acquire.rs
//
// Device log acquisition into a `<udid>.logarchive` directory.
//
// The collector is an external program (pymobiledevice3 by default). A run
// removes any stale archive first, so the lister never sees a previous
// device's logs. The returned `LogArchive` removes the directory again when
// dropped unless the caller asked to keep it.

use crate::platform::process::run_with_timeout;
use crate::util::constants;
use crate::util::error::AcquisitionError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

// =============================================================================
// Collected archive
// =============================================================================

/// A collected log archive directory, removed on drop unless kept.
#[derive(Debug)]
pub struct LogArchive {
    path: PathBuf,
    keep: bool,
}

impl LogArchive {
    pub fn new(path: PathBuf, keep: bool) -> Self {
        Self { path, keep }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_keep(&mut self, keep: bool) {
        self.keep = keep;
    }
}

impl Drop for LogArchive {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(path = %self.path.display(), "Keeping collected logs");
            return;
        }
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Collected logs removed"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Could not remove collected logs"
            ),
        }
    }
}

// =============================================================================
// Collector
// =============================================================================

/// The external log collector: `<program> <args...> <archive path>`.
#[derive(Debug, Clone)]
pub struct Collector {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub timeout: Duration,
}

impl Default for Collector {
    fn default() -> Self {
        Self {
            program: constants::COLLECTOR_PROGRAM.into(),
            args: constants::COLLECTOR_ARGS.iter().map(OsString::from).collect(),
            timeout: Duration::from_secs(constants::DEFAULT_COLLECT_TIMEOUT_SECS),
        }
    }
}

/// `<work_dir>/<udid>.logarchive`
///
/// The UDID must be a single plain file name; anything that could resolve
/// outside `work_dir` is rejected before the stale-archive removal sees it.
pub fn archive_path(udid: &str, work_dir: &Path) -> Result<PathBuf, AcquisitionError> {
    let plain = !udid.is_empty()
        && udid != "."
        && udid != ".."
        && !udid.contains(['/', '\\'])
        && !udid.contains('\0');
    if !plain {
        return Err(AcquisitionError::InvalidUdid {
            udid: udid.to_string(),
        });
    }
    Ok(work_dir.join(format!("{udid}{}", constants::LOG_ARCHIVE_SUFFIX)))
}

impl Collector {
    /// Collect the device's logs into its archive directory under `work_dir`.
    ///
    /// The returned archive is removed on drop; call `set_keep(true)` to
    /// leave it on disk.
    pub fn collect(&self, udid: &str, work_dir: &Path) -> Result<LogArchive, AcquisitionError> {
        let path = archive_path(udid, work_dir)?;

        if path.exists() {
            tracing::debug!(path = %path.display(), "Removing stale archive");
            std::fs::remove_dir_all(&path).map_err(|source| AcquisitionError::Cleanup {
                path: path.clone(),
                source,
            })?;
        }

        tracing::info!(
            collector = %self.program.to_string_lossy(),
            timeout_secs = self.timeout.as_secs(),
            "Collecting device logs"
        );

        let output = run_with_timeout(
            Command::new(&self.program).args(&self.args).arg(&path),
            self.timeout,
        )?;

        // From here on, whatever the collector left behind is ours to clean.
        let archive = LogArchive::new(path, false);

        if !output.success() {
            return Err(AcquisitionError::CollectorFailed {
                status: output.status.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        if !archive.path().is_dir() {
            return Err(AcquisitionError::MissingArchive {
                path: archive.path().to_path_buf(),
            });
        }

        tracing::info!(path = %archive.path().display(), "Device logs collected");
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_path_uses_udid() {
        let path = archive_path("00008020-001A2B3C4D5E6F70", Path::new("/work")).unwrap();
        assert_eq!(path, Path::new("/work/00008020-001A2B3C4D5E6F70.logarchive"));
    }

    #[test]
    fn test_archive_path_rejects_escaping_udids() {
        for udid in ["", ".", "..", "../x", "a/b", "a\\b", "/abs"] {
            assert!(
                matches!(
                    archive_path(udid, Path::new("/work")),
                    Err(AcquisitionError::InvalidUdid { .. })
                ),
                "accepted {udid:?}"
            );
        }
    }

    #[test]
    fn test_traversal_udid_leaves_outside_directory_alone() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("work");
        std::fs::create_dir(&work_dir).unwrap();
        let outside = dir.path().join("x.logarchive");
        std::fs::create_dir(&outside).unwrap();
        std::fs::write(outside.join("keep.log"), "keep").unwrap();

        let collector = Collector {
            program: "guidsleuth-no-such-collector".into(),
            args: Vec::new(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            collector.collect("../x", &work_dir),
            Err(AcquisitionError::InvalidUdid { .. })
        ));
        assert!(outside.join("keep.log").is_file());
    }

    #[test]
    fn test_archive_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.logarchive");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("a.log"), "x").unwrap();
        drop(LogArchive::new(path.clone(), false));
        assert!(!path.exists());
    }

    #[test]
    fn test_kept_archive_survives_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.logarchive");
        std::fs::create_dir(&path).unwrap();
        let mut archive = LogArchive::new(path.clone(), false);
        archive.set_keep(true);
        drop(archive);
        assert!(path.exists());
    }

    #[cfg(unix)]
    fn shell_collector(script: &str) -> Collector {
        // `sh -c script <path>` binds the archive path to $0.
        Collector {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            timeout: Duration::from_secs(10),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_success_yields_archive() {
        let dir = tempfile::tempdir().unwrap();
        let collector = shell_collector(r#"mkdir -p "$0" && echo log > "$0/system.log""#);
        let archive = collector.collect("UDID1", dir.path()).unwrap();
        assert!(archive.path().join("system.log").is_file());
        let path = archive.path().to_path_buf();
        drop(archive);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_archive_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let stale = archive_path("UDID2", dir.path()).unwrap();
        std::fs::create_dir(&stale).unwrap();
        std::fs::write(stale.join("old.log"), "old").unwrap();

        let collector = shell_collector(r#"mkdir -p "$0""#);
        let archive = collector.collect("UDID2", dir.path()).unwrap();
        assert!(!archive.path().join("old.log").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_collector_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let collector = shell_collector("echo 'device locked' >&2; exit 2");
        let err = collector.collect("UDID3", dir.path()).unwrap_err();
        match err {
            AcquisitionError::CollectorFailed { status, stderr } => {
                assert_eq!(status, Some(2));
                assert_eq!(stderr, "device locked");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_without_directory_is_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let collector = shell_collector("exit 0");
        assert!(matches!(
            collector.collect("UDID4", dir.path()),
            Err(AcquisitionError::MissingArchive { .. })
        ));
    }

    #[test]
    fn test_missing_collector_is_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let collector = Collector {
            program: "guidsleuth-no-such-collector".into(),
            args: Vec::new(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            collector.collect("UDID5", dir.path()),
            Err(AcquisitionError::Process(_))
        ));
    }
}
