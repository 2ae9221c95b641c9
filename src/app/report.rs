// GuidSleuth - app/report.rs
//
// Run summary for the user: human-readable text or JSON.
// Writes to any `Write` so the CLI can target stdout and tests a buffer.

use crate::app::run::RunOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

const RULE: &str = "============================================================";

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub udid: Option<String>,
    pub guid: Option<String>,
    pub found: bool,
    pub files_listed: usize,
    pub files_read: usize,
    pub bytes_read: u64,
    pub fallback_used: bool,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl ExtractionReport {
    pub fn from_run(run: &RunOutcome) -> Self {
        let stats = &run.outcome.stats;
        let guid = run
            .outcome
            .identifier
            .as_ref()
            .map(|id| id.as_str().to_string());
        Self {
            udid: run.udid.clone(),
            found: guid.is_some(),
            guid,
            files_listed: run.files_listed,
            files_read: stats.files_read,
            bytes_read: stats.bytes_read,
            fallback_used: stats.fallback_ran,
            elapsed_ms: u64::try_from(run.elapsed.as_millis()).unwrap_or(u64::MAX),
            finished_at: Utc::now(),
        }
    }

    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }

    pub fn write_text<W: Write>(&self, mut writer: W) -> io::Result<()> {
        if let Some(udid) = &self.udid {
            writeln!(writer, "Device UDID: {udid}")?;
        }
        writeln!(
            writer,
            "Scanned {} of {} files ({:.1} MB){}",
            self.files_read,
            self.files_listed,
            self.bytes_read as f64 / (1024.0 * 1024.0),
            if self.fallback_used {
                ", path-pattern fallback used"
            } else {
                ""
            }
        )?;
        writeln!(writer)?;
        writeln!(writer, "{RULE}")?;

        match &self.guid {
            Some(guid) => {
                writeln!(writer, "GUID extracted: {guid}")?;
                writeln!(writer, "{RULE}")?;
                writeln!(writer)?;
                writeln!(writer, "This GUID identifies the Books app data container.")?;
            }
            None => {
                writeln!(writer, "No GUID found")?;
                writeln!(writer, "{RULE}")?;
                writeln!(writer)?;
                writeln!(writer, "Possible causes:")?;
                writeln!(writer, "1. The Books app has never been used on this device")?;
                writeln!(writer, "2. The logs contain no BLDatabaseManager entries")?;
                writeln!(writer, "3. The GUID format or location has changed")?;
            }
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "Finished in {:.2}s",
            self.elapsed_ms as f64 / 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::Identifier;
    use crate::core::model::{ExtractionOutcome, ExtractionStats};
    use std::path::PathBuf;
    use std::time::Duration;

    fn run(identifier: Option<&str>) -> RunOutcome {
        RunOutcome {
            udid: Some("00008020-TEST".to_string()),
            log_dir: PathBuf::from("x.logarchive"),
            files_listed: 3,
            outcome: ExtractionOutcome {
                identifier: identifier.and_then(Identifier::parse),
                stats: ExtractionStats {
                    files_read: 2,
                    bytes_read: 2 * 1024 * 1024,
                    fallback_ran: true,
                    ..Default::default()
                },
            },
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_found_report_text() {
        let report = ExtractionReport::from_run(&run(Some("3f2504e0-4f89-11d3-9a0c-0305e82c3301")));
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("GUID extracted: 3F2504E0-4F89-11D3-9A0C-0305E82C3301"));
        assert!(text.contains("Scanned 2 of 3 files (2.0 MB), path-pattern fallback used"));
        assert!(text.contains("Finished in 1.50s"));
    }

    #[test]
    fn test_not_found_report_lists_causes() {
        let report = ExtractionReport::from_run(&run(None));
        assert!(!report.found);
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No GUID found"));
        assert!(text.contains("BLDatabaseManager"));
    }

    #[test]
    fn test_json_report_fields() {
        let report = ExtractionReport::from_run(&run(Some("3F2504E0-4F89-11D3-9A0C-0305E82C3301")));
        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["found"], true);
        assert_eq!(value["guid"], "3F2504E0-4F89-11D3-9A0C-0305E82C3301");
        assert_eq!(value["files_read"], 2);
        assert_eq!(value["fallback_used"], true);
        assert_eq!(value["elapsed_ms"], 1500);
        assert!(value["finished_at"].is_string());
    }
}
