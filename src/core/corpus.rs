// GuidSleuth - core/corpus.rs
//
// Corpus assembly: concatenates an ordered list of log files into one
// in-memory byte buffer under a total-size ceiling.
//
// Limits:
//   - The ceiling is never exceeded; a file that would overflow it is skipped
//     whole, never truncated.
//   - Per-file I/O errors are non-fatal and recorded as skipped files.
//   - Only an empty result (zero bytes from every file) is fatal.

use crate::util::constants;
use crate::util::error::ExtractError;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// The assembled log bytes for one extraction run.
#[derive(Debug)]
pub struct LogCorpus {
    bytes: Vec<u8>,
    files_read: usize,
    skipped: Vec<SkippedFile>,
}

impl LogCorpus {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cumulative bytes consumed from source files.
    pub fn total_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn files_read(&self) -> usize {
        self.files_read
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }
}

/// A file left out of the corpus, with the reason.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub enum SkipReason {
    /// Reading the file would have pushed the corpus past the ceiling.
    OverBudget { size: u64, remaining: u64 },

    /// The file could not be opened, stat'ed or read.
    Unreadable(io::Error),
}

/// Read `paths` in order and concatenate their contents.
///
/// A file is skipped when its size exceeds what is left of `size_ceiling`
/// (checked against metadata first, then against the bytes actually read in
/// case the file grew) or when any I/O error occurs. Returns
/// `ExtractError::NoReadableData` if the resulting corpus is empty.
pub fn assemble<P: AsRef<Path>>(paths: &[P], size_ceiling: u64) -> Result<LogCorpus, ExtractError> {
    let mut corpus = LogCorpus {
        bytes: Vec::new(),
        files_read: 0,
        skipped: Vec::new(),
    };

    tracing::debug!(files = paths.len(), size_ceiling, "Assembling log corpus");

    for (i, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let remaining = size_ceiling.saturating_sub(corpus.total_bytes());

        match read_within_budget(path, remaining, &mut corpus.bytes) {
            Ok(()) => corpus.files_read += 1,
            Err(reason) => {
                match &reason {
                    SkipReason::OverBudget { size, remaining } => tracing::debug!(
                        file = %path.display(),
                        size,
                        remaining,
                        "Skipped: would exceed corpus size ceiling"
                    ),
                    SkipReason::Unreadable(e) => tracing::debug!(
                        file = %path.display(),
                        error = %e,
                        "Skipped: unreadable"
                    ),
                }
                corpus.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }

        let done = i + 1;
        if done % constants::READ_PROGRESS_EVERY_FILES == 0 {
            tracing::debug!(
                done,
                total = paths.len(),
                mb = corpus.total_bytes() as f64 / (1024.0 * 1024.0),
                "Corpus read progress"
            );
        }
    }

    if corpus.bytes.is_empty() {
        return Err(ExtractError::NoReadableData {
            attempted: paths.len(),
            skipped: corpus.skipped.len(),
        });
    }

    tracing::info!(
        files_read = corpus.files_read,
        files_skipped = corpus.skipped.len(),
        mb = %format!("{:.1}", corpus.total_bytes() as f64 / (1024.0 * 1024.0)),
        "Log corpus assembled"
    );

    Ok(corpus)
}

/// Append the contents of `path` to `buf`, or leave `buf` untouched and
/// report why the file was skipped.
fn read_within_budget(path: &Path, remaining: u64, buf: &mut Vec<u8>) -> Result<(), SkipReason> {
    let file = File::open(path).map_err(SkipReason::Unreadable)?;
    let size = file.metadata().map_err(SkipReason::Unreadable)?.len();
    if size > remaining {
        return Err(SkipReason::OverBudget { size, remaining });
    }

    let start = buf.len();
    // One byte past the budget is enough to detect a file that grew.
    let result = file.take(remaining.saturating_add(1)).read_to_end(buf);
    match result {
        Ok(n) if n as u64 > remaining => {
            buf.truncate(start);
            Err(SkipReason::OverBudget {
                size: n as u64,
                remaining,
            })
        }
        Ok(_) => Ok(()),
        Err(e) => {
            buf.truncate(start);
            Err(SkipReason::Unreadable(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        fs::write(&a, b"first ").unwrap();
        fs::write(&b, b"second").unwrap();

        let corpus = assemble(&[&a, &b], 1024).unwrap();
        assert_eq!(corpus.bytes(), b"first second");
        assert_eq!(corpus.total_bytes(), 12);
        assert_eq!(corpus.files_read(), 2);
        assert!(corpus.skipped().is_empty());
    }

    #[test]
    fn test_skips_file_that_would_exceed_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.log");
        let big = dir.path().join("big.log");
        let tail = dir.path().join("tail.log");
        fs::write(&small, vec![b'a'; 6]).unwrap();
        fs::write(&big, vec![b'b'; 8]).unwrap();
        fs::write(&tail, vec![b'c'; 4]).unwrap();

        let corpus = assemble(&[&small, &big, &tail], 10).unwrap();
        // big (8) does not fit after small (6); tail (4) fits exactly.
        assert_eq!(corpus.bytes(), b"aaaaaacccc");
        assert!(corpus.total_bytes() <= 10);
        assert_eq!(corpus.skipped().len(), 1);
        assert_eq!(corpus.skipped()[0].path, big);
        assert!(matches!(
            corpus.skipped()[0].reason,
            SkipReason::OverBudget {
                size: 8,
                remaining: 4
            }
        ));
    }

    #[test]
    fn test_missing_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.log");
        fs::write(&good, b"data").unwrap();
        let missing = dir.path().join("missing.log");

        let corpus = assemble(&[&missing, &good], 1024).unwrap();
        assert_eq!(corpus.bytes(), b"data");
        assert!(matches!(
            corpus.skipped()[0].reason,
            SkipReason::Unreadable(_)
        ));
    }

    #[test]
    fn test_all_unreadable_is_no_readable_data() {
        let dir = tempfile::tempdir().unwrap();
        let result = assemble(
            &[dir.path().join("nope1.log"), dir.path().join("nope2.log")],
            1024,
        );
        assert!(matches!(
            result,
            Err(ExtractError::NoReadableData {
                attempted: 2,
                skipped: 2
            })
        ));
    }

    #[test]
    fn test_only_empty_files_is_no_readable_data() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.log");
        fs::write(&empty, b"").unwrap();
        assert!(matches!(
            assemble(&[&empty], 1024),
            Err(ExtractError::NoReadableData { .. })
        ));
    }

    #[test]
    fn test_directory_path_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.log");
        fs::write(&good, b"x").unwrap();
        let corpus = assemble(&[dir.path().to_path_buf(), good], 1024).unwrap();
        assert_eq!(corpus.bytes(), b"x");
        assert_eq!(corpus.skipped().len(), 1);
    }
}
