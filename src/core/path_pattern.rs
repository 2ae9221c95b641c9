// GuidSleuth - core/path_pattern.rs
//
// Fallback strategy: path-pattern scan.
//
// Used when the keyword scan under-matched (e.g. a log format version without
// the expected marker strings). The whole corpus is decoded to text in fixed
// chunks, invalid sequences replaced, and every path pattern is applied to
// the decoded text. Each pattern's first capture group is an identifier
// candidate, validated exactly like keyword-window matches.
//
// Best effort: a decode failure is logged and reported as zero additional
// candidates. It never fails the run.

use crate::core::identifier::Identifier;
use crate::core::model::{CandidateSet, ScanOutcome, VoteTally};
use crate::core::rules::RuleSet;
use crate::core::scanner::{record_match, CandidateScanner};
use crate::util::error::FallbackError;

pub struct PathPatternScanner {
    chunk_size: usize,
}

impl PathPatternScanner {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Decode `corpus` chunk by chunk, replacing invalid UTF-8.
    ///
    /// A multi-byte sequence split across a chunk boundary decodes to
    /// replacement characters on both sides. Identifiers and path patterns
    /// are pure ASCII, which decodes the same in either chunk, and matching
    /// runs on the joined text, so a match straddling a boundary survives.
    ///
    /// Every replacement grows the text (one byte becomes three), so each
    /// decoded chunk is reserved before it is appended.
    pub fn decode(&self, corpus: &[u8]) -> Result<String, FallbackError> {
        if self.chunk_size == 0 {
            return Err(FallbackError::InvalidChunkSize);
        }

        let mut text = String::new();
        reserve(&mut text, corpus.len())?;

        for chunk in corpus.chunks(self.chunk_size) {
            let decoded = String::from_utf8_lossy(chunk);
            reserve(&mut text, decoded.len())?;
            text.push_str(&decoded);
        }
        Ok(text)
    }

    fn try_scan(
        &self,
        corpus: &[u8],
        rules: &RuleSet,
        candidates: &mut CandidateSet,
        tally: &mut VoteTally,
    ) -> Result<ScanOutcome, FallbackError> {
        let text = self.decode(corpus)?;
        let mut outcome = ScanOutcome::default();

        for pattern in rules.path_patterns() {
            let mut hits = 0usize;
            for caps in pattern.regex().captures_iter(&text) {
                let Some(group) = caps.get(1) else {
                    continue;
                };
                hits += 1;
                if let Some(id) = Identifier::parse(group.as_str()) {
                    record_match(&id, candidates, tally, &mut outcome);
                }
            }
            tracing::debug!(pattern = pattern.as_str(), hits, "Path pattern search");
        }

        Ok(outcome)
    }
}

fn reserve(text: &mut String, additional: usize) -> Result<(), FallbackError> {
    text.try_reserve(additional)
        .map_err(|source| FallbackError::Allocation {
            bytes: additional,
            source,
        })
}

impl CandidateScanner for PathPatternScanner {
    fn name(&self) -> &'static str {
        "path-pattern"
    }

    fn scan(
        &self,
        corpus: &[u8],
        rules: &RuleSet,
        candidates: &mut CandidateSet,
        tally: &mut VoteTally,
    ) -> ScanOutcome {
        match self.try_scan(corpus, rules, candidates, tally) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Path pattern scan abandoned; no extra candidates");
                ScanOutcome::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::constants;

    const ID: &str = "1B2C3D4E-0000-1111-2222-333344445555";

    fn run(scanner: &PathPatternScanner, corpus: &[u8]) -> (CandidateSet, VoteTally, ScanOutcome) {
        let mut candidates = CandidateSet::new();
        let mut tally = VoteTally::new();
        let outcome = scanner.scan(corpus, &RuleSet::builtin(), &mut candidates, &mut tally);
        (candidates, tally, outcome)
    }

    #[test]
    fn test_recovers_identifier_from_system_group_path() {
        let scanner = PathPatternScanner::new(constants::DEFAULT_DECODE_CHUNK_BYTES);
        let corpus = format!(
            "open /private/var/containers/Shared/SystemGroup/{}/Library/x.db",
            ID.to_lowercase()
        );
        let (candidates, tally, outcome) = run(&scanner, corpus.as_bytes());
        assert_eq!(candidates.as_slice()[0].as_str(), ID);
        assert_eq!(outcome.new_candidates, 1);
        // Both the strict and the loose SystemGroup pattern match this path.
        assert_eq!(tally.count(&Identifier::parse(ID).unwrap()), 2);
    }

    #[test]
    fn test_file_url_form_is_recovered() {
        let scanner = PathPatternScanner::new(constants::DEFAULT_DECODE_CHUNK_BYTES);
        let corpus = format!("url=file:///var/SystemGroup.x/{ID}");
        let (candidates, _, _) = run(&scanner, corpus.as_bytes());
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_captured_group_must_pass_validation() {
        let scanner = PathPatternScanner::new(constants::DEFAULT_DECODE_CHUNK_BYTES);
        // 36 characters of the capture alphabet, but not the 8-4-4-4-12 shape.
        let corpus = format!("/SystemGroup/{}/", "-".repeat(36));
        let (candidates, tally, outcome) = run(&scanner, corpus.as_bytes());
        assert!(candidates.is_empty());
        assert!(tally.is_empty());
        assert_eq!(outcome, ScanOutcome::default());
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let scanner = PathPatternScanner::new(8);
        let mut corpus = b"\xff\xfe\xfd garbage \xc3".to_vec();
        corpus.extend_from_slice(format!("/SystemGroup/{ID}/").as_bytes());
        let (candidates, _, _) = run(&scanner, &corpus);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_decode_joins_chunks() {
        let scanner = PathPatternScanner::new(3);
        assert_eq!(scanner.decode(b"abcdefg").unwrap(), "abcdefg");
    }

    #[test]
    fn test_decode_grows_past_input_length_on_replacement() {
        let scanner = PathPatternScanner::new(2);
        let text = scanner.decode(b"\xff\xffab\xff").unwrap();
        assert_eq!(text, "\u{FFFD}\u{FFFD}ab\u{FFFD}");
        assert_eq!(text.len(), 3 * 3 + 2);
    }

    #[test]
    fn test_identifier_across_chunk_boundary_is_recovered() {
        let corpus = format!("/SystemGroup/{ID}/");
        // Boundary falls inside the identifier for every chunk size tried.
        for chunk_size in [14, 20, 31, 40] {
            let scanner = PathPatternScanner::new(chunk_size);
            let (candidates, _, _) = run(&scanner, corpus.as_bytes());
            assert_eq!(candidates.len(), 1, "chunk size {chunk_size}");
            assert_eq!(candidates.as_slice()[0].as_str(), ID);
        }
    }

    #[test]
    fn test_zero_chunk_size_degrades_to_no_candidates() {
        let scanner = PathPatternScanner::new(0);
        assert!(matches!(
            scanner.decode(b"x"),
            Err(FallbackError::InvalidChunkSize)
        ));
        let corpus = format!("/SystemGroup/{ID}/");
        let (candidates, _, outcome) = run(&scanner, corpus.as_bytes());
        assert!(candidates.is_empty());
        assert_eq!(outcome, ScanOutcome::default());
    }
}
