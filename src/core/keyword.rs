// GuidSleuth - core/keyword.rs
//
// Primary strategy: keyword-proximity scan.
//
// For every marker, every occurrence in the corpus (case-sensitive, the
// search resuming after each match) opens a window of `window` bytes on each
// side. Only that window is searched for identifier-shaped runs.

use crate::core::identifier::Identifier;
use crate::core::model::{CandidateSet, ScanOutcome, VoteTally};
use crate::core::rules::RuleSet;
use crate::core::scanner::{record_match, CandidateScanner};
use crate::util::constants;
use regex::bytes::Regex;

pub struct KeywordProximityScanner {
    window: usize,
    identifier: Regex,
}

impl KeywordProximityScanner {
    /// Build a scanner with `window` bytes of context on each side of a marker.
    pub fn new(window: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            window,
            identifier: Regex::new(constants::IDENTIFIER_BYTE_PATTERN)?,
        })
    }
}

impl CandidateScanner for KeywordProximityScanner {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn scan(
        &self,
        corpus: &[u8],
        rules: &RuleSet,
        candidates: &mut CandidateSet,
        tally: &mut VoteTally,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for marker in rules.markers() {
            let mut hits = 0usize;

            for pos in marker.occurrences(corpus) {
                hits += 1;
                let start = pos.saturating_sub(self.window);
                let end = pos
                    .saturating_add(marker.len())
                    .saturating_add(self.window)
                    .min(corpus.len());

                for m in self.identifier.find_iter(&corpus[start..end]) {
                    if let Some(id) = Identifier::from_bytes(m.as_bytes()) {
                        record_match(&id, candidates, tally, &mut outcome);
                    }
                }
            }

            tracing::debug!(marker = %marker.display(), hits, "Keyword search");
        }

        outcome
    }
}
