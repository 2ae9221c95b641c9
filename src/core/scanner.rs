// GuidSleuth - core/scanner.rs
//
// The seam shared by both candidate discovery strategies.
//
// A scanner reads the corpus, validates everything it harvests through
// `Identifier`, and records results into the run's candidate set and vote
// tally. Scanners never fail: anything they cannot handle is recovered inside
// the scanner and reported as fewer candidates.

use crate::core::identifier::Identifier;
use crate::core::model::{CandidateSet, ScanOutcome, VoteTally};
use crate::core::rules::RuleSet;

/// One candidate discovery strategy.
pub trait CandidateScanner {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Scan `corpus` using `rules`, recording every validated match.
    fn scan(
        &self,
        corpus: &[u8],
        rules: &RuleSet,
        candidates: &mut CandidateSet,
        tally: &mut VoteTally,
    ) -> ScanOutcome;
}

/// Record one validated match: always counted in the tally, added to the
/// candidate set only the first time it is seen.
pub(crate) fn record_match(
    id: &Identifier,
    candidates: &mut CandidateSet,
    tally: &mut VoteTally,
    outcome: &mut ScanOutcome,
) {
    tally.record(id);
    outcome.matches += 1;
    if candidates.insert(id) {
        outcome.new_candidates += 1;
        tracing::debug!(candidate = %id, "New candidate");
    }
}
