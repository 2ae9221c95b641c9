// GuidSleuth - core/model.rs
//
// Core data model types shared by the scanners, the voter and the pipeline.
// Pure data definitions with no I/O.
//
// Both collections are allocated fresh for each extraction run and dropped
// when the run returns; nothing here is shared across runs or threads.

use crate::core::identifier::Identifier;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

// =============================================================================
// Candidate set
// =============================================================================

/// Distinct identifiers in first-seen order.
///
/// Used for de-duplication and for the fallback trigger count. Voting happens
/// over the `VoteTally`, never over this set.
#[derive(Debug, Default)]
pub struct CandidateSet {
    order: Vec<Identifier>,
    seen: HashSet<Identifier>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if it has not been seen. Returns true when it was new.
    pub fn insert(&mut self, id: &Identifier) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.order.push(id.clone());
        true
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Candidates in discovery order.
    pub fn as_slice(&self) -> &[Identifier] {
        &self.order
    }
}

// =============================================================================
// Vote tally
// =============================================================================

/// Occurrence count per identifier over every raw validated match.
///
/// Entries keep first-insertion order so that the voter can break ties in
/// favour of the identifier discovered first.
#[derive(Debug, Default)]
pub struct VoteTally {
    entries: Vec<(Identifier, u64)>,
    index: HashMap<Identifier, usize>,
    total: u64,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `id`.
    pub fn record(&mut self, id: &Identifier) {
        self.total += 1;
        match self.index.get(id) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id.clone(), 1));
            }
        }
    }

    /// Occurrences recorded for `id` (0 if never seen).
    pub fn count(&self, id: &Identifier) -> u64 {
        self.index
            .get(id)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Number of distinct identifiers in the tally.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total raw matches recorded, duplicates included.
    pub fn total_matches(&self) -> u64 {
        self.total
    }

    /// `(identifier, count)` pairs in first-insertion order.
    pub fn entries(&self) -> &[(Identifier, u64)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(Identifier, u64)> {
        self.entries
    }
}

// =============================================================================
// Scan and run results
// =============================================================================

/// What a single scanner pass contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    /// Validated raw matches recorded in the tally, duplicates included.
    pub matches: u64,

    /// Identifiers that were new to the candidate set.
    pub new_candidates: usize,
}

/// Counters describing one extraction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    /// Files handed to the assembler.
    pub files_listed: usize,

    /// Files whose contents made it into the corpus.
    pub files_read: usize,

    /// Files skipped for budget or I/O reasons.
    pub files_skipped: usize,

    /// Size of the assembled corpus.
    pub bytes_read: u64,

    /// Keyword-proximity pass results.
    pub primary: ScanOutcome,

    /// Whether the path-pattern fallback was run.
    pub fallback_ran: bool,

    /// Path-pattern pass results (zero when it did not run).
    pub fallback: ScanOutcome,

    /// Distinct candidates at vote time.
    pub distinct_candidates: usize,

    /// Occurrences of the winning identifier (0 when nothing was found).
    pub winning_votes: u64,
}

/// Result of a completed extraction run.
///
/// `identifier` is `None` when no candidate survived validation. That is a
/// successful run with a negative answer, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub identifier: Option<Identifier>,
    pub stats: ExtractionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[test]
    fn test_candidate_set_keeps_first_seen_order() {
        let a = id("AAAAAAAA-0000-0000-0000-000000000001");
        let b = id("BBBBBBBB-0000-0000-0000-000000000002");
        let mut set = CandidateSet::new();
        assert!(set.insert(&b));
        assert!(set.insert(&a));
        assert!(!set.insert(&b), "duplicate must be rejected");
        assert_eq!(set.as_slice(), &[b.clone(), a.clone()]);
        assert!(set.contains(&a));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_tally_counts_duplicates_in_insertion_order() {
        let a = id("AAAAAAAA-0000-0000-0000-000000000001");
        let b = id("BBBBBBBB-0000-0000-0000-000000000002");
        let mut tally = VoteTally::new();
        tally.record(&b);
        tally.record(&a);
        tally.record(&a);
        assert_eq!(tally.count(&a), 2);
        assert_eq!(tally.count(&b), 1);
        assert_eq!(tally.total_matches(), 3);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.entries()[0].0, b, "first insertion stays first");
    }

    #[test]
    fn test_tally_unknown_identifier_counts_zero() {
        let tally = VoteTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.count(&id("CCCCCCCC-0000-0000-0000-000000000003")), 0);
    }
}
