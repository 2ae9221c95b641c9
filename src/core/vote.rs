// GuidSleuth - core/vote.rs
//
// Frequency vote over the tally of raw validated matches.

use crate::core::identifier::Identifier;
use crate::core::model::VoteTally;

/// The winning identifier and how many matches it collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub identifier: Identifier,
    pub votes: u64,
}

/// Pick the identifier with the highest count.
///
/// Ties go to the identifier that entered the tally first: a later entry only
/// replaces the leader with a strictly higher count. An empty tally yields
/// `None`, the "not found" answer.
pub fn select(tally: VoteTally) -> Option<Verdict> {
    let mut best: Option<Verdict> = None;
    for (identifier, votes) in tally.into_entries() {
        let leads = match &best {
            Some(current) => votes > current.votes,
            None => true,
        };
        if leads {
            best = Some(Verdict { identifier, votes });
        }
    }

    if let Some(verdict) = &best {
        tracing::debug!(winner = %verdict.identifier, votes = verdict.votes, "Vote complete");
    }
    best
}
