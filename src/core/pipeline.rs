// GuidSleuth - core/pipeline.rs
//
// Extraction pipeline: the single entry point of the core.
//
//   Assemble -> PrimaryScan -> (candidates < threshold) FallbackScan -> Vote
//
// Linear, synchronous, single-threaded. The candidate set and the vote tally
// are created per run and dropped when `run` returns, so a pipeline can be
// reused across runs without carrying state over.

use crate::core::corpus;
use crate::core::identifier::Identifier;
use crate::core::keyword::KeywordProximityScanner;
use crate::core::model::{CandidateSet, ExtractionOutcome, ExtractionStats, VoteTally};
use crate::core::path_pattern::PathPatternScanner;
use crate::core::rules::RuleSet;
use crate::core::scanner::CandidateScanner;
use crate::core::vote;
use crate::util::constants;
use crate::util::error::ExtractError;
use std::path::Path;

// =============================================================================
// Configuration
// =============================================================================

/// Tunables of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Total bytes the corpus may hold.
    pub size_ceiling_bytes: u64,

    /// Context bytes searched on each side of a marker occurrence.
    pub window_bytes: usize,

    /// The fallback runs when the primary scan found fewer distinct
    /// candidates than this. A heuristic, not a law: tune per log source.
    pub fallback_threshold: usize,

    /// Chunk size for decoding the corpus in the fallback scan.
    pub decode_chunk_bytes: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            size_ceiling_bytes: constants::DEFAULT_SIZE_CEILING_BYTES,
            window_bytes: constants::DEFAULT_WINDOW_BYTES,
            fallback_threshold: constants::DEFAULT_FALLBACK_THRESHOLD,
            decode_chunk_bytes: constants::DEFAULT_DECODE_CHUNK_BYTES,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct ExtractionPipeline {
    config: ExtractionConfig,
    rules: RuleSet,
    primary: Box<dyn CandidateScanner>,
    fallback: Box<dyn CandidateScanner>,
}

impl ExtractionPipeline {
    /// Pipeline with the keyword-proximity primary and path-pattern fallback.
    pub fn new(config: ExtractionConfig, rules: RuleSet) -> Result<Self, ExtractError> {
        let primary = KeywordProximityScanner::new(config.window_bytes)
            .map_err(ExtractError::IdentifierPattern)?;
        let fallback = PathPatternScanner::new(config.decode_chunk_bytes);
        Ok(Self::with_scanners(
            config,
            rules,
            Box::new(primary),
            Box::new(fallback),
        ))
    }

    /// Pipeline with caller-supplied scanners.
    pub fn with_scanners(
        config: ExtractionConfig,
        rules: RuleSet,
        primary: Box<dyn CandidateScanner>,
        fallback: Box<dyn CandidateScanner>,
    ) -> Self {
        Self {
            config,
            rules,
            primary,
            fallback,
        }
    }

    /// Assemble `file_paths` into a corpus and extract the identifier.
    ///
    /// # Errors
    /// `NoLogFiles` for an empty list, `NoReadableData` when no file yielded
    /// any bytes. Finding nothing is `Ok` with `identifier: None`.
    pub fn run<P: AsRef<Path>>(&self, file_paths: &[P]) -> Result<ExtractionOutcome, ExtractError> {
        if file_paths.is_empty() {
            return Err(ExtractError::NoLogFiles);
        }

        let corpus = corpus::assemble(file_paths, self.config.size_ceiling_bytes)?;

        let mut outcome = self.analyse(corpus.bytes());
        outcome.stats.files_listed = file_paths.len();
        outcome.stats.files_read = corpus.files_read();
        outcome.stats.files_skipped = corpus.skipped().len();
        Ok(outcome)
    }

    /// Run both scan phases and the vote over an already assembled corpus.
    pub fn analyse(&self, corpus: &[u8]) -> ExtractionOutcome {
        let mut candidates = CandidateSet::new();
        let mut tally = VoteTally::new();
        let mut stats = ExtractionStats {
            bytes_read: corpus.len() as u64,
            ..Default::default()
        };

        // ---------------------------------------------------------------------
        // Phase 1: keyword proximity
        // ---------------------------------------------------------------------
        stats.primary = self
            .primary
            .scan(corpus, &self.rules, &mut candidates, &mut tally);
        tracing::info!(
            scanner = self.primary.name(),
            candidates = candidates.len(),
            matches = stats.primary.matches,
            "Primary scan complete"
        );

        // ---------------------------------------------------------------------
        // Phase 2: path-pattern fallback, only when the primary under-matched
        // ---------------------------------------------------------------------
        if candidates.len() < self.config.fallback_threshold {
            tracing::info!(
                scanner = self.fallback.name(),
                candidates = candidates.len(),
                threshold = self.config.fallback_threshold,
                "Too few candidates; running fallback scan"
            );
            stats.fallback_ran = true;
            stats.fallback = self
                .fallback
                .scan(corpus, &self.rules, &mut candidates, &mut tally);
        }

        // ---------------------------------------------------------------------
        // Phase 3: vote
        // ---------------------------------------------------------------------
        stats.distinct_candidates = candidates.len();
        let verdict = vote::select(tally);
        stats.winning_votes = verdict.as_ref().map(|v| v.votes).unwrap_or(0);

        match &verdict {
            Some(v) => tracing::info!(
                votes = v.votes,
                candidates = stats.distinct_candidates,
                "Identifier selected"
            ),
            None => tracing::info!("No identifier candidates found"),
        }

        ExtractionOutcome {
            identifier: verdict.map(|v| v.identifier),
            stats,
        }
    }
}

/// Extract the identifier from `file_paths` using the built-in rules and
/// default tunables, with the given corpus size ceiling.
pub fn extract<P: AsRef<Path>>(
    file_paths: &[P],
    size_ceiling: u64,
) -> Result<Option<Identifier>, ExtractError> {
    let config = ExtractionConfig {
        size_ceiling_bytes: size_ceiling,
        ..Default::default()
    };
    let pipeline = ExtractionPipeline::new(config, RuleSet::builtin())?;
    Ok(pipeline.run(file_paths)?.identifier)
}

// =============================================================================
// Tests
// =============================================================================
