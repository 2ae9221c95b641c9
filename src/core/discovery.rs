// GuidSleuth - core/discovery.rs
//
// Log file listing for one extraction run.
//
// Reads only directory entries and metadata, never file contents; the corpus
// assembler owns reading. Order matters to the assembler's byte budget, so
// the walk is deterministic: the primary trace file first, then a
// depth-first walk with entries sorted by file name.
//
// Per-entry I/O errors are non-fatal and logged. max_files and max_depth are
// clamped to named-constant upper bounds.

use crate::util::constants;
use crate::util::error::DiscoveryError;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Maximum number of files returned, primary trace file included.
    pub max_files: usize,

    /// Maximum directory recursion depth.
    pub max_depth: usize,

    /// Filename globs, matched against the lowercased file name.
    /// An empty list means "include everything".
    pub include_patterns: Vec<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_files: constants::DEFAULT_MAX_FILES,
            max_depth: constants::DEFAULT_MAX_DEPTH,
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

/// List the log files under `root` in assembly order.
///
/// # Fatal errors
/// `RootNotFound`, `NotADirectory`, or `PermissionDenied` for the root itself.
/// An empty result is not an error here; the caller decides whether an empty
/// list is fatal.
pub fn list_log_files(root: &Path, config: &ListingConfig) -> Result<Vec<PathBuf>, DiscoveryError> {
    // fs::metadata rather than Path::is_dir so permission errors stay distinct
    // from "does not exist".
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DiscoveryError::PermissionDenied {
                path: root.to_path_buf(),
                source: e,
            })
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let max_files = config.max_files.min(constants::ABSOLUTE_MAX_FILES);
    let max_depth = config.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);
    let include_pats = compile_patterns(&config.include_patterns);

    tracing::debug!(
        root = %root.display(),
        max_depth,
        max_files,
        include = ?config.include_patterns,
        "Listing log files"
    );

    let mut files: Vec<PathBuf> = Vec::new();

    let primary = root.join(constants::PRIMARY_TRACE_FILE);
    if primary.is_file() && max_files > 0 {
        tracing::debug!(file = %primary.display(), "Primary trace file present");
        files.push(primary.clone());
    }

    let walker = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name();

    for entry_result in walker {
        if files.len() >= max_files {
            tracing::info!(limit = max_files, "File list capped");
            break;
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path_str = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                tracing::debug!(path = %path_str, error = %e, "Skipping inaccessible entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path == primary {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::debug!(path = %path.display(), "Skipping non-UTF-8 filename");
            continue;
        };

        if !is_included(&file_name.to_lowercase(), &include_pats) {
            tracing::trace!(file = file_name, "Not matched by include patterns");
            continue;
        }

        files.push(path.to_path_buf());
    }

    tracing::debug!(files = files.len(), "Listing complete");
    Ok(files)
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Patterns are lowercased so matching is case-insensitive on both sides.
/// Patterns that fail to compile are logged and skipped.
fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(&p.to_lowercase()) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    if include_pats.is_empty() {
        return true;
    }
    include_pats.iter().any(|p| p.matches(file_name))
}

// =============================================================================
// Tests
// =============================================================================
