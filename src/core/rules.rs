// GuidSleuth - core/rules.rs
//
// Extraction rules: the marker byte-strings and path patterns the scanners
// consume. Rules are data (TOML), so new log formats can be covered by
// adding a rule file instead of touching scanner logic.
// Core layer: accepts TOML strings, never touches the filesystem.
// I/O for user rule files is handled by app::rules_mgr.

use crate::util::constants;
use crate::util::error::RuleError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw TOML rule definition as deserialized from a .toml file.
/// This is validated and compiled into an `ExtractionRule` for runtime use.
#[derive(Debug, Deserialize)]
pub struct RuleDefinition {
    pub rule: RuleMeta,
    #[serde(default)]
    pub markers: MarkersDef,
    #[serde(default)]
    pub paths: PathsDef,
}

#[derive(Debug, Deserialize)]
pub struct RuleMeta {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct MarkersDef {
    #[serde(default)]
    pub needles: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PathsDef {
    #[serde(default)]
    pub patterns: Vec<String>,
}

// =============================================================================
// Compiled runtime types
// =============================================================================

/// A byte-string whose occurrences anchor a keyword-proximity window.
///
/// Matched literally and case-sensitively. The finder is an escaped literal
/// regex, which the regex crate serves with a substring prefilter.
#[derive(Debug, Clone)]
pub struct Marker {
    bytes: Vec<u8>,
    finder: regex::bytes::Regex,
}

impl Marker {
    pub fn new(needle: &str) -> Result<Self, regex::Error> {
        let finder = regex::bytes::Regex::new(&regex::escape(needle))?;
        Ok(Self {
            bytes: needle.as_bytes().to_vec(),
            finder,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Start offsets of every occurrence in `haystack`. The search resumes
    /// after the end of each match, so occurrences never overlap.
    pub fn occurrences<'h>(&'h self, haystack: &'h [u8]) -> impl Iterator<Item = usize> + 'h {
        self.finder.find_iter(haystack).map(|m| m.start())
    }

    /// Lossy text form, for logging.
    pub fn display(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Marker {}

/// A case-insensitive path-shaped pattern whose first capture group is an
/// identifier candidate.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// One validated rule file.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub markers: Vec<Marker>,
    pub path_patterns: Vec<PathPattern>,
    pub is_builtin: bool,
    pub source_path: Option<PathBuf>,
}

// =============================================================================
// Rule validation and compilation
// =============================================================================

/// Parse a TOML string into a `RuleDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_rule_toml(toml_content: &str, source_path: &Path) -> Result<RuleDefinition, RuleError> {
    toml::from_str(toml_content).map_err(|e| RuleError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate a `RuleDefinition` and compile it into a runtime `ExtractionRule`.
///
/// Validates:
/// - `rule.id` is present and non-empty
/// - at least one marker or path pattern is defined, none of them empty
/// - path patterns are valid regexes within the size limit, each with a
///   capture group
pub fn validate_and_compile(
    def: RuleDefinition,
    source_path: &Path,
    is_builtin: bool,
) -> Result<ExtractionRule, RuleError> {
    let id = def.rule.id.trim().to_string();
    if id.is_empty() {
        return Err(RuleError::MissingField {
            rule_id: "(empty)".to_string(),
            field: "rule.id",
        });
    }

    if def.markers.needles.is_empty() && def.paths.patterns.is_empty() {
        return Err(RuleError::Empty { rule_id: id });
    }

    if def.markers.needles.iter().any(|n| n.is_empty()) {
        return Err(RuleError::MissingField {
            rule_id: id,
            field: "markers.needles",
        });
    }

    let markers = def
        .markers
        .needles
        .iter()
        .map(|n| {
            Marker::new(n).map_err(|e| RuleError::InvalidRegex {
                rule_id: id.clone(),
                pattern: n.clone(),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let path_patterns = def
        .paths
        .patterns
        .iter()
        .map(|p| compile_path_pattern(&id, p))
        .collect::<Result<Vec<_>, _>>()?;

    let name = if def.rule.name.is_empty() {
        id.clone()
    } else {
        def.rule.name
    };

    Ok(ExtractionRule {
        id,
        name,
        description: def.rule.description,
        markers,
        path_patterns,
        is_builtin,
        source_path: Some(source_path.to_path_buf()),
    })
}

fn compile_path_pattern(rule_id: &str, pattern: &str) -> Result<PathPattern, RuleError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(RuleError::RegexTooLong {
            rule_id: rule_id.to_string(),
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| RuleError::InvalidRegex {
            rule_id: rule_id.to_string(),
            pattern: pattern.to_string(),
            source: e,
        })?;

    // captures_len() counts the implicit whole-match group.
    if regex.captures_len() < 2 {
        return Err(RuleError::MissingCaptureGroup {
            rule_id: rule_id.to_string(),
            pattern: pattern.to_string(),
        });
    }

    Ok(PathPattern { regex })
}

// =============================================================================
// Built-in rules (embedded at compile time)
// =============================================================================

/// Embedded TOML content for built-in rules.
/// Each tuple is (filename, TOML content).
pub fn builtin_rule_sources() -> Vec<(&'static str, &'static str)> {
    vec![(
        "bookassetd.toml",
        include_str!("../../rules/bookassetd.toml"),
    )]
}

/// Load and compile all built-in rules.
pub fn load_builtin_rules() -> Vec<ExtractionRule> {
    let mut rules = Vec::new();

    for (filename, content) in builtin_rule_sources() {
        let path = PathBuf::from(format!("<builtin>/{filename}"));
        match parse_rule_toml(content, &path).and_then(|def| validate_and_compile(def, &path, true))
        {
            Ok(rule) => {
                tracing::debug!(rule_id = %rule.id, "Loaded built-in rule");
                rules.push(rule);
            }
            Err(e) => {
                // Built-in rule failures are bugs, but we still degrade gracefully
                tracing::error!(file = filename, error = %e, "Failed to load built-in rule");
            }
        }
    }

    rules
}

// =============================================================================
// Merged rule set
// =============================================================================

/// The flattened markers and path patterns of all active rules, in rule order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    markers: Vec<Marker>,
    path_patterns: Vec<PathPattern>,
}

impl RuleSet {
    /// The set compiled from the embedded rule files only.
    pub fn builtin() -> Self {
        Self::from_rules(&load_builtin_rules())
    }

    /// Merge `rules` in order. Exact duplicate markers and patterns are kept
    /// once, at their first position.
    pub fn from_rules(rules: &[ExtractionRule]) -> Self {
        let mut set = Self::default();
        for rule in rules {
            for marker in &rule.markers {
                if !set.markers.contains(marker) {
                    set.markers.push(marker.clone());
                }
            }
            for pattern in &rule.path_patterns {
                if !set.path_patterns.iter().any(|p| p.as_str() == pattern.as_str()) {
                    set.path_patterns.push(pattern.clone());
                }
            }
        }
        set
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn path_patterns(&self) -> &[PathPattern] {
        &self.path_patterns
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.path_patterns.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
