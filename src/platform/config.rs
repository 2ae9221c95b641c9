// GuidSleuth - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for GuidSleuth configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/guidsleuth/ or %APPDATA%\GuidSleuth\config\)
    pub config_dir: PathBuf,

    /// User rule directory (e.g. ~/.config/guidsleuth/rules/)
    pub user_rules_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let user_rules_dir = config_dir.join(constants::RULES_DIR_NAME);

            tracing::debug!(
                config = %config_dir.display(),
                rules = %user_rules_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                user_rules_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                user_rules_dir: fallback.join(constants::RULES_DIR_NAME),
                config_dir: fallback,
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads in an
/// older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub extraction: ExtractionSection,
    pub discovery: DiscoverySection,
    pub acquisition: AcquisitionSection,
    pub rules: RulesSection,
    pub logging: LoggingSection,
}

/// `[extraction]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    /// Corpus size ceiling in MiB.
    pub max_size_mb: Option<u64>,
    /// Context bytes on each side of a marker.
    pub window_bytes: Option<usize>,
    /// Distinct candidates below which the fallback scan runs.
    pub fallback_threshold: Option<usize>,
    /// Fallback decode chunk size in bytes.
    pub decode_chunk_bytes: Option<usize>,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    pub max_files: Option<usize>,
    pub max_depth: Option<usize>,
    pub include_patterns: Option<Vec<String>>,
}

/// `[acquisition]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct AcquisitionSection {
    /// Log collection timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Directory the `.logarchive` is collected into.
    pub work_dir: Option<String>,
    /// Keep the collected archive after the run.
    pub keep_logs: Option<bool>,
}

/// `[rules]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// Additional rule directory.
    pub user_rule_directory: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Extraction --
    pub size_ceiling_bytes: u64,
    pub window_bytes: usize,
    pub fallback_threshold: usize,
    pub decode_chunk_bytes: usize,

    // -- Discovery --
    pub max_files: usize,
    pub max_depth: usize,
    pub include_patterns: Vec<String>,

    // -- Acquisition --
    pub collect_timeout_secs: u64,
    /// `None` means the current directory.
    pub work_dir: Option<PathBuf>,
    pub keep_logs: bool,

    // -- Rules --
    pub user_rule_dir: Option<PathBuf>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            size_ceiling_bytes: constants::DEFAULT_SIZE_CEILING_BYTES,
            window_bytes: constants::DEFAULT_WINDOW_BYTES,
            fallback_threshold: constants::DEFAULT_FALLBACK_THRESHOLD,
            decode_chunk_bytes: constants::DEFAULT_DECODE_CHUNK_BYTES,
            max_files: constants::DEFAULT_MAX_FILES,
            max_depth: constants::DEFAULT_MAX_DEPTH,
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            collect_timeout_secs: constants::DEFAULT_COLLECT_TIMEOUT_SECS,
            work_dir: None,
            keep_logs: false,
            user_rule_dir: None,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings (first run). An unreadable
/// or unparseable file yields defaults with one warning: the run still
/// proceeds, but the user is told.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.clone(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.clone(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let config = validate(raw, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Validate each field against named constants, accumulating all problems.
pub fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Extraction: max_size_mb --
    if let Some(mb) = raw.extraction.max_size_mb {
        let bytes = mb.saturating_mul(1024 * 1024);
        if (constants::MIN_SIZE_CEILING_BYTES..=constants::ABSOLUTE_MAX_SIZE_CEILING_BYTES)
            .contains(&bytes)
        {
            config.size_ceiling_bytes = bytes;
        } else {
            out_of_range(
                warnings,
                "[extraction] max_size_mb",
                mb,
                format!(
                    "1-{} (default {})",
                    constants::ABSOLUTE_MAX_SIZE_CEILING_BYTES / (1024 * 1024),
                    constants::DEFAULT_SIZE_CEILING_BYTES / (1024 * 1024),
                ),
            );
        }
    }

    // -- Extraction: window_bytes --
    if let Some(window) = raw.extraction.window_bytes {
        if (constants::MIN_WINDOW_BYTES..=constants::MAX_WINDOW_BYTES).contains(&window) {
            config.window_bytes = window;
        } else {
            out_of_range(
                warnings,
                "[extraction] window_bytes",
                window,
                format!(
                    "{}-{} (default {})",
                    constants::MIN_WINDOW_BYTES,
                    constants::MAX_WINDOW_BYTES,
                    constants::DEFAULT_WINDOW_BYTES,
                ),
            );
        }
    }

    // -- Extraction: fallback_threshold --
    if let Some(threshold) = raw.extraction.fallback_threshold {
        if threshold <= constants::MAX_FALLBACK_THRESHOLD {
            config.fallback_threshold = threshold;
        } else {
            out_of_range(
                warnings,
                "[extraction] fallback_threshold",
                threshold,
                format!(
                    "0-{} (default {})",
                    constants::MAX_FALLBACK_THRESHOLD,
                    constants::DEFAULT_FALLBACK_THRESHOLD,
                ),
            );
        }
    }

    // -- Extraction: decode_chunk_bytes --
    if let Some(chunk) = raw.extraction.decode_chunk_bytes {
        if (constants::MIN_DECODE_CHUNK_BYTES..=constants::MAX_DECODE_CHUNK_BYTES).contains(&chunk)
        {
            config.decode_chunk_bytes = chunk;
        } else {
            out_of_range(
                warnings,
                "[extraction] decode_chunk_bytes",
                chunk,
                format!(
                    "{}-{} (default {})",
                    constants::MIN_DECODE_CHUNK_BYTES,
                    constants::MAX_DECODE_CHUNK_BYTES,
                    constants::DEFAULT_DECODE_CHUNK_BYTES,
                ),
            );
        }
    }

    // -- Discovery: max_files --
    if let Some(files) = raw.discovery.max_files {
        if (constants::MIN_MAX_FILES..=constants::ABSOLUTE_MAX_FILES).contains(&files) {
            config.max_files = files;
        } else {
            out_of_range(
                warnings,
                "[discovery] max_files",
                files,
                format!(
                    "{}-{} (default {})",
                    constants::MIN_MAX_FILES,
                    constants::ABSOLUTE_MAX_FILES,
                    constants::DEFAULT_MAX_FILES,
                ),
            );
        }
    }

    // -- Discovery: max_depth --
    if let Some(depth) = raw.discovery.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            out_of_range(
                warnings,
                "[discovery] max_depth",
                depth,
                format!(
                    "1-{} (default {})",
                    constants::ABSOLUTE_MAX_DEPTH,
                    constants::DEFAULT_MAX_DEPTH,
                ),
            );
        }
    }

    // -- Discovery: include_patterns --
    if let Some(patterns) = raw.discovery.include_patterns {
        if patterns.is_empty() {
            warnings.push(
                "[discovery] include_patterns is empty. Using default patterns.".to_string(),
            );
        } else {
            config.include_patterns = patterns;
        }
    }

    // -- Acquisition: timeout_secs --
    if let Some(secs) = raw.acquisition.timeout_secs {
        if (constants::MIN_COLLECT_TIMEOUT_SECS..=constants::MAX_COLLECT_TIMEOUT_SECS)
            .contains(&secs)
        {
            config.collect_timeout_secs = secs;
        } else {
            out_of_range(
                warnings,
                "[acquisition] timeout_secs",
                secs,
                format!(
                    "{}-{} (default {})",
                    constants::MIN_COLLECT_TIMEOUT_SECS,
                    constants::MAX_COLLECT_TIMEOUT_SECS,
                    constants::DEFAULT_COLLECT_TIMEOUT_SECS,
                ),
            );
        }
    }

    // -- Acquisition: work_dir, keep_logs --
    if let Some(dir) = raw.acquisition.work_dir.filter(|d| !d.is_empty()) {
        config.work_dir = Some(PathBuf::from(dir));
    }
    if let Some(keep) = raw.acquisition.keep_logs {
        config.keep_logs = keep;
    }

    // -- Rules: user_rule_directory --
    if let Some(dir) = raw.rules.user_rule_directory.filter(|d| !d.is_empty()) {
        config.user_rule_dir = Some(PathBuf::from(dir));
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    config
}

fn out_of_range(
    warnings: &mut Vec<String>,
    field: &str,
    value: impl std::fmt::Display,
    expected: String,
) {
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    };
    warnings.push(format!("{err}. Using default."));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn load(content: &str) -> (AppConfig, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(constants::CONFIG_FILE_NAME), content).unwrap();
        load_config(dir.path())
    }

    #[test]
    fn test_missing_file_gives_defaults_without_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty());
        assert_eq!(config.size_ceiling_bytes, constants::DEFAULT_SIZE_CEILING_BYTES);
        assert_eq!(config.window_bytes, constants::DEFAULT_WINDOW_BYTES);
        assert_eq!(config.fallback_threshold, constants::DEFAULT_FALLBACK_THRESHOLD);
        assert!(!config.keep_logs);
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = load(
            r#"
[extraction]
max_size_mb = 50
window_bytes = 4096
fallback_threshold = 2

[discovery]
max_files = 20
include_patterns = ["*.log"]

[acquisition]
timeout_secs = 300
keep_logs = true
work_dir = "/tmp/collect"

[logging]
level = "DEBUG"
"#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.size_ceiling_bytes, 50 * 1024 * 1024);
        assert_eq!(config.window_bytes, 4096);
        assert_eq!(config.fallback_threshold, 2);
        assert_eq!(config.max_files, 20);
        assert_eq!(config.include_patterns, vec!["*.log".to_string()]);
        assert_eq!(config.collect_timeout_secs, 300);
        assert!(config.keep_logs);
        assert_eq!(config.work_dir, Some(PathBuf::from("/tmp/collect")));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_values_fall_back_with_warnings() {
        let (config, warnings) = load(
            r#"
[extraction]
window_bytes = 1
decode_chunk_bytes = 0

[discovery]
max_files = 0

[acquisition]
timeout_secs = 1
"#,
        );
        assert_eq!(warnings.len(), 4, "got: {warnings:?}");
        assert_eq!(config.window_bytes, constants::DEFAULT_WINDOW_BYTES);
        assert_eq!(config.decode_chunk_bytes, constants::DEFAULT_DECODE_CHUNK_BYTES);
        assert_eq!(config.max_files, constants::DEFAULT_MAX_FILES);
        assert_eq!(
            config.collect_timeout_secs,
            constants::DEFAULT_COLLECT_TIMEOUT_SECS
        );
        assert!(warnings[0].contains("window_bytes"));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let (config, warnings) = load("[logging]\nlevel = \"loud\"\n");
        assert!(config.log_level.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unparseable_file_gives_defaults_with_warning() {
        let (config, warnings) = load("[extraction\nmax_size_mb = ");
        assert_eq!(warnings.len(), 1);
        assert_eq!(config.max_files, constants::DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let (_, warnings) = load("[future]\nshiny = true\n[extraction]\nnew_knob = 3\n");
        assert!(warnings.is_empty());
    }
}
