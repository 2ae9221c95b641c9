// GuidSleuth - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "GuidSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "GuidSleuth";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Corpus assembly limits
// =============================================================================

const MIB: u64 = 1024 * 1024;

/// Default ceiling on the total bytes concatenated into one corpus.
///
/// Files that would push the running total past this are skipped whole,
/// never truncated.
pub const DEFAULT_SIZE_CEILING_BYTES: u64 = 100 * MIB; // 100 MiB

/// Smallest accepted size ceiling (config validation).
pub const MIN_SIZE_CEILING_BYTES: u64 = 1024; // 1 KiB

/// Hard upper bound on the size ceiling. The corpus is held in memory in full,
/// and the fallback scan holds a decoded copy on top of that.
pub const ABSOLUTE_MAX_SIZE_CEILING_BYTES: u64 = 2 * 1024 * MIB; // 2 GiB

/// Number of files between debug-level progress lines while reading.
pub const READ_PROGRESS_EVERY_FILES: usize = 50;

// =============================================================================
// Scanning
// =============================================================================

/// Bytes searched on each side of a marker occurrence.
pub const DEFAULT_WINDOW_BYTES: usize = 2048;

/// Smallest accepted marker window. Must leave room for one full identifier.
pub const MIN_WINDOW_BYTES: usize = 36;

/// Largest accepted marker window.
pub const MAX_WINDOW_BYTES: usize = 1024 * 1024;

/// The path-pattern fallback runs when the keyword scan produced fewer
/// distinct candidates than this.
pub const DEFAULT_FALLBACK_THRESHOLD: usize = 5;

/// Upper bound on the configurable fallback threshold.
pub const MAX_FALLBACK_THRESHOLD: usize = 10_000;

/// Chunk size used when decoding the corpus to text for the fallback scan.
pub const DEFAULT_DECODE_CHUNK_BYTES: usize = 10 * 1024 * 1024; // 10 MiB

/// Smallest accepted decode chunk.
pub const MIN_DECODE_CHUNK_BYTES: usize = 4 * 1024;

/// Largest accepted decode chunk.
pub const MAX_DECODE_CHUNK_BYTES: usize = 256 * 1024 * 1024;

/// Length of a canonical identifier (`8-4-4-4-12` plus four hyphens).
pub const IDENTIFIER_LEN: usize = 36;

/// Hex group lengths of a canonical identifier, in order.
pub const IDENTIFIER_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Byte-level search pattern for identifier-shaped runs inside a window.
pub const IDENTIFIER_BYTE_PATTERN: &str =
    r"(?i-u)[0-9A-F]{8}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{12}";

// =============================================================================
// Log file listing
// =============================================================================

/// Name of the unified-log trace file that is always listed first.
pub const PRIMARY_TRACE_FILE: &str = "logdata.LiveData.tracev3";

/// Maximum number of files handed to the corpus assembler.
pub const DEFAULT_MAX_FILES: usize = 100;

/// Minimum sensible value for the max-files limit.
pub const MIN_MAX_FILES: usize = 1;

/// Hard upper bound on max files (prevents configuration mistakes).
pub const ABSOLUTE_MAX_FILES: usize = 10_000;

/// Maximum directory recursion depth while listing.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 64;

/// File-name globs (matched case-insensitively) for recognised log files.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.log", "*.txt", "*.plist", "*.trace"];

// =============================================================================
// Device and acquisition
// =============================================================================

/// Device information tool looked up on PATH.
pub const DEVICE_INFO_TOOL: &str = "ideviceinfo";

/// Bundled tool directory, relative to the executable's directory.
pub const BUNDLED_TOOL_DIR: &[&str] = &["tools", "libimobiledevice"];

/// Key queried from the device information tool.
pub const UDID_KEY: &str = "UniqueDeviceID";

/// Timeout for each device information query.
pub const DEVICE_QUERY_TIMEOUT_SECS: u64 = 10;

/// Log collection tool and its fixed leading arguments.
pub const COLLECTOR_PROGRAM: &str = "pymobiledevice3";
pub const COLLECTOR_ARGS: &[&str] = &["syslog", "collect"];

/// Default timeout for one log collection run.
pub const DEFAULT_COLLECT_TIMEOUT_SECS: u64 = 120;

/// Bounds on the configurable collection timeout.
pub const MIN_COLLECT_TIMEOUT_SECS: u64 = 10;
pub const MAX_COLLECT_TIMEOUT_SECS: u64 = 3_600;

/// Suffix appended to the UDID to name the collected archive directory.
pub const LOG_ARCHIVE_SUFFIX: &str = ".logarchive";

/// How often a running child process is polled for exit (ms).
pub const PROCESS_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// Rules
// =============================================================================

/// Maximum number of rule files that can be loaded (built-in + user).
pub const MAX_RULE_FILES: usize = 100;

/// Maximum size of a rule TOML file in bytes.
pub const MAX_RULE_FILE_SIZE: u64 = 64 * 1024; // 64 KB

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// User rules subdirectory name.
pub const RULES_DIR_NAME: &str = "rules";
