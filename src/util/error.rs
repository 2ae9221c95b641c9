// GuidSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation.
// All errors preserve the causal chain for diagnostic logging.
//
// There is no "identifier not found" error: an empty
// vote is a valid outcome (`Option::None`), not an error.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type for all GuidSleuth operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum GuidSleuthError {
    /// The extraction core could not run.
    Extract(ExtractError),

    /// Rule loading or validation failed.
    Rule(RuleError),

    /// Log file listing failed.
    Discovery(DiscoveryError),

    /// Device detection failed.
    Device(DeviceError),

    /// Log acquisition failed.
    Acquisition(AcquisitionError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for GuidSleuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extract(e) => write!(f, "Extraction error: {e}"),
            Self::Rule(e) => write!(f, "Rule error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Device(e) => write!(f, "Device error: {e}"),
            Self::Acquisition(e) => write!(f, "Acquisition error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for GuidSleuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Extract(e) => Some(e),
            Self::Rule(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Device(e) => Some(e),
            Self::Acquisition(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

/// Fatal conditions of an extraction run.
#[derive(Debug)]
pub enum ExtractError {
    /// The caller supplied no log files at all.
    NoLogFiles,

    /// Not a single byte could be read from any of the supplied files.
    NoReadableData { attempted: usize, skipped: usize },

    /// The built-in identifier byte pattern failed to compile.
    IdentifierPattern(regex::Error),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLogFiles => write!(f, "No log files were found"),
            Self::NoReadableData { attempted, skipped } => write!(
                f,
                "No log data could be read ({attempted} files attempted, {skipped} skipped)"
            ),
            Self::IdentifierPattern(e) => {
                write!(f, "Identifier pattern failed to compile: {e}")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IdentifierPattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExtractError> for GuidSleuthError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

// ---------------------------------------------------------------------------
// Fallback scan errors
// ---------------------------------------------------------------------------

/// Failures inside the path-pattern fallback scan.
///
/// Never surfaced to the caller: the scanner logs them and reports zero
/// additional candidates.
#[derive(Debug)]
pub enum FallbackError {
    /// The decode chunk size is zero.
    InvalidChunkSize,

    /// Memory for the decoded text could not be reserved.
    Allocation {
        bytes: usize,
        source: std::collections::TryReserveError,
    },
}

impl fmt::Display for FallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChunkSize => write!(f, "Decode chunk size must be non-zero"),
            Self::Allocation { bytes, source } => {
                write!(f, "Could not reserve {bytes} bytes for decoded text: {source}")
            }
        }
    }
}

impl std::error::Error for FallbackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation { source, .. } => Some(source),
            Self::InvalidChunkSize => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule errors
// ---------------------------------------------------------------------------

/// Errors related to marker/path rule loading and validation.
#[derive(Debug)]
pub enum RuleError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Rule file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing or empty.
    MissingField {
        rule_id: String,
        field: &'static str,
    },

    /// The rule defines neither markers nor path patterns.
    Empty { rule_id: String },

    /// A path pattern is invalid.
    InvalidRegex {
        rule_id: String,
        pattern: String,
        source: regex::Error,
    },

    /// A path pattern exceeds the maximum allowed length.
    RegexTooLong {
        rule_id: String,
        length: usize,
        max_length: usize,
    },

    /// A path pattern has no group to capture the identifier with.
    MissingCaptureGroup { rule_id: String, pattern: String },

    /// Maximum number of rule files exceeded.
    TooManyRules { count: usize, max: usize },

    /// I/O error reading a rule file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Rule file '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { rule_id, field } => {
                write!(f, "Rule '{rule_id}': missing required field '{field}'")
            }
            Self::Empty { rule_id } => {
                write!(f, "Rule '{rule_id}' defines no markers and no path patterns")
            }
            Self::InvalidRegex {
                rule_id,
                pattern,
                source,
            } => write!(
                f,
                "Rule '{rule_id}': invalid path pattern '{pattern}': {source}"
            ),
            Self::RegexTooLong {
                rule_id,
                length,
                max_length,
            } => write!(
                f,
                "Rule '{rule_id}': path pattern is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
            Self::MissingCaptureGroup { rule_id, pattern } => write!(
                f,
                "Rule '{rule_id}': path pattern '{pattern}' has no capture group"
            ),
            Self::TooManyRules { count, max } => {
                write!(f, "Too many rule files loaded ({count}), maximum is {max}")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error reading rule '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RuleError> for GuidSleuthError {
    fn from(e: RuleError) -> Self {
        Self::Rule(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to log file listing.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the root path.
    PermissionDenied { path: PathBuf, source: io::Error },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Log path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Log path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for GuidSleuthError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Process errors
// ---------------------------------------------------------------------------

/// Errors from running an external tool.
#[derive(Debug)]
pub enum ProcessError {
    /// The program could not be started.
    Spawn { program: String, source: io::Error },

    /// Waiting on or polling the child failed.
    Wait { program: String, source: io::Error },

    /// The program did not finish before its deadline and was killed.
    Timeout { program: String, timeout: Duration },
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, source } => {
                write!(f, "Failed to start '{program}': {source}")
            }
            Self::Wait { program, source } => {
                write!(f, "Failed waiting for '{program}': {source}")
            }
            Self::Timeout { program, timeout } => write!(
                f,
                "'{program}' did not finish within {}s and was terminated",
                timeout.as_secs()
            ),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Wait { source, .. } => Some(source),
            Self::Timeout { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Device errors
// ---------------------------------------------------------------------------

/// Errors related to locating the connected device.
#[derive(Debug)]
pub enum DeviceError {
    /// The device information tool is not installed or bundled.
    ToolNotFound { tool: &'static str },

    /// The tool ran but reported no connected device.
    NoDevice,

    /// The tool could not be run.
    Process(ProcessError),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound { tool } => write!(
                f,
                "'{tool}' was not found and no UDID was given. \
                 Install libimobiledevice or pass the UDID explicitly."
            ),
            Self::NoDevice => write!(f, "No connected device found, or its UDID is unavailable"),
            Self::Process(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Process(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProcessError> for DeviceError {
    fn from(e: ProcessError) -> Self {
        Self::Process(e)
    }
}

impl From<DeviceError> for GuidSleuthError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

// ---------------------------------------------------------------------------
// Acquisition errors
// ---------------------------------------------------------------------------

/// Errors related to collecting logs from the device.
#[derive(Debug)]
pub enum AcquisitionError {
    /// The UDID cannot be used as an archive file name.
    InvalidUdid { udid: String },

    /// A stale archive directory could not be removed before collecting.
    Cleanup { path: PathBuf, source: io::Error },

    /// The collector could not be run or was killed at its deadline.
    Process(ProcessError),

    /// The collector exited with a failure status.
    CollectorFailed {
        status: Option<i32>,
        stderr: String,
    },

    /// The collector reported success but left no archive behind.
    MissingArchive { path: PathBuf },
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUdid { udid } => write!(
                f,
                "Invalid device UDID '{udid}': must be a plain name without path separators"
            ),
            Self::Cleanup { path, source } => write!(
                f,
                "Could not remove stale archive '{}': {source}",
                path.display()
            ),
            Self::Process(e) => write!(f, "Log collection failed: {e}"),
            Self::CollectorFailed { status, stderr } => {
                match status {
                    Some(code) => write!(f, "Log collection failed (exit code {code})")?,
                    None => write!(f, "Log collection failed (terminated by signal)")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Self::MissingArchive { path } => write!(
                f,
                "Log collection finished but '{}' was not created",
                path.display()
            ),
        }
    }
}

impl std::error::Error for AcquisitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cleanup { source, .. } => Some(source),
            Self::Process(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProcessError> for AcquisitionError {
    fn from(e: ProcessError) -> Self {
        Self::Process(e)
    }
}

impl From<AcquisitionError> for GuidSleuthError {
    fn from(e: AcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for GuidSleuthError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for GuidSleuth results.
pub type Result<T> = std::result::Result<T, GuidSleuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_no_readable_data_message_counts_files() {
        let e = ExtractError::NoReadableData {
            attempted: 3,
            skipped: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 files attempted"), "got: {msg}");
    }

    #[test]
    fn test_source_chain_is_preserved() {
        let inner = ProcessError::Timeout {
            program: "pymobiledevice3".to_string(),
            timeout: Duration::from_secs(120),
        };
        let top: GuidSleuthError = AcquisitionError::from(inner).into();
        let acquisition = top.source().expect("acquisition source");
        let process = acquisition.source().expect("process source");
        assert!(process.to_string().contains("120s"));
    }

    #[test]
    fn test_collector_failure_includes_stderr() {
        let e = AcquisitionError::CollectorFailed {
            status: Some(2),
            stderr: "device locked".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Log collection failed (exit code 2): device locked"
        );
    }
}
