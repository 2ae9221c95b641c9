// GuidSleuth - platform/device.rs
//
// Connected-device UDID detection via libimobiledevice's `ideviceinfo`.
//
// Two queries: the direct key lookup first, then the full property listing
// parsed line by line for tool builds where `-k` prints nothing.

use crate::platform::process::run_with_timeout;
use crate::util::constants;
use crate::util::error::DeviceError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Locate `ideviceinfo` on PATH, then in the bundled tool directory beside
/// the running executable.
pub fn find_device_info_tool() -> Option<PathBuf> {
    let bundled_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|exe_dir| {
            constants::BUNDLED_TOOL_DIR
                .iter()
                .fold(exe_dir, |dir, part| dir.join(part))
        });
    locate_tool(std::env::var_os("PATH"), bundled_dir.as_deref())
}

/// Search `search_path` (a PATH-style list), then `bundled_dir`.
///
/// Only executable files count; on Windows PATHEXT extensions are tried.
fn locate_tool(search_path: Option<OsString>, bundled_dir: Option<&Path>) -> Option<PathBuf> {
    let cwd = Path::new(".");

    match which::which_in(constants::DEVICE_INFO_TOOL, search_path, cwd) {
        Ok(found) => {
            tracing::debug!(tool = %found.display(), "Device tool found on PATH");
            return Some(found);
        }
        Err(e) => tracing::debug!(error = %e, "Device tool not on PATH"),
    }

    if let Some(dir) = bundled_dir {
        if let Ok(bundled) = which::which_in(constants::DEVICE_INFO_TOOL, Some(dir), cwd) {
            tracing::debug!(tool = %bundled.display(), "Using bundled device tool");
            return Some(bundled);
        }
    }

    tracing::debug!(tool = constants::DEVICE_INFO_TOOL, "Device tool not found");
    None
}

/// Locate the tool and ask it for the connected device's UDID.
pub fn detect_connected_udid() -> Result<String, DeviceError> {
    let tool = find_device_info_tool().ok_or(DeviceError::ToolNotFound {
        tool: constants::DEVICE_INFO_TOOL,
    })?;
    detect_udid(&tool)
}

/// Query `tool` for the connected device's UDID.
pub fn detect_udid(tool: &Path) -> Result<String, DeviceError> {
    let timeout = Duration::from_secs(constants::DEVICE_QUERY_TIMEOUT_SECS);

    let direct = run_with_timeout(
        Command::new(tool).args(["-k", constants::UDID_KEY]),
        timeout,
    )?;
    let value = direct.stdout.trim();
    if direct.success() && !value.is_empty() {
        tracing::info!("Device detected");
        tracing::debug!(udid = value, "Device UDID from key query");
        return Ok(value.to_string());
    }

    tracing::debug!(
        code = ?direct.status.code(),
        "Key query gave no UDID; falling back to full listing"
    );

    let listing = run_with_timeout(&mut Command::new(tool), timeout)?;
    if !listing.success() {
        tracing::debug!(stderr = %listing.stderr.trim(), "Device listing failed");
        return Err(DeviceError::NoDevice);
    }

    let udid = parse_udid_listing(&listing.stdout).ok_or(DeviceError::NoDevice)?;
    tracing::info!("Device detected");
    tracing::debug!(udid = %udid, "Device UDID from listing");
    Ok(udid)
}

/// Find the first `UniqueDeviceID: <value>` line with a non-empty value.
pub fn parse_udid_listing(listing: &str) -> Option<String> {
    listing
        .lines()
        .filter(|line| line.contains(constants::UDID_KEY))
        .filter_map(|line| line.split_once(": ").map(|(_, value)| value.trim()))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
