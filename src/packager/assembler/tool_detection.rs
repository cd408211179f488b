//! Packaging tool detection.
//!
//! Locates the content prep tool that turns a staging folder into an
//! `.intunewin` archive.

use crate::packager::error::{Error, Result};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Executable names tried on `PATH`, in order.
pub const TOOL_NAMES: [&str; 2] = ["IntuneWinAppUtil", "IntuneWinAppUtil.exe"];

/// Packaging tool found on `PATH`.
///
/// Cached result to avoid repeated lookups.
pub static PACKAGING_TOOL_ON_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    for name in TOOL_NAMES {
        match which::which(name) {
            Ok(path) => {
                log::debug!("Found {name} at: {}", path.display());
                return Some(path);
            }
            Err(e) => log::debug!("{name} not found in PATH: {e}"),
        }
    }
    None
});

/// Resolves the packaging tool executable.
///
/// An explicit path wins and must exist; otherwise `PATH` is searched.
pub fn resolve_tool(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            log::info!("✓ Using packaging tool {}", path.display());
            return Ok(path.to_path_buf());
        }
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    PACKAGING_TOOL_ON_PATH.clone().ok_or_else(|| {
        Error::GenericError(format!(
            "packaging tool not found. Install it on PATH as one of: {} or pass its path explicitly",
            TOOL_NAMES.join(", ")
        ))
    })
}
