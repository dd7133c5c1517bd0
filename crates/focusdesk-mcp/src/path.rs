//! Script validation and child PATH construction.
//!
//! This module provides utilities to:
//! - Validate server scripts before an interpreter is spawned for them
//! - Build the effective PATH for the server process (script dir, interpreter
//!   dir, inherited PATH, platform defaults, configured extras)

use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::Path;

/// Platform-specific PATH separator
#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

/// Default paths to include on macOS when PATH is limited (bundled apps)
#[cfg(target_os = "macos")]
const MACOS_DEFAULT_PATHS: &str = "/opt/homebrew/bin:/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// Validate a server script path.
///
/// The script must exist and be a regular file. Relative paths are accepted
/// and resolved against the current directory by the child process.
pub fn validate_script_path(script: &Path) -> io::Result<()> {
    let metadata = std::fs::metadata(script).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Server script not found: {} ({e})", script.display()),
        )
    })?;

    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Server script is not a file: {}", script.display()),
        ));
    }

    Ok(())
}

/// Build an effective PATH for the server process.
///
/// This includes:
/// 1. Directory containing the script (so it can find sibling tools)
/// 2. Directory containing the interpreter, when given as a path
/// 3. Current process PATH
/// 4. Platform-specific default paths (macOS: Homebrew, etc.)
/// 5. Optional user-provided `path_extra`
///
/// Entries are deduplicated, first occurrence wins.
pub fn build_effective_path(program: &Path, script: &Path, path_extra: Option<&str>) -> OsString {
    let mut path_entries: Vec<String> = Vec::new();

    for anchor in [script, program] {
        if let Some(dir) = anchor.parent().and_then(Path::to_str) {
            if !dir.is_empty() {
                path_entries.push(dir.to_string());
            }
        }
    }

    if let Some(current_path) = env::var_os("PATH") {
        if let Some(current_path_str) = current_path.to_str() {
            push_entries(&mut path_entries, current_path_str);
        }
    }

    #[cfg(target_os = "macos")]
    push_entries(&mut path_entries, MACOS_DEFAULT_PATHS);

    if let Some(extra) = path_extra {
        push_entries(&mut path_entries, extra);
    }

    let mut seen = HashSet::new();
    let deduped: Vec<String> = path_entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect();

    OsString::from(deduped.join(PATH_SEPARATOR))
}

fn push_entries(entries: &mut Vec<String>, joined: &str) {
    entries.extend(
        joined
            .split(PATH_SEPARATOR)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string),
    );
}
