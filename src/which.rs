//! Executable lookup on a colon-separated search path.

use nix::unistd::{access, AccessFlags};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// The process `PATH`, or an empty search path when unset.
pub fn search_path() -> OsString {
    std::env::var_os("PATH").unwrap_or_default()
}

/// Look up `command` in `search_path`, returning the first executable match.
///
/// Directories are tried in order. Empty segments are skipped rather than
/// being treated as the current directory.
pub fn which_in<S: AsRef<OsStr> + ?Sized>(command: &str, search_path: &S) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}
