//! Directory where the executable lives. The controller settings file is
//! looked up there so a standalone binary carries its own configuration.

use std::path::{Path, PathBuf};

/// Where the `mapsync` binary lives. When the executable path cannot be
/// resolved, settings are looked up in the working directory instead.
pub fn exe_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    exe_dir
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the controller settings file.
pub fn config_path() -> PathBuf {
    exe_directory().join("mapsync.json")
}
