use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Project config file name, looked up at the root of the local working copy.
pub const PROJECT_CONFIG_FILE: &str = "sitedeploy.json";

/// Base sitedeploy config directory (~/.config/sitedeploy/ on Unix-like systems)
pub fn sitedeploy() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("sitedeploy"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("sitedeploy"))
    }
}

/// Saved server profiles directory
pub fn servers() -> Result<PathBuf> {
    Ok(sitedeploy()?.join("servers"))
}

/// Project config file inside a local working copy
pub fn project_config(repo_dir: &Path) -> PathBuf {
    repo_dir.join(PROJECT_CONFIG_FILE)
}
