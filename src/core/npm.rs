//! Package manager commands run inside the site directory.

use serde::{Deserialize, Serialize};

use crate::utils::shell;

/// How dependencies are brought up to date after the source sync.
///
/// `Update` upgrades within the manifest's version ranges; `Install` installs
/// what the manifest and lockfile already pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyAction {
    #[default]
    Update,
    Install,
}

impl DependencyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyAction::Update => "update",
            DependencyAction::Install => "install",
        }
    }
}

/// `cd <site_dir> && npm update` (or `install`)
pub fn dependency_command(package_manager: &str, action: DependencyAction, site_dir: &str) -> String {
    format!(
        "cd {} && {} {}",
        shell::quote_remote_path(site_dir),
        shell::quote_arg(package_manager),
        action.as_str()
    )
}

/// `cd <site_dir> && npm run build`
pub fn build_command(package_manager: &str, script: &str, site_dir: &str) -> String {
    format!(
        "cd {} && {} run {}",
        shell::quote_remote_path(site_dir),
        shell::quote_arg(package_manager),
        shell::quote_arg(script)
    )
}
