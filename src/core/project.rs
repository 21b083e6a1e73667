//! Per-repository deploy settings read from `sitedeploy.json`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config;
use crate::error::{Error, Result};
use crate::git;
use crate::local_files;
use crate::npm::DependencyAction;
use crate::paths;

/// Root configuration structure for sitedeploy.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Cloned on first deploy. Falls back to the local `origin` remote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,

    #[serde(default = "default_sites_root")]
    pub sites_root: String,

    /// Hosts deployed to when none are given on the command line.
    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub dependency_action: DependencyAction,

    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    #[serde(default = "default_build_script")]
    pub build_script: String,
}

fn default_sites_root() -> String {
    "~/sites".to_string()
}

fn default_package_manager() -> String {
    "npm".to_string()
}

fn default_build_script() -> String {
    "build".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            sites_root: default_sites_root(),
            hosts: Vec::new(),
            dependency_action: DependencyAction::default(),
            package_manager: default_package_manager(),
            build_script: default_build_script(),
        }
    }
}

impl ProjectConfig {
    /// Remote directory holding the working copy for `host`.
    pub fn site_dir(&self, host: &str) -> String {
        let root = self.sites_root.trim_end_matches('/');
        if root.is_empty() {
            format!("/{}", host)
        } else {
            format!("{}/{}", root, host)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("sitesRoot", &self.sites_root),
            ("packageManager", &self.package_manager),
            ("buildScript", &self.build_script),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config_invalid_value(
                    key,
                    Some(value.clone()),
                    "must not be empty",
                ));
            }
        }
        if let Some(url) = &self.repo_url {
            if url.trim().is_empty() {
                return Err(Error::config_invalid_value(
                    "repoUrl",
                    Some(url.clone()),
                    "must not be empty when set",
                ));
            }
        }
        Ok(())
    }

    /// Repository URL the remote clones from.
    pub fn resolve_repo_url(&self, repo_dir: &Path) -> Result<String> {
        if let Some(url) = &self.repo_url {
            return Ok(url.clone());
        }

        git::origin_url(repo_dir).ok_or_else(|| {
            Error::config_missing_key(
                "repoUrl",
                Some(paths::project_config(repo_dir).display().to_string()),
            )
            .with_hint("Set \"repoUrl\" in sitedeploy.json or add an 'origin' remote")
        })
    }
}

/// Load `sitedeploy.json` from a working copy. A missing file means defaults.
pub fn load(repo_dir: &Path) -> Result<ProjectConfig> {
    let path = paths::project_config(repo_dir);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = local_files::read(&path)?;
    let project: ProjectConfig = config::from_file_str(&path, &content)?;
    project.validate()?;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let project = load(dir.path()).unwrap();
        assert_eq!(project, ProjectConfig::default());
        assert_eq!(project.site_dir("example.com"), "~/sites/example.com");
        assert_eq!(project.dependency_action, DependencyAction::Update);
    }

    #[test]
    fn reads_overrides() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("sitedeploy.json"),
            r#"{
                "repoUrl": "git@github.com:alamastor/interpreter.git",
                "sitesRoot": "/srv/sites/",
                "hosts": ["a.example.com", "deploy@b.example.com:2222"],
                "dependencyAction": "install"
            }"#,
        )
        .unwrap();

        let project = load(dir.path()).unwrap();
        assert_eq!(project.site_dir("a.example.com"), "/srv/sites/a.example.com");
        assert_eq!(project.hosts.len(), 2);
        assert_eq!(project.dependency_action, DependencyAction::Install);
        assert_eq!(project.package_manager, "npm");
        assert_eq!(
            project.resolve_repo_url(dir.path()).unwrap(),
            "git@github.com:alamastor/interpreter.git"
        );
    }

    #[test]
    fn rejects_unknown_keys_and_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sitedeploy.json");

        std::fs::write(&path, r#"{"repo_url": "x"}"#).unwrap();
        assert_eq!(load(dir.path()).unwrap_err().code.as_str(), "config.invalid_json");

        std::fs::write(&path, "{").unwrap();
        assert_eq!(load(dir.path()).unwrap_err().code.as_str(), "config.invalid_json");
    }

    #[test]
    fn rejects_empty_values() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("sitedeploy.json"), r#"{"buildScript": " "}"#).unwrap();
        let err = load(dir.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
        assert_eq!(err.details["key"], "buildScript");
    }

    #[test]
    fn root_sites_dir() {
        let project = ProjectConfig {
            sites_root: "/".to_string(),
            ..ProjectConfig::default()
        };
        assert_eq!(project.site_dir("a"), "/a");
    }

    #[test]
    fn repo_url_missing_without_origin() {
        // A fresh temp dir is not a git repository, so there is no origin.
        let dir = tempdir().unwrap();
        let err = ProjectConfig::default()
            .resolve_repo_url(dir.path())
            .unwrap_err();
        assert_eq!(err.code.as_str(), "config.missing_key");
    }
}
