use crate::config::{self, ConfigEntity};
use crate::error::{Error, Result};
use crate::host::{is_valid_host_name, is_valid_user};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Saved connection parameters for a deploy target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(skip_deserializing, default)]
    pub id: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
}

fn default_port() -> u16 {
    22
}

impl ConfigEntity for Server {
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn config_dir() -> Result<PathBuf> {
        paths::servers()
    }
    fn not_found_error(id: String) -> Error {
        Error::server_not_found(id)
    }
    fn entity_type() -> &'static str {
        "server"
    }
    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::validation_missing_argument(vec!["host".to_string()]));
        }
        if !is_valid_host_name(&self.host) {
            return Err(Error::validation_invalid_argument(
                "host",
                "Host must be a bare host name or address",
                Some(self.host.clone()),
            ));
        }
        if let Some(user) = self.user.as_deref().filter(|u| !is_valid_user(u)) {
            return Err(Error::validation_invalid_argument(
                "user",
                format!("'{}' is not a valid user name", user),
                Some(user.to_string()),
            ));
        }
        if self.port == 0 {
            return Err(Error::validation_invalid_argument(
                "port",
                "Port must be between 1 and 65535",
                Some(self.port.to_string()),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Core CRUD - Thin wrappers around config module
// ============================================================================

pub fn load(id: &str) -> Result<Server> {
    config::load::<Server>(id)
}

pub fn list() -> Result<Vec<Server>> {
    config::list::<Server>()
}

pub fn delete(id: &str) -> Result<()> {
    config::delete::<Server>(id)
}

/// Create a new profile; an existing id is an error.
pub fn create(server: Server) -> Result<Server> {
    create_in(&paths::servers()?, server)
}

pub(crate) fn create_in(dir: &Path, server: Server) -> Result<Server> {
    config::validate_id(Server::entity_type(), &server.id)?;
    if config::exists_in(dir, &server.id) {
        return Err(Error::validation_invalid_argument(
            "server.id",
            format!("server '{}' already exists", server.id),
            Some(server.id.clone()),
        ));
    }
    config::save_in(dir, &server)?;
    Ok(server)
}

/// Profile to use for a bare host name: an exact id match wins, then the
/// first profile whose host matches.
pub fn find_for_host(host: &str) -> Option<Server> {
    let dir = paths::servers().ok()?;
    find_for_host_in(&dir, host)
}

pub(crate) fn find_for_host_in(dir: &Path, host: &str) -> Option<Server> {
    let servers = config::list_in::<Server>(dir).ok()?;
    servers
        .iter()
        .find(|s| s.id == host)
        .or_else(|| servers.iter().find(|s| s.host == host))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn server(id: &str, host: &str) -> Server {
        Server {
            id: id.to_string(),
            host: host.to_string(),
            user: Some("deploy".to_string()),
            port: 22,
            identity_file: None,
        }
    }

    #[test]
    fn create_then_load_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        create_in(dir.path(), server("web", "example.com")).unwrap();

        let loaded: Server = config::load_in(dir.path(), "web").unwrap();
        assert_eq!(loaded.id, "web");
        assert_eq!(loaded.host, "example.com");
        assert_eq!(loaded.user.as_deref(), Some("deploy"));
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let dir = tempdir().unwrap();
        create_in(dir.path(), server("web", "example.com")).unwrap();
        let err = create_in(dir.path(), server("web", "other.com")).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn create_rejects_empty_host() {
        let dir = tempdir().unwrap();
        let err = create_in(dir.path(), server("web", " ")).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.missing_argument");
    }

    #[test]
    fn create_rejects_option_like_host_and_user() {
        let dir = tempdir().unwrap();
        let err = create_in(dir.path(), server("web", "-Jevil.example")).unwrap_err();
        assert_eq!(err.details["field"], "host");

        let mut bad_user = server("web", "example.com");
        bad_user.user = Some("-oProxyCommand=x".to_string());
        let err = create_in(dir.path(), bad_user).unwrap_err();
        assert_eq!(err.details["field"], "user");
        assert!(!config::exists_in(dir.path(), "web"));
    }

    #[test]
    fn missing_port_defaults_to_22() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("web.json"), r#"{"host":"example.com"}"#).unwrap();
        let loaded: Server = config::load_in(dir.path(), "web").unwrap();
        assert_eq!(loaded.port, 22);
        assert_eq!(loaded.user, None);
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let err = config::load_in::<Server>(dir.path(), "nope").unwrap_err();
        assert_eq!(err.code.as_str(), "server.not_found");
    }

    #[test]
    fn invalid_json_names_the_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("web.json"), "{not json").unwrap();
        let err = config::load_in::<Server>(dir.path(), "web").unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
        assert!(err.details["path"].as_str().unwrap().ends_with("web.json"));
    }

    #[test]
    fn find_for_host_prefers_id_match() {
        let dir = tempdir().unwrap();
        create_in(dir.path(), server("alpha", "example.com")).unwrap();
        create_in(dir.path(), server("example.com", "10.0.0.5")).unwrap();

        let found = find_for_host_in(dir.path(), "example.com").unwrap();
        assert_eq!(found.id, "example.com");

        let by_host = find_for_host_in(dir.path(), "10.0.0.5").unwrap();
        assert_eq!(by_host.id, "example.com");

        assert!(find_for_host_in(dir.path(), "unknown").is_none());
    }

    #[test]
    fn delete_removes_profile() {
        let dir = tempdir().unwrap();
        create_in(dir.path(), server("web", "example.com")).unwrap();
        config::delete_in::<Server>(dir.path(), "web").unwrap();
        assert!(!config::exists_in(dir.path(), "web"));
        assert!(config::delete_in::<Server>(dir.path(), "web").is_err());
    }
}
