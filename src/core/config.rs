use crate::error::{Error, Result};
use crate::local_files;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// ============================================================================
// JSON Parsing Utilities (internal)
// ============================================================================

/// Serialize value to pretty-printed JSON string.
pub(crate) fn to_string_pretty<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize json".to_string())))
}

/// Parse a config file's content, reporting the file on failure.
pub(crate) fn from_file_str<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_json::from_str(content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

// ============================================================================
// Entity storage: one JSON file per entity, named <id>.json
// ============================================================================

pub trait ConfigEntity: Serialize + DeserializeOwned {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn config_dir() -> Result<PathBuf>;
    fn not_found_error(id: String) -> Error;
    fn entity_type() -> &'static str;

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]*$").unwrap());

pub(crate) fn validate_id(entity_type: &str, id: &str) -> Result<()> {
    if ID_PATTERN.is_match(id) {
        return Ok(());
    }
    Err(Error::validation_invalid_argument(
        format!("{}.id", entity_type),
        "IDs use lowercase letters, digits, '.', '_' and '-'",
        Some(id.to_string()),
    ))
}

fn entity_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.json", id))
}

pub(crate) fn load_in<T: ConfigEntity>(dir: &Path, id: &str) -> Result<T> {
    let path = entity_path(dir, id);
    if !path.exists() {
        return Err(T::not_found_error(id.to_string()));
    }
    let content = local_files::read(&path)?;
    let mut entity: T = from_file_str(&path, &content)?;
    entity.set_id(id.to_string());
    Ok(entity)
}

/// Unreadable or malformed files are skipped rather than failing the listing.
pub(crate) fn list_in<T: ConfigEntity>(dir: &Path) -> Result<Vec<T>> {
    let items = local_files::list_json(dir)?
        .into_iter()
        .filter_map(|path| {
            let id = path.file_stem()?.to_string_lossy().to_string();
            let content = local_files::read(&path).ok()?;
            let mut entity: T = serde_json::from_str(&content).ok()?;
            entity.set_id(id);
            Some(entity)
        })
        .collect();
    Ok(items)
}

pub(crate) fn save_in<T: ConfigEntity>(dir: &Path, entity: &T) -> Result<()> {
    validate_id(T::entity_type(), entity.id())?;
    entity.validate()?;
    let content = to_string_pretty(entity)?;
    local_files::write(&entity_path(dir, entity.id()), &content)
}

pub(crate) fn delete_in<T: ConfigEntity>(dir: &Path, id: &str) -> Result<()> {
    let path = entity_path(dir, id);
    if !path.exists() {
        return Err(T::not_found_error(id.to_string()));
    }
    local_files::delete(&path)
}

pub(crate) fn exists_in(dir: &Path, id: &str) -> bool {
    entity_path(dir, id).exists()
}

pub(crate) fn load<T: ConfigEntity>(id: &str) -> Result<T> {
    load_in(&T::config_dir()?, id)
}

pub(crate) fn list<T: ConfigEntity>() -> Result<Vec<T>> {
    list_in(&T::config_dir()?)
}

pub(crate) fn delete<T: ConfigEntity>(id: &str) -> Result<()> {
    delete_in::<T>(&T::config_dir()?, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_id_accepts_slugs() {
        assert!(validate_id("server", "web-1").is_ok());
        assert!(validate_id("server", "example.com").is_ok());
    }

    #[test]
    fn validate_id_rejects_paths_and_uppercase() {
        for bad in ["", "Web", "../x", "a/b", "-lead"] {
            assert!(validate_id("server", bad).is_err(), "expected error for {:?}", bad);
        }
    }
}
