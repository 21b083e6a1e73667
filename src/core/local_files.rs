use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::internal_io(
                format!("File not found: {}", path.display()),
                Some("read file".to_string()),
            )
        } else {
            Error::internal_io(e.to_string(), Some("read file".to_string()))
        }
    })
}

/// Atomic write: write to a sibling temp file, then rename over the target.
pub fn write(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some("write file".to_string()),
        )
    })?;
    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some("write file".to_string()),
        )
    })?;

    ensure_dir(parent)?;
    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content)
        .map_err(|e| Error::internal_io(e.to_string(), Some("write temp file".to_string())))?;

    fs::rename(&tmp_path, path)
        .map_err(|e| Error::internal_io(e.to_string(), Some("rename temp file".to_string())))
}

/// JSON files directly inside `dir`. A missing directory lists as empty.
pub fn list_json(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some("list directory".to_string())))?;

    let mut result: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    result.sort();
    Ok(result)
}

pub fn delete(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some("delete file".to_string())))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            Error::internal_io(e.to_string(), Some("create directory".to_string()))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_creates_parent_and_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("a.json");

        write(&path, "{}").unwrap();
        assert_eq!(read(&path).unwrap(), "{}");
        assert!(!dir.path().join("nested").join("a.json.tmp").exists());
    }

    #[test]
    fn list_json_skips_other_files() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("b.json"), "{}").unwrap();
        write(&dir.path().join("a.json"), "{}").unwrap();
        write(&dir.path().join("notes.txt"), "text").unwrap();

        let names: Vec<_> = list_json(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn list_json_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(list_json(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }
}
