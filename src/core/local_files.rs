use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Entry returned from directory listing
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl Entry {
    pub fn is_json(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "json")
    }
}

/// Local filesystem operations with consistent error mapping.
pub struct LocalFs;

pub fn local() -> LocalFs {
    LocalFs
}

impl LocalFs {
    pub fn read(&self, path: &Path) -> Result<String> {
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

    /// Atomic write: write to temp file, then rename.
    pub fn write(&self, path: &Path, content: &str) -> Result<()> {
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

        self.ensure_dir(parent)?;

        let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

        fs::write(&tmp_path, content)
            .map_err(|e| Error::internal_io(e.to_string(), Some("write temp file".to_string())))?;

        fs::rename(&tmp_path, path)
            .map_err(|e| Error::internal_io(e.to_string(), Some("rename temp file".to_string())))?;

        Ok(())
    }

    pub fn list(&self, dir: &Path) -> Result<Vec<Entry>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir)
            .map_err(|e| Error::internal_io(e.to_string(), Some("list directory".to_string())))?;

        let mut result = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_dir = path.is_dir();
            result.push(Entry { path, is_dir });
        }

        Ok(result)
    }

    pub fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .map_err(|e| Error::internal_io(e.to_string(), Some("delete file".to_string())))
    }

    pub fn ensure_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| Error::internal_io(e.to_string(), Some("create directory".to_string())))
    }
}
