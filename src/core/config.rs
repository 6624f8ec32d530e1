use crate::error::Error;
use crate::local_files::local;
use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

// ============================================================================
// JSON Parsing Utilities
// ============================================================================

/// Parse JSON string into typed value.
pub(crate) fn from_str<T: DeserializeOwned>(s: &str) -> Result<T> {
    serde_json::from_str(s)
        .map_err(|e| Error::validation_invalid_json(e, Some("parse json".to_string())))
}

/// Serialize value to pretty-printed JSON string.
pub(crate) fn to_string_pretty<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize json".to_string())))
}

/// Read JSON spec from string, file (@path), or stdin (-).
pub fn read_json_spec_to_string(spec: &str) -> Result<String> {
    use std::io::IsTerminal;

    if spec.trim() == "-" {
        let mut buf = String::new();
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(Error::validation_invalid_argument(
                "json",
                "Cannot read JSON from stdin when stdin is a TTY",
                None,
            ));
        }
        stdin
            .read_to_string(&mut buf)
            .map_err(|e| Error::internal_io(e.to_string(), Some("read stdin".to_string())))?;
        return Ok(buf);
    }

    if let Some(path) = spec.strip_prefix('@') {
        if path.trim().is_empty() {
            return Err(Error::validation_invalid_argument(
                "json",
                "Invalid JSON spec '@' (missing file path)",
                None,
            ));
        }

        return local().read(Path::new(path));
    }

    Ok(spec.to_string())
}

// ============================================================================
// Config Entity CRUD
// ============================================================================

pub(crate) trait ConfigEntity: Serialize + DeserializeOwned {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn config_path(id: &str) -> Result<PathBuf>;
    fn config_dir() -> Result<PathBuf>;
    fn not_found_error(id: String, suggestions: Vec<String>) -> Error;
    fn entity_type() -> &'static str;

    /// Entity-specific validation. Override to add custom validation rules.
    /// Called by `config::create()` before saving.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn load<T: ConfigEntity>(id: &str) -> Result<T> {
    let path = T::config_path(id)?;
    if !path.exists() {
        let suggestions = find_similar_ids::<T>(id);
        return Err(T::not_found_error(id.to_string(), suggestions));
    }
    let content = local().read(&path)?;
    let mut entity: T = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
    entity.set_id(id.to_string());
    Ok(entity)
}

pub(crate) fn list<T: ConfigEntity>() -> Result<Vec<T>> {
    let dir = T::config_dir()?;
    let entries = local().list(&dir)?;

    let mut items: Vec<T> = entries
        .into_iter()
        .filter(|e| e.is_json() && !e.is_dir)
        .filter_map(|e| {
            let id = e.path.file_stem()?.to_string_lossy().to_string();
            let content = local().read(&e.path).ok()?;
            let mut entity: T = serde_json::from_str(&content).ok()?;
            entity.set_id(id);
            Some(entity)
        })
        .collect();

    items.sort_by(|a, b| a.id().cmp(b.id()));
    Ok(items)
}

pub(crate) fn list_ids<T: ConfigEntity>() -> Result<Vec<String>> {
    Ok(list::<T>()?.into_iter().map(|e| e.id().to_string()).collect())
}

pub(crate) fn save<T: ConfigEntity>(entity: &T) -> Result<()> {
    entity.validate()?;
    let path = T::config_path(entity.id())?;
    let content = to_string_pretty(entity)?;
    local().write(&path, &content)
}

pub(crate) fn delete<T: ConfigEntity>(id: &str) -> Result<()> {
    let path = T::config_path(id)?;
    if !path.exists() {
        let suggestions = find_similar_ids::<T>(id);
        return Err(T::not_found_error(id.to_string(), suggestions));
    }
    local().delete(&path)
}

pub(crate) fn exists<T: ConfigEntity>(id: &str) -> bool {
    T::config_path(id).map(|p| p.exists()).unwrap_or(false)
}

/// Create an entity from a JSON spec. Fails if the id is already taken.
pub(crate) fn create<T: ConfigEntity>(id: &str, json_spec: &str) -> Result<T> {
    if exists::<T>(id) {
        return Err(Error::config_invalid_value(
            "id",
            Some(id.to_string()),
            format!("{} '{}' already exists", T::entity_type(), id),
        ));
    }

    let content = read_json_spec_to_string(json_spec)?;
    let mut entity: T = from_str(&content)?;
    entity.set_id(id.to_string());
    save(&entity)?;
    Ok(entity)
}

/// Shallow-merge a JSON spec's top-level keys into an existing entity.
pub(crate) fn merge<T: ConfigEntity>(id: &str, json_spec: &str) -> Result<T> {
    let path = T::config_path(id)?;
    if !path.exists() {
        let suggestions = find_similar_ids::<T>(id);
        return Err(T::not_found_error(id.to_string(), suggestions));
    }

    let existing = local().read(&path)?;
    let mut base: serde_json::Value = serde_json::from_str(&existing)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

    let content = read_json_spec_to_string(json_spec)?;
    let patch: serde_json::Value = from_str(&content)?;

    let Some(patch_obj) = patch.as_object() else {
        return Err(Error::validation_invalid_argument(
            "json",
            "JSON spec must be an object",
            Some(content),
        ));
    };

    let Some(base_obj) = base.as_object_mut() else {
        return Err(Error::config_invalid_json(
            path.display().to_string(),
            "configuration root is not an object",
        ));
    };

    for (key, value) in patch_obj {
        base_obj.insert(key.clone(), value.clone());
    }

    let mut entity: T = serde_json::from_value(base)
        .map_err(|e| Error::validation_invalid_json(e, Some("merge config".to_string())))?;
    entity.set_id(id.to_string());
    save(&entity)?;
    Ok(entity)
}

fn find_similar_ids<T: ConfigEntity>(id: &str) -> Vec<String> {
    let needle = id.to_lowercase();
    list_ids::<T>()
        .unwrap_or_default()
        .into_iter()
        .filter(|candidate| {
            let c = candidate.to_lowercase();
            c.contains(&needle) || needle.contains(&c)
        })
        .take(5)
        .collect()
}
