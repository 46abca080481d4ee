use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use crate::models::CustomColumnDef;

/// Where custom column definitions live between sessions.
///
/// The engine never reads or writes column state on its own; callers load
/// definitions, hand them to the table, and save whatever the user edits.
pub trait ColumnStore {
    fn load(&self) -> Result<Vec<CustomColumnDef>>;
    fn save(&self, columns: &[CustomColumnDef]) -> Result<()>;
}

/// Column definitions stored as a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileColumnStore {
    path: PathBuf,
}

impl JsonFileColumnStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ColumnStore for JsonFileColumnStore {
    /// A missing file is an empty list.
    fn load(&self) -> Result<Vec<CustomColumnDef>> {
        if !self.path.exists() {
            warn!(
                "Column file {} not found, starting without custom columns",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read columns from {}", self.path.display()))?;
        let columns: Vec<CustomColumnDef> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse columns in {}", self.path.display()))?;

        info!("Loaded {} custom columns", columns.len());
        Ok(columns)
    }

    fn save(&self, columns: &[CustomColumnDef]) -> Result<()> {
        let json = serde_json::to_string_pretty(columns).context("Failed to serialize columns")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write columns to {}", self.path.display()))
    }
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryColumnStore {
    columns: RwLock<Vec<CustomColumnDef>>,
}

impl MemoryColumnStore {
    pub fn new(columns: Vec<CustomColumnDef>) -> Self {
        Self {
            columns: RwLock::new(columns),
        }
    }
}

impl ColumnStore for MemoryColumnStore {
    fn load(&self) -> Result<Vec<CustomColumnDef>> {
        let columns = self
            .columns
            .read()
            .map_err(|_| anyhow!("Column store lock poisoned"))?;
        Ok(columns.clone())
    }

    fn save(&self, columns: &[CustomColumnDef]) -> Result<()> {
        let mut stored = self
            .columns
            .write()
            .map_err(|_| anyhow!("Column store lock poisoned"))?;
        *stored = columns.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormatType;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "protocol-metrics-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let store = JsonFileColumnStore::new(temp_path("missing"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_round_trip_keeps_unknown_fields() {
        let path = temp_path("round-trip");
        fs::write(
            &path,
            json!([{
                "name": "Fees/TVL",
                "formula": "fees_24h / tvl",
                "formatType": "auto",
                "determinedFormat": "percent",
                "id": "col-1",
                "isVisible": true
            }])
            .to_string(),
        )
        .unwrap();

        let store = JsonFileColumnStore::new(&path);
        let columns = store.load().unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].extra["id"], json!("col-1"));

        store.save(&columns).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["isVisible"], json!(true));
        assert_eq!(written[0]["determinedFormat"], json!("percent"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = temp_path("invalid");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileColumnStore::new(&path).load().unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse columns"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryColumnStore::default();
        assert!(store.load().unwrap().is_empty());
        store
            .save(&[CustomColumnDef::new("A", "tvl", FormatType::Usd)])
            .unwrap();
        assert_eq!(store.load().unwrap()[0].name, "A");
    }
}
