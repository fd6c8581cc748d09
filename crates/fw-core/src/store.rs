//! Persistence of the single administrative config blob.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::AdminConfig;
use crate::error::CoreResult;

/// Get/put access to one opaque configuration blob.
pub trait ConfigStore {
    /// Whether a blob has been stored.
    fn exists(&self) -> bool;

    /// Read the blob, or `None` if absent.
    fn load(&self) -> CoreResult<Option<String>>;

    /// Replace the blob.
    fn save(&mut self, blob: &str) -> CoreResult<()>;
}

/// Load and parse the stored config, if any.
pub fn load_config(store: &dyn ConfigStore) -> CoreResult<Option<AdminConfig>> {
    match store.load()? {
        Some(blob) => Ok(Some(AdminConfig::from_json(&blob)?)),
        None => Ok(None),
    }
}

/// Serialize and store a config.
pub fn save_config(store: &mut dyn ConfigStore, config: &AdminConfig) -> CoreResult<()> {
    store.save(&config.to_json()?)
}

/// Keeps the blob in memory. Used by tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a blob.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
        }
    }

    /// The current blob.
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl ConfigStore for MemoryStore {
    fn exists(&self) -> bool {
        self.blob.is_some()
    }

    fn load(&self) -> CoreResult<Option<String>> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> CoreResult<()> {
        self.blob = Some(blob.to_string());
        Ok(())
    }
}

/// Stores the blob as a JSON file. A missing file means no blob.
///
/// Saves go to a temporary file in the same directory which is then renamed
/// over the target, so readers never see a partial blob.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// A store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> CoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, blob: &str) -> CoreResult<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(blob.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
