//! Durable key-value state for stream watermarks.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use kinotek_core::Result;
use tracing::debug;

/// A single-writer string map persisted as one JSON object, flushed after
/// every write.
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the original, so a crash mid-write leaves either the prior or the
/// new state on disk, never a torn file.
#[derive(Debug)]
pub struct JsonFileState {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileState {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Persistent on return.
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        debug!("State SET: {} = {}", key, value);
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &self.entries)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}
