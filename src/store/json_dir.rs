use std::fs;
use std::path::{Path, PathBuf};

use super::PaintingStore;
use crate::error::{SerializeError, SyncResult};
use crate::serializer::Painting;

/// Stores each painting as `<id>.json` in one directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids become file names, so only a safe character set is accepted
    fn path_for(&self, id: &str) -> SyncResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SerializeError::InvalidId(id.to_string()).into());
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    fn read(path: &Path) -> SyncResult<Painting> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl PaintingStore for JsonDirStore {
    fn upsert(&self, painting: &Painting) -> SyncResult<()> {
        let path = self.path_for(&painting.id)?;
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(painting)?;
        fs::write(&path, json)?;
        log::debug!("saved painting {} to {}", painting.id, path.display());
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> SyncResult<Option<Painting>> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    /// Unreadable files are logged and skipped.
    fn get_all(&self) -> SyncResult<Vec<Painting>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paintings = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(painting) => paintings.push(painting),
                Err(err) => log::warn!("skipping unreadable painting {}: {}", path.display(), err),
            }
        }
        paintings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(paintings)
    }

    fn delete(&self, painting: &Painting) -> SyncResult<()> {
        let path = self.path_for(&painting.id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("painting {} was not stored", painting.id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
