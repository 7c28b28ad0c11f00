//! File-backed high score.
//!
//! The file holds one JSON object, `{"high_score": N}`. A missing file reads
//! as zero. Writes go to a sibling temp file first and are renamed into place,
//! so a crash mid-write leaves the previous value readable.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use flappy_coach_core::{HighScoreStore, StoreError};
use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: u32,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the stored value. Succeeds when there was nothing to delete.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(format!(
                "failed removing {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HighScoreStore for JsonFileStore {
    fn load_high_score(&mut self) -> Result<u32, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => {
                return Err(StoreError::Io(format!(
                    "failed reading {}: {err}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_slice::<HighScoreFile>(&bytes)
            .map(|file| file.high_score)
            .map_err(|err| StoreError::Corrupt(format!("{}: {err}", self.path.display())))
    }

    fn save_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                StoreError::Io(format!("failed creating {}: {err}", parent.display()))
            })?;
        }

        let encoded = serde_json::to_vec_pretty(&HighScoreFile { high_score: score })
            .map_err(|err| StoreError::Io(format!("failed encoding high score: {err}")))?;

        let temp = self.temp_path();
        fs::write(&temp, encoded)
            .map_err(|err| StoreError::Io(format!("failed writing {}: {err}", temp.display())))?;
        fs::rename(&temp, &self.path).map_err(|err| {
            StoreError::Io(format!("failed replacing {}: {err}", self.path.display()))
        })?;

        tracing::debug!(path = %self.path.display(), score, "high score saved");
        Ok(())
    }
}
