//! Save files for player profiles.
//!
//! A profile is stored as an opaque postcard blob at `<dir>/<name>.sav`.
//! The battle engine never touches saves; only the game session does.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::SaveError;
use crate::player::Player;

pub const SAVE_EXTENSION: &str = "sav";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, SAVE_EXTENSION))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Writes the profile, creating the save directory if needed.
    pub fn save(&self, name: &str, player: &Player) -> Result<PathBuf, SaveError> {
        let path = self.path_for(name);
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;

        let bytes = postcard::to_allocvec(player)?;
        fs::write(&path, &bytes).map_err(|source| io_error(&path, source))?;
        info!(path = %path.display(), bytes = bytes.len(), "game saved");
        Ok(path)
    }

    /// Reads a profile back. A missing save is `Ok(None)`, not an error.
    pub fn load(&self, name: &str) -> Result<Option<Player>, SaveError> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no save file");
                return Ok(None);
            }
            Err(source) => return Err(io_error(&path, source)),
        };

        let player = postcard::from_bytes(&bytes)?;
        info!(path = %path.display(), "game loaded");
        Ok(Some(player))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SaveError {
    SaveError::Io {
        path: path.display().to_string(),
        source,
    }
}
