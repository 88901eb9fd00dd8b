//! Saved-boards store: a JSON key-value file whose `savedBoards` key holds a
//! list of named board snapshots.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StoreError;
use crate::game::{Board, BoardSnapshot};

/// Key under which the board list is stored.
pub const SAVED_BOARDS_KEY: &str = "savedBoards";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedBoard {
    pub name: String,
    #[serde(flatten)]
    pub snapshot: BoardSnapshot,
}

/// Entries stay raw JSON so one malformed board cannot hide the others.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(rename = "savedBoards", default)]
    saved_boards: Vec<Value>,
    /// Unrelated keys written by other tools are carried through untouched.
    #[serde(flatten)]
    other: Map<String, Value>,
}

fn entry_name(entry: &Value) -> Option<&str> {
    entry.get("name").and_then(Value::as_str)
}

pub struct BoardStore {
    path: PathBuf,
}

impl BoardStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        BoardStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save `board` under `name`, replacing any entry with the same name.
    pub fn save(&self, name: &str, board: &Board) -> Result<(), StoreError> {
        let mut file = self.read()?;
        let entry = serde_json::to_value(NamedBoard {
            name: name.to_string(),
            snapshot: board.snapshot(),
        })?;
        match file
            .saved_boards
            .iter_mut()
            .find(|b| entry_name(b) == Some(name))
        {
            Some(existing) => *existing = entry,
            None => file.saved_boards.push(entry),
        }
        self.write(&file)?;
        debug!(name, moves = board.move_count(), "board saved");
        Ok(())
    }

    /// Names of all saved boards in insertion order. Entries without a
    /// string `name` are skipped.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read()?
            .saved_boards
            .iter()
            .filter_map(entry_name)
            .map(str::to_string)
            .collect())
    }

    pub fn snapshot(&self, name: &str) -> Result<BoardSnapshot, StoreError> {
        let entry = self
            .read()?
            .saved_boards
            .into_iter()
            .find(|b| entry_name(b) == Some(name))
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        serde_json::from_value::<NamedBoard>(entry)
            .map(|b| b.snapshot)
            .map_err(|source| StoreError::InvalidEntry {
                name: name.to_string(),
                source,
            })
    }

    /// Rebuild the board saved under `name`.
    pub fn load(&self, name: &str) -> Result<Board, StoreError> {
        let snapshot = self.snapshot(name)?;
        Board::from_snapshot(&snapshot).map_err(|source| StoreError::Corrupt {
            name: name.to_string(),
            source,
        })
    }

    /// Remove the entry named `name`. Returns whether one existed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let mut file = self.read()?;
        let before = file.saved_boards.len();
        file.saved_boards.retain(|b| entry_name(b) != Some(name));
        if file.saved_boards.len() == before {
            return Ok(false);
        }
        self.write(&file)?;
        Ok(true)
    }

    fn read(&self) -> Result<StoreFile, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&json).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(file)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
