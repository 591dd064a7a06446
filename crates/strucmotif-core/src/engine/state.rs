use crate::core::models::ids::StructureIdentifier;
use crate::core::models::structure::Revision;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("State file I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("State file is malformed: {0}")]
    Serialization(String),
    #[error("State lock is poisoned")]
    Poisoned,
}

/// Bookkeeping of which structures are fully indexed ("known") and which are
/// in the middle of an update ("dirty").
pub trait StateRepository: Send + Sync {
    fn select_known(&self) -> Result<HashMap<StructureIdentifier, Revision>, StateError>;
    fn select_dirty(&self) -> Result<HashSet<StructureIdentifier>, StateError>;
    fn insert_known(&self, entries: &[(StructureIdentifier, Revision)]) -> Result<(), StateError>;
    fn insert_dirty(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError>;
    fn delete_known(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError>;
    fn delete_dirty(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError>;
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct StateSnapshot {
    #[serde(default)]
    known: BTreeMap<StructureIdentifier, Revision>,
    #[serde(default)]
    dirty: BTreeSet<StructureIdentifier>,
}

impl StateSnapshot {
    fn insert_known(&mut self, entries: &[(StructureIdentifier, Revision)]) {
        self.known
            .extend(entries.iter().map(|(id, revision)| (id.clone(), *revision)));
    }

    fn insert_dirty(&mut self, ids: &HashSet<StructureIdentifier>) {
        self.dirty.extend(ids.iter().cloned());
    }

    fn delete_known(&mut self, ids: &HashSet<StructureIdentifier>) {
        self.known.retain(|id, _| !ids.contains(id));
    }

    fn delete_dirty(&mut self, ids: &HashSet<StructureIdentifier>) {
        self.dirty.retain(|id| !ids.contains(id));
    }
}

#[derive(Debug, Default)]
pub struct MemoryStateRepository {
    state: Mutex<StateSnapshot>,
}

impl MemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StateSnapshot) -> T) -> Result<T, StateError> {
        let mut state = self.state.lock().map_err(|_| StateError::Poisoned)?;
        Ok(f(&mut state))
    }
}

impl StateRepository for MemoryStateRepository {
    fn select_known(&self) -> Result<HashMap<StructureIdentifier, Revision>, StateError> {
        self.with_state(|s| s.known.iter().map(|(k, v)| (k.clone(), *v)).collect())
    }

    fn select_dirty(&self) -> Result<HashSet<StructureIdentifier>, StateError> {
        self.with_state(|s| s.dirty.iter().cloned().collect())
    }

    fn insert_known(&self, entries: &[(StructureIdentifier, Revision)]) -> Result<(), StateError> {
        self.with_state(|s| s.insert_known(entries))
    }

    fn insert_dirty(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError> {
        self.with_state(|s| s.insert_dirty(ids))
    }

    fn delete_known(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError> {
        self.with_state(|s| s.delete_known(ids))
    }

    fn delete_dirty(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError> {
        self.with_state(|s| s.delete_dirty(ids))
    }
}

/// State kept in a TOML file that is rewritten atomically after every change.
#[derive(Debug)]
pub struct FileStateRepository {
    path: PathBuf,
    state: Mutex<StateSnapshot>,
}

impl FileStateRepository {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| StateError::Serialization(e.to_string()))?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => StateSnapshot::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&StateSnapshot) -> T) -> Result<T, StateError> {
        let state = self.state.lock().map_err(|_| StateError::Poisoned)?;
        Ok(f(&state))
    }

    /// Applies `f` to a copy of the state and swaps it in only once the file
    /// has been written.
    fn write(&self, f: impl FnOnce(&mut StateSnapshot)) -> Result<(), StateError> {
        let mut state = self.state.lock().map_err(|_| StateError::Poisoned)?;
        let mut updated = state.clone();
        f(&mut updated);

        let content =
            toml::to_string(&updated).map_err(|e| StateError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;

        *state = updated;
        Ok(())
    }
}

impl StateRepository for FileStateRepository {
    fn select_known(&self) -> Result<HashMap<StructureIdentifier, Revision>, StateError> {
        self.read(|s| s.known.iter().map(|(k, v)| (k.clone(), *v)).collect())
    }

    fn select_dirty(&self) -> Result<HashSet<StructureIdentifier>, StateError> {
        self.read(|s| s.dirty.iter().cloned().collect())
    }

    fn insert_known(&self, entries: &[(StructureIdentifier, Revision)]) -> Result<(), StateError> {
        self.write(|s| s.insert_known(entries))
    }

    fn insert_dirty(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError> {
        self.write(|s| s.insert_dirty(ids))
    }

    fn delete_known(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError> {
        self.write(|s| s.delete_known(ids))
    }

    fn delete_dirty(&self, ids: &HashSet<StructureIdentifier>) -> Result<(), StateError> {
        self.write(|s| s.delete_dirty(ids))
    }
}
