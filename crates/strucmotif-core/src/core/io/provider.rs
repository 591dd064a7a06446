use crate::core::models::ids::StructureIdentifier;
use crate::core::models::structure::Structure;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Source file for '{0}' is missing")]
    SourceMissing(StructureIdentifier),
    #[error("Structure '{0}' contains no valid polymer chain")]
    NoPolymerChain(StructureIdentifier),
    #[error("Failed to (de)serialize structure '{id}': {message}")]
    Serialization {
        id: StructureIdentifier,
        message: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Data provider state is poisoned")]
    Poisoned,
}

/// Access to original structure files and their renumbered (reduced) form.
pub trait StructureDataProvider: Send + Sync {
    /// Opens the original structure file of an archive entry.
    fn original_input(&self, id: &StructureIdentifier) -> Result<Box<dyn BufRead + Send>, ProviderError>;

    /// Stores the reduced structure used for extraction and scoring.
    fn write_renumbered(&self, id: &StructureIdentifier, structure: &Structure) -> Result<(), ProviderError>;

    /// Loads a reduced structure.
    ///
    /// Fails with [`ProviderError::SourceMissing`] when nothing is stored for `id`
    /// and with [`ProviderError::NoPolymerChain`] when it holds no residues.
    fn read_renumbered(&self, id: &StructureIdentifier) -> Result<Structure, ProviderError>;

    /// Removes a reduced structure; removing an absent one is a no-op.
    fn delete_renumbered(&self, id: &StructureIdentifier) -> Result<(), ProviderError>;
}

fn ensure_polymer(id: &StructureIdentifier, structure: Structure) -> Result<Structure, ProviderError> {
    if structure.is_empty() {
        Err(ProviderError::NoPolymerChain(id.clone()))
    } else {
        Ok(structure)
    }
}

/// Provider backed by two directories: `<original>/<id>.pdb` files and
/// `<renumbered>/<id>.toml` reduced structures.
#[derive(Debug, Clone)]
pub struct DirectoryDataProvider {
    original_dir: PathBuf,
    renumbered_dir: PathBuf,
}

impl DirectoryDataProvider {
    pub fn new(original_dir: impl Into<PathBuf>, renumbered_dir: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let renumbered_dir = renumbered_dir.into();
        fs::create_dir_all(&renumbered_dir)?;
        Ok(Self {
            original_dir: original_dir.into(),
            renumbered_dir,
        })
    }

    pub fn original_path(&self, id: &StructureIdentifier) -> PathBuf {
        self.original_dir.join(format!("{}.pdb", id))
    }

    pub fn renumbered_path(&self, id: &StructureIdentifier) -> PathBuf {
        self.renumbered_dir.join(format!("{}.toml", id))
    }
}

fn open_existing(path: &Path, id: &StructureIdentifier) -> Result<File, ProviderError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ProviderError::SourceMissing(id.clone()),
        _ => ProviderError::Io(e),
    })
}

impl StructureDataProvider for DirectoryDataProvider {
    fn original_input(&self, id: &StructureIdentifier) -> Result<Box<dyn BufRead + Send>, ProviderError> {
        let file = open_existing(&self.original_path(id), id)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn write_renumbered(&self, id: &StructureIdentifier, structure: &Structure) -> Result<(), ProviderError> {
        let content = toml::to_string(structure).map_err(|e| ProviderError::Serialization {
            id: id.clone(),
            message: e.to_string(),
        })?;
        let path = self.renumbered_path(id);
        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;
        debug!("Wrote renumbered structure to {:?}", path);
        Ok(())
    }

    fn read_renumbered(&self, id: &StructureIdentifier) -> Result<Structure, ProviderError> {
        let path = self.renumbered_path(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProviderError::SourceMissing(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let structure = toml::from_str(&content).map_err(|e| ProviderError::Serialization {
            id: id.clone(),
            message: e.to_string(),
        })?;
        ensure_polymer(id, structure)
    }

    fn delete_renumbered(&self, id: &StructureIdentifier) -> Result<(), ProviderError> {
        match fs::remove_file(self.renumbered_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory provider holding original file contents and reduced structures.
#[derive(Debug, Default)]
pub struct MemoryDataProvider {
    originals: RwLock<HashMap<StructureIdentifier, String>>,
    renumbered: RwLock<HashMap<StructureIdentifier, Structure>>,
}

impl MemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_original(&self, id: StructureIdentifier, content: impl Into<String>) -> Result<(), ProviderError> {
        self.originals
            .write()
            .map_err(|_| ProviderError::Poisoned)?
            .insert(id, content.into());
        Ok(())
    }

    pub fn contains_renumbered(&self, id: &StructureIdentifier) -> bool {
        self.renumbered
            .read()
            .map(|map| map.contains_key(id))
            .unwrap_or(false)
    }
}

impl StructureDataProvider for MemoryDataProvider {
    fn original_input(&self, id: &StructureIdentifier) -> Result<Box<dyn BufRead + Send>, ProviderError> {
        let originals = self.originals.read().map_err(|_| ProviderError::Poisoned)?;
        let content = originals
            .get(id)
            .ok_or_else(|| ProviderError::SourceMissing(id.clone()))?;
        Ok(Box::new(Cursor::new(content.clone().into_bytes())))
    }

    fn write_renumbered(&self, id: &StructureIdentifier, structure: &Structure) -> Result<(), ProviderError> {
        self.renumbered
            .write()
            .map_err(|_| ProviderError::Poisoned)?
            .insert(id.clone(), structure.clone());
        Ok(())
    }

    fn read_renumbered(&self, id: &StructureIdentifier) -> Result<Structure, ProviderError> {
        let structure = self
            .renumbered
            .read()
            .map_err(|_| ProviderError::Poisoned)?
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::SourceMissing(id.clone()))?;
        ensure_polymer(id, structure)
    }

    fn delete_renumbered(&self, id: &StructureIdentifier) -> Result<(), ProviderError> {
        self.renumbered
            .write()
            .map_err(|_| ProviderError::Poisoned)?
            .remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ResidueIdentifier;
    use crate::core::models::residue::{Residue, ResidueType};
    use crate::core::models::structure::Revision;
    use nalgebra::Point3;
    use std::io::Read;
    use tempfile::tempdir;

    fn structure(id: &StructureIdentifier, residues: usize) -> Structure {
        let residues = (0..residues)
            .map(|i| {
                Residue::new(
                    ResidueIdentifier::new('A', i as isize + 1),
                    ResidueType::Alanine,
                    Point3::new(i as f64 * 3.8, 0.0, 0.0),
                    Some(Point3::new(i as f64 * 3.8, 1.5, 0.0)),
                )
            })
            .collect();
        Structure::new(id.clone(), Revision::new(2, 0), residues)
    }

    #[test]
    fn directory_provider_round_trips_renumbered_structures() {
        let dir = tempdir().unwrap();
        let provider =
            DirectoryDataProvider::new(dir.path().join("orig"), dir.path().join("renum")).unwrap();
        let id = StructureIdentifier::new("1abc");

        provider.write_renumbered(&id, &structure(&id, 3)).unwrap();
        let restored = provider.read_renumbered(&id).unwrap();

        assert_eq!(restored, structure(&id, 3));
        assert!(!provider.renumbered_path(&id).with_extension("toml.tmp").exists());
    }

    #[test]
    fn directory_provider_reports_missing_sources() {
        let dir = tempdir().unwrap();
        let provider =
            DirectoryDataProvider::new(dir.path().join("orig"), dir.path().join("renum")).unwrap();
        let id = StructureIdentifier::new("9zzz");

        assert!(matches!(
            provider.original_input(&id),
            Err(ProviderError::SourceMissing(_))
        ));
        assert!(matches!(
            provider.read_renumbered(&id),
            Err(ProviderError::SourceMissing(_))
        ));
        assert!(provider.delete_renumbered(&id).is_ok());
    }

    #[test]
    fn directory_provider_opens_original_files() {
        let dir = tempdir().unwrap();
        let original_dir = dir.path().join("orig");
        fs::create_dir_all(&original_dir).unwrap();
        fs::write(original_dir.join("1abc.pdb"), "HEADER    TEST").unwrap();
        let provider = DirectoryDataProvider::new(&original_dir, dir.path().join("renum")).unwrap();

        let mut content = String::new();
        provider
            .original_input(&StructureIdentifier::new("1ABC"))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();

        assert_eq!(content, "HEADER    TEST");
    }

    #[test]
    fn empty_structures_are_reported_as_lacking_polymer_chains() {
        let provider = MemoryDataProvider::new();
        let id = StructureIdentifier::new("1hoh");
        provider.write_renumbered(&id, &structure(&id, 0)).unwrap();

        assert!(matches!(
            provider.read_renumbered(&id),
            Err(ProviderError::NoPolymerChain(_))
        ));
    }

    #[test]
    fn memory_provider_deletes_renumbered_structures() {
        let provider = MemoryDataProvider::new();
        let id = StructureIdentifier::new("1abc");
        provider.write_renumbered(&id, &structure(&id, 2)).unwrap();
        assert!(provider.contains_renumbered(&id));

        provider.delete_renumbered(&id).unwrap();
        provider.delete_renumbered(&id).unwrap();

        assert!(!provider.contains_renumbered(&id));
    }
}
