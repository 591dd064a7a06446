use crate::error::{CliError, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use strucmotif::engine::config::{MotifSearchConfig, MotifSearchConfigBuilder};
use tracing::debug;

pub const DEFAULT_ENTRY_LIST_URL: &str = "https://www.rcsb.org/pdb/json/getCurrent";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPathsConfig {
    original: Option<PathBuf>,
    renumbered: Option<PathBuf>,
    index: Option<PathBuf>,
    state: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSearchConfig {
    distance_cutoff: Option<f64>,
    distance_bin_size: Option<f64>,
    angle_bin_size: Option<f64>,
    max_results: Option<usize>,
    max_motif_size: Option<usize>,
    parallel_scoring: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialUpdateConfig {
    chunk_size: Option<usize>,
}

/// Contents of the TOML configuration file; every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialConfig {
    entry_list_url: Option<String>,
    paths: Option<PartialPathsConfig>,
    search: Option<PartialSearchConfig>,
    update: Option<PartialUpdateConfig>,
}

/// Locations of the archive's persistent parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivePaths {
    /// Directory of original `<id>.pdb` files.
    pub original: PathBuf,
    /// Directory of reduced structures written during updates.
    pub renumbered: PathBuf,
    pub index: PathBuf,
    pub state: PathBuf,
}

impl ArchivePaths {
    pub fn under(data_dir: &Path) -> Self {
        Self {
            original: data_dir.join("original"),
            renumbered: data_dir.join("renumbered"),
            index: data_dir.join("index.bin"),
            state: data_dir.join("state.toml"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: ArchivePaths,
    pub motif: MotifSearchConfig,
    pub entry_list_url: String,
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub chunk_size: Option<usize>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| match e {
            CliError::Config(message) => CliError::FileParsing {
                path: path.to_path_buf(),
                source: anyhow::anyhow!(message),
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Loads the explicitly given file, else the file in the user's config
    /// directory if present, else an empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME)) {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn merge(self, overrides: &Overrides) -> Result<AppConfig> {
        let data_dir = match &overrides.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        let defaults = ArchivePaths::under(&data_dir);
        let paths_file = self.paths.unwrap_or_default();
        let paths = ArchivePaths {
            original: paths_file.original.unwrap_or(defaults.original),
            renumbered: paths_file.renumbered.unwrap_or(defaults.renumbered),
            index: paths_file.index.unwrap_or(defaults.index),
            state: paths_file.state.unwrap_or(defaults.state),
        };

        let search = self.search.unwrap_or_default();
        let update = self.update.unwrap_or_default();
        let mut builder = MotifSearchConfigBuilder::new();
        if let Some(v) = search.distance_cutoff {
            builder = builder.distance_cutoff(v);
        }
        if let Some(v) = search.distance_bin_size {
            builder = builder.distance_bin_size(v);
        }
        if let Some(v) = search.angle_bin_size {
            builder = builder.angle_bin_size(v);
        }
        if let Some(v) = search.max_results {
            builder = builder.max_results(v);
        }
        if let Some(v) = search.max_motif_size {
            builder = builder.max_motif_size(v);
        }
        if let Some(v) = search.parallel_scoring {
            builder = builder.parallel_scoring(v);
        }
        if let Some(v) = overrides.chunk_size.or(update.chunk_size) {
            builder = builder.update_chunk_size(v);
        }
        let motif = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AppConfig {
            paths,
            motif,
            entry_list_url: self
                .entry_list_url
                .unwrap_or_else(|| DEFAULT_ENTRY_LIST_URL.to_string()),
        })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "rcsb", "strucmotif")
}

fn default_data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| CliError::Config("Could not determine default data directory path.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use strucmotif::engine::config::DEFAULT_UPDATE_CHUNK_SIZE;
    use tempfile::tempdir;

    fn overrides(data_dir: &Path) -> Overrides {
        Overrides {
            data_dir: Some(data_dir.to_path_buf()),
            chunk_size: None,
        }
    }

    #[test]
    fn empty_configuration_falls_back_to_data_directory_and_defaults() {
        let dir = tempdir().unwrap();
        let config = PartialConfig::default().merge(&overrides(dir.path())).unwrap();

        assert_eq!(config.paths, ArchivePaths::under(dir.path()));
        assert_eq!(config.paths.index, dir.path().join("index.bin"));
        assert_eq!(config.motif.update_chunk_size, DEFAULT_UPDATE_CHUNK_SIZE);
        assert_eq!(config.entry_list_url, DEFAULT_ENTRY_LIST_URL);
    }

    #[test]
    fn file_values_are_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            entry-list-url = "http://localhost/ids"

            [paths]
            original = "/archive/pdb"
            state = "/archive/state.toml"

            [search]
            distance-cutoff = 15.0
            max-results = 50
            parallel-scoring = false

            [update]
            chunk-size = 25
            "#,
        )
        .unwrap();

        let config = PartialConfig::from_file(&path)
            .unwrap()
            .merge(&overrides(dir.path()))
            .unwrap();

        assert_eq!(config.entry_list_url, "http://localhost/ids");
        assert_eq!(config.paths.original, PathBuf::from("/archive/pdb"));
        assert_eq!(config.paths.renumbered, dir.path().join("renumbered"));
        assert_eq!(config.paths.state, PathBuf::from("/archive/state.toml"));
        assert_eq!(config.motif.distance_cutoff, 15.0);
        assert_eq!(config.motif.max_results, 50);
        assert!(!config.motif.parallel_scoring);
        assert_eq!(config.motif.update_chunk_size, 25);
    }

    #[test]
    fn cli_chunk_size_overrides_file_value() {
        let dir = tempdir().unwrap();
        let partial = PartialConfig::from_toml("[update]\nchunk-size = 25\n").unwrap();
        let overrides = Overrides {
            data_dir: Some(dir.path().to_path_buf()),
            chunk_size: Some(3),
        };

        let config = partial.merge(&overrides).unwrap();

        assert_eq!(config.motif.update_chunk_size, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\ndistance-cutof = 15.0\n").unwrap();

        assert!(matches!(
            PartialConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn invalid_values_are_reported_as_configuration_errors() {
        let dir = tempdir().unwrap();
        let partial = PartialConfig::from_toml("[update]\nchunk-size = 0\n").unwrap();

        assert!(matches!(
            partial.merge(&overrides(dir.path())),
            Err(CliError::Config(_))
        ));
    }
}
