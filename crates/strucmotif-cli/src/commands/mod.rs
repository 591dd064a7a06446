pub mod search;
pub mod update;

use crate::config::AppConfig;
use crate::error::Result;
use strucmotif::core::io::provider::DirectoryDataProvider;
use strucmotif::engine::error::EngineError;
use strucmotif::engine::index::FileInvertedIndex;
use strucmotif::engine::state::FileStateRepository;
use tracing::debug;

/// File-backed stores of one archive.
pub struct Archive {
    pub state: FileStateRepository,
    pub provider: DirectoryDataProvider,
    pub index: FileInvertedIndex,
}

impl Archive {
    /// Opens the stores under the configured paths; the index must have been
    /// binned with the configured quantizer.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let paths = &config.paths;
        debug!("Opening archive: {:?}", paths);
        let state = FileStateRepository::open(&paths.state).map_err(EngineError::from)?;
        let provider = DirectoryDataProvider::new(&paths.original, &paths.renumbered)
            .map_err(EngineError::from)?;
        let index = FileInvertedIndex::open(&paths.index, config.motif.quantizer()).map_err(EngineError::from)?;
        Ok(Self {
            state,
            provider,
            index,
        })
    }
}
