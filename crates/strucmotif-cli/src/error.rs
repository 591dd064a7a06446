use crate::utils::parser::ParseError;
use std::path::PathBuf;
use strucmotif::engine::error::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Strucmotif(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed entry list: {0}")]
    EntryList(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Invalid argument: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to set up {component}: {reason}")]
    Setup {
        component: &'static str,
        reason: String,
    },
}

impl CliError {
    pub fn setup(component: &'static str, reason: impl ToString) -> Self {
        Self::Setup {
            component,
            reason: reason.to_string(),
        }
    }
}
