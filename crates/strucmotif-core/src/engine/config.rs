use crate::core::models::descriptor::Quantizer;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub const DEFAULT_DISTANCE_CUTOFF: f64 = 20.0;
pub const DEFAULT_DISTANCE_BIN_SIZE: f64 = 1.0;
pub const DEFAULT_ANGLE_BIN_SIZE: f64 = 10.0;
pub const DEFAULT_UPDATE_CHUNK_SIZE: usize = 400;
pub const DEFAULT_MAX_RESULTS: usize = 10_000;
pub const DEFAULT_MAX_MOTIF_SIZE: usize = 10;

/// Settings shared by the update pipeline and the search runtime.
///
/// The quantization parameters must be identical for indexing and searching;
/// an index built with one configuration cannot be queried with another.
#[derive(Debug, Clone, PartialEq)]
pub struct MotifSearchConfig {
    pub distance_cutoff: f64,
    pub distance_bin_size: f64,
    pub angle_bin_size: f64,
    pub update_chunk_size: usize,
    pub max_results: usize,
    pub max_motif_size: usize,
    pub parallel_scoring: bool,
}

impl MotifSearchConfig {
    pub fn quantizer(&self) -> Quantizer {
        Quantizer::new(
            self.distance_cutoff,
            self.distance_bin_size,
            self.angle_bin_size,
        )
    }
}

impl Default for MotifSearchConfig {
    fn default() -> Self {
        Self {
            distance_cutoff: DEFAULT_DISTANCE_CUTOFF,
            distance_bin_size: DEFAULT_DISTANCE_BIN_SIZE,
            angle_bin_size: DEFAULT_ANGLE_BIN_SIZE,
            update_chunk_size: DEFAULT_UPDATE_CHUNK_SIZE,
            max_results: DEFAULT_MAX_RESULTS,
            max_motif_size: DEFAULT_MAX_MOTIF_SIZE,
            parallel_scoring: true,
        }
    }
}

#[derive(Default)]
pub struct MotifSearchConfigBuilder {
    distance_cutoff: Option<f64>,
    distance_bin_size: Option<f64>,
    angle_bin_size: Option<f64>,
    update_chunk_size: Option<usize>,
    max_results: Option<usize>,
    max_motif_size: Option<usize>,
    parallel_scoring: Option<bool>,
}

impl MotifSearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_cutoff(mut self, cutoff: f64) -> Self {
        self.distance_cutoff = Some(cutoff);
        self
    }
    pub fn distance_bin_size(mut self, size: f64) -> Self {
        self.distance_bin_size = Some(size);
        self
    }
    pub fn angle_bin_size(mut self, size: f64) -> Self {
        self.angle_bin_size = Some(size);
        self
    }
    pub fn update_chunk_size(mut self, size: usize) -> Self {
        self.update_chunk_size = Some(size);
        self
    }
    pub fn max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }
    pub fn max_motif_size(mut self, n: usize) -> Self {
        self.max_motif_size = Some(n);
        self
    }
    pub fn parallel_scoring(mut self, enabled: bool) -> Self {
        self.parallel_scoring = Some(enabled);
        self
    }

    pub fn build(self) -> Result<MotifSearchConfig, ConfigError> {
        let defaults = MotifSearchConfig::default();
        let config = MotifSearchConfig {
            distance_cutoff: self.distance_cutoff.unwrap_or(defaults.distance_cutoff),
            distance_bin_size: self.distance_bin_size.unwrap_or(defaults.distance_bin_size),
            angle_bin_size: self.angle_bin_size.unwrap_or(defaults.angle_bin_size),
            update_chunk_size: self.update_chunk_size.unwrap_or(defaults.update_chunk_size),
            max_results: self.max_results.unwrap_or(defaults.max_results),
            max_motif_size: self.max_motif_size.unwrap_or(defaults.max_motif_size),
            parallel_scoring: self.parallel_scoring.unwrap_or(defaults.parallel_scoring),
        };
        validate(&config)?;
        Ok(config)
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn validate(config: &MotifSearchConfig) -> Result<(), ConfigError> {
    let positive = |name, value: f64| {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(invalid(name, format!("must be a positive number, got {}", value)))
        }
    };
    positive("distance_cutoff", config.distance_cutoff)?;
    positive("distance_bin_size", config.distance_bin_size)?;
    positive("angle_bin_size", config.angle_bin_size)?;

    // Bins are stored as u8.
    if config.distance_cutoff / config.distance_bin_size > u8::MAX as f64 {
        return Err(invalid(
            "distance_bin_size",
            "too small for the distance cutoff (more than 255 bins)",
        ));
    }
    if config.angle_bin_size > 180.0 {
        return Err(invalid("angle_bin_size", "must not exceed 180 degrees"));
    }
    if config.update_chunk_size == 0 {
        return Err(invalid("update_chunk_size", "must be at least 1"));
    }
    if config.max_results == 0 {
        return Err(invalid("max_results", "must be at least 1"));
    }
    if config.max_motif_size < 2 {
        return Err(invalid("max_motif_size", "a motif needs at least 2 residues"));
    }
    Ok(())
}
