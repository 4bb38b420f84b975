use crate::core::cluster_filter::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clustering: ClusteringConfig,
    pub tools: ToolsConfig,
    pub output: OutputConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Largest e-value at which two clusters still merge
    pub evalue_threshold: f64,
    /// Allowed fractional length difference before a pair is not compared
    pub length_threshold: f64,
    /// Clusters with fewer distinct taxa are discarded
    pub min_taxa: usize,
    pub duplicate_policy: DuplicatePolicy,
    /// Distance recorded for pairs failing the length pre-filter
    pub incomparable_distance: f64,
    /// Distance recorded when the oracle reports no hit (or fails)
    pub no_hit_distance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Explicit blastn binary; looked up on PATH when unset
    pub blastn: Option<PathBuf>,
    /// Explicit muscle binary; looked up on PATH when unset
    pub muscle: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub line_width: usize,
    pub write_csv: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker threads (0 = all available)
    pub threads: usize,
    /// Score matrix pairs on the rayon pool
    pub parallel_distances: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            evalue_threshold: 1.0e-10,
            length_threshold: 0.5,
            min_taxa: 4,
            duplicate_policy: DuplicatePolicy::KeepFirst,
            incomparable_distance: 50.0,
            no_hit_distance: 10.0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            line_width: crate::bio::fasta::LINE_WIDTH,
            write_csv: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), crate::SumacError> {
        let c = &self.clustering;
        if !(c.length_threshold >= 0.0 && c.length_threshold.is_finite()) {
            return Err(crate::SumacError::Config(format!(
                "length_threshold must be a non-negative number, got {}",
                c.length_threshold
            )));
        }
        if !(c.evalue_threshold >= 0.0) {
            return Err(crate::SumacError::Config(format!(
                "evalue_threshold must be non-negative, got {}",
                c.evalue_threshold
            )));
        }
        crate::core::distance_matrix::check_distance("incomparable_distance", c.incomparable_distance)?;
        crate::core::distance_matrix::check_distance("no_hit_distance", c.no_hit_distance)?;
        if c.min_taxa == 0 {
            return Err(crate::SumacError::Config("min_taxa must be at least 1".to_string()));
        }
        if self.output.line_width == 0 {
            return Err(crate::SumacError::Config("line_width must be at least 1".to_string()));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::SumacError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        crate::SumacError::Config(format!("Failed to read config {}: {}", path.display(), e))
    })?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::SumacError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::SumacError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::SumacError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
