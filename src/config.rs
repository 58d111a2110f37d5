//! Configuration file
//!
//! Settings are read from a YAML file, for example
//!
//! ```yaml
//! infiles: [events.hepmc2.gz]
//! collection: jets
//! on_missing: skip
//! producers:
//!   - label: jets
//!     algorithm: anti-kt
//!     radius: 0.4
//!     min_pt: 30
//! histogram: {bins: 50, min: 0, max: 1000}
//! ```
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cluster::{JetAlgorithm, JetDefinition, JetProducer},
    collection::CollectionLabel,
    formats::FileFormat,
    histogram::HistogramSettings,
    scan::MissingPolicy,
};

/// Name of the configuration file in the working directory
pub const LOCAL_CONFIG: &str = "dijets.yaml";
/// Process name for collections added by jet producers
pub const DEFAULT_PROCESS: &str = "DIJETS";
/// Label of the jet collection scanned by default
pub const DEFAULT_COLLECTION: &str = "jets";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input event files
    pub infiles: Vec<PathBuf>,
    /// Input format, detected from the file content if absent
    pub format: Option<FileFormat>,
    /// Jet collection to scan
    pub collection: Option<CollectionLabel>,
    pub on_missing: MissingPolicy,
    /// Process name of produced jet collections
    pub process: Option<String>,
    pub producers: Vec<ProducerConfig>,
    pub histogram: Option<HistogramSettings>,
    /// Report output, standard output if absent
    pub outfile: Option<PathBuf>,
}

/// Settings for a jet producer
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProducerConfig {
    pub label: String,
    #[serde(default)]
    pub instance: String,
    pub algorithm: JetAlgorithm,
    pub radius: f64,
    #[serde(default)]
    pub min_pt: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Jet producer without label")]
    EmptyProducerLabel,
    #[error("Jet producer `{0}`: radius has to be positive, is {1}")]
    InvalidRadius(String, f64),
}

impl Config {
    /// Read the configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Reading configuration from {path:?}");
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| {
            ConfigError::Parse {
                path: path.to_owned(),
                source,
            }
        })
    }

    /// Look for a configuration file
    ///
    /// An explicitly given path is always used. Otherwise, the first
    /// existing file out of [LOCAL_CONFIG] in the working directory
    /// and `dijets/config.yaml` in the user's configuration directory
    /// is chosen.
    pub fn locate(explicit: Option<PathBuf>) -> Option<PathBuf> {
        if explicit.is_some() {
            return explicit;
        }
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("dijets").join("config.yaml"));
        }
        candidates.into_iter().find(|path| path.is_file())
    }

    /// Label of the jet collection to scan
    pub fn collection(&self) -> CollectionLabel {
        self.collection
            .clone()
            .unwrap_or_else(|| CollectionLabel::new(DEFAULT_COLLECTION, "", ""))
    }

    pub fn process(&self) -> &str {
        self.process.as_deref().unwrap_or(DEFAULT_PROCESS)
    }

    /// Construct all configured jet producers
    pub fn jet_producers(&self) -> Result<Vec<JetProducer>, ConfigError> {
        self.producers
            .iter()
            .map(|p| p.to_producer(self.process()))
            .collect()
    }
}

impl ProducerConfig {
    pub fn jet_def(&self) -> JetDefinition {
        JetDefinition {
            algorithm: self.algorithm,
            radius: self.radius,
            min_pt: self.min_pt,
        }
    }

    pub fn to_producer(&self, process: &str) -> Result<JetProducer, ConfigError> {
        if self.label.is_empty() {
            return Err(ConfigError::EmptyProducerLabel);
        }
        if !(self.radius > 0.) {
            return Err(ConfigError::InvalidRadius(
                self.label.clone(),
                self.radius,
            ));
        }
        let label = CollectionLabel::new(&self.label, &self.instance, process);
        Ok(JetProducer::new(label, self.jet_def()))
    }
}
