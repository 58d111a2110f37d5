use serde::{Deserialize, Serialize};

/// Supported event file formats
#[derive(
    Deserialize,
    Serialize,
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// HepMC2 format, also known as `IO_GenEvent`
    #[default]
    HepMC2,
    /// Stream of YAML documents with stored jet collections
    Yaml,
}
