use std::{
    io::BufReader,
    path::{Path, PathBuf},
};

use audec::auto_decompress;
use log::trace;
use noisy_float::prelude::*;
use particle_id::ParticleID;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    collection::CollectionLabel,
    event::{Event, EventBuilder, Jet},
    four_vector::FourVector,
    traits::Rewind,
};

/// Event record as stored in a YAML document
///
/// Momenta are given as `[E, px, py, pz]`.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EventRecord {
    #[serde(default)]
    pub collections: Vec<CollectionRecord>,
    #[serde(default)]
    pub particles: Vec<ParticleRecord>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CollectionRecord {
    pub label: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub jets: Vec<[f64; 4]>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParticleRecord {
    pub id: i32,
    pub p: [f64; 4],
}

/// Error reading a YAML event record
#[derive(Debug, Error)]
pub enum YamlError {
    #[error("Failed to deserialise event record: {0}")]
    Deserialize(#[from] serde_yaml::Error),
    #[error("Jet collection without label")]
    EmptyLabel,
    #[error("Non-finite momentum {0:?}")]
    NonFinite([f64; 4]),
}

fn four_vector(p: [f64; 4]) -> Result<FourVector, YamlError> {
    if !p.iter().all(|p| p.is_finite()) {
        return Err(YamlError::NonFinite(p));
    }
    Ok([n64(p[0]), n64(p[1]), n64(p[2]), n64(p[3])].into())
}

impl TryFrom<EventRecord> for Event {
    type Error = YamlError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let mut event = EventBuilder::with_capacity(record.particles.len());
        for particle in record.particles {
            event.add_outgoing(
                ParticleID::new(particle.id),
                four_vector(particle.p)?,
            );
        }
        for collection in record.collections {
            if collection.label.is_empty() {
                return Err(YamlError::EmptyLabel);
            }
            let label = CollectionLabel::new(
                collection.label,
                collection.instance,
                collection.process,
            );
            let jets: Result<Vec<_>, _> = collection
                .jets
                .into_iter()
                .map(|p| four_vector(p).map(Jet::from))
                .collect();
            event.add_collection(label, jets?);
        }
        Ok(event.build())
    }
}

/// Reader for a (potentially compressed) stream of YAML documents,
/// one per event
pub struct FileReader {
    source_path: PathBuf,
    documents: serde_yaml::Deserializer<'static>,
}

impl FileReader {
    pub fn new(source_path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let source_path = source_path.as_ref().to_owned();
        let documents = init_source(&source_path)?;
        Ok(Self {
            source_path,
            documents,
        })
    }
}

fn init_source(
    source: impl AsRef<Path>,
) -> Result<serde_yaml::Deserializer<'static>, std::io::Error> {
    let source = std::fs::File::open(source)?;
    let source = auto_decompress(BufReader::new(source));
    Ok(serde_yaml::Deserializer::from_reader(source))
}

impl Rewind for FileReader {
    type Error = std::io::Error;

    fn rewind(&mut self) -> Result<(), Self::Error> {
        self.documents = init_source(&self.source_path)?;
        Ok(())
    }
}

impl Iterator for FileReader {
    type Item = Result<Event, YamlError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let document = self.documents.next()?;
            // empty documents, e.g. after a trailing `---`, are no events
            let record = match Option::<EventRecord>::deserialize(document) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    trace!("Skipping empty YAML document");
                    continue;
                }
                Err(err) => return Some(Err(err.into())),
            };
            trace!("Read YAML record: {record:?}");
            return Some(Event::try_from(record));
        }
    }
}
