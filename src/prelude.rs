pub use crate::{
    cluster::{JetAlgorithm, JetDefinition, JetProducer},
    collection::{ByLabel, CollectionLabel, CollectionProvider},
    config::Config,
    event::{Event, EventBuilder, Jet},
    four_vector::FourVector,
    histogram::Histogram,
    reader::{make_reader, CombinedReader, FileReader},
    report::Report,
    scan::{DijetMass, DijetMassScanner, MissingPolicy, ScanItem},
    traits::{Produce, Rewind},
};
