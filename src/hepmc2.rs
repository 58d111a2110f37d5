use std::{
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use audec::auto_decompress;
use log::trace;
use noisy_float::prelude::*;
use particle_id::ParticleID;
use thiserror::Error;

use crate::{
    event::{Event, EventBuilder},
    parsing::{any_entry, double_entry, i32_entry},
    traits::Rewind,
};

/// Reader for a single (potentially compressed) HepMC2 event file
///
/// Only outgoing particles are kept. They end up in
/// [Event::outgoing]; the event record itself carries no jet
/// collections.
pub struct FileReader {
    source_path: PathBuf,
    source: Box<dyn BufRead>,
    next_header: Option<String>,
}

impl FileReader {
    /// Construct a reader for the given (potentially compressed) HepMC2 event file
    pub fn new(source_path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let source_path = source_path.as_ref().to_owned();
        let source = init_source(&source_path)?;
        Ok(Self {
            source_path,
            source,
            next_header: None,
        })
    }

    fn read_record(&mut self) -> Option<Result<String, HepMCError>> {
        let mut record = match self.next_header.take() {
            Some(header) => header,
            None => match self.find_first_header() {
                Ok(Some(header)) => header,
                Ok(None) => return None,
                Err(err) => return Some(Err(err.into())),
            },
        };
        loop {
            let mut line = String::new();
            match self.source.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if line.starts_with('E') {
                        self.next_header = Some(line);
                        break;
                    }
                    record.push_str(&line);
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
        trace!("Read HepMC record:\n{record}");
        Some(Ok(record))
    }

    // skip file header up to the start of the first event
    fn find_first_header(&mut self) -> Result<Option<String>, std::io::Error> {
        loop {
            let mut line = String::new();
            if self.source.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if line.starts_with('E') {
                return Ok(Some(line));
            }
        }
    }
}

fn init_source(
    source: impl AsRef<Path>,
) -> Result<Box<dyn BufRead>, std::io::Error> {
    let source = std::fs::File::open(source)?;
    Ok(auto_decompress(BufReader::new(source)))
}

impl Rewind for FileReader {
    type Error = std::io::Error;

    fn rewind(&mut self) -> Result<(), Self::Error> {
        self.source = init_source(&self.source_path)?;
        self.next_header = None;
        Ok(())
    }
}

impl Iterator for FileReader {
    type Item = Result<Event, HepMCError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record()
            .map(|record| record.and_then(|r| parse_record(&r)))
    }
}

/// Error reading a HepMC event record
#[derive(Debug, Error)]
pub enum HepMCError {
    /// Parse error
    #[error("Error parsing line in event record: {0}")]
    ParseError(String),
    /// Invalid start of record
    #[error("Record does not start with 'E': {0}")]
    BadRecordStart(String),
    /// Unrecognized entry
    #[error("Line does not correspond to a known entry type: {0}")]
    BadEntry(String),
    /// Momentum component is infinite or not a number
    #[error("Non-finite momentum in particle entry: {0}")]
    NonFinite(String),
    /// I/O error
    #[error("I/O error")]
    IOError(#[from] std::io::Error),
    /// Invalid energy unit
    #[error("Invalid energy unit: {0}")]
    InvalidEnergyUnit(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for HepMCError {
    fn from(source: nom::Err<nom::error::Error<&str>>) -> Self {
        Self::ParseError(source.to_string())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum EnergyUnit {
    MeV,
    #[default]
    GeV,
}

/// Parse a single HepMC2 event record
pub fn parse_record(record: &str) -> Result<Event, HepMCError> {
    if !record.starts_with('E') {
        return Err(HepMCError::BadRecordStart(record.to_owned()));
    }
    let mut event = EventBuilder::new();
    let mut energy_unit = EnergyUnit::GeV;
    for line in record.lines().skip(1) {
        match line.as_bytes().first() {
            Some(b'V') | Some(b'F') | Some(b'H') | Some(b'C') | Some(b'N') => {}
            Some(b'P') => parse_particle_line(line, &mut event)?,
            Some(b'U') => energy_unit = parse_units_line(line)?,
            _ => {
                if !line.trim().is_empty() {
                    return Err(HepMCError::BadEntry(line.to_owned()));
                }
            }
        }
    }
    if energy_unit == EnergyUnit::MeV {
        event.rescale_energies(n64(1e-3));
    }
    Ok(event.build())
}

fn parse_units_line(line: &str) -> Result<EnergyUnit, HepMCError> {
    debug_assert!(line.starts_with('U'));
    let (_, energy) = any_entry(&line[1..])?;
    match energy {
        "GEV" => Ok(EnergyUnit::GeV),
        "MEV" => Ok(EnergyUnit::MeV),
        _ => Err(HepMCError::InvalidEnergyUnit(energy.to_owned())),
    }
}

fn parse_particle_line(
    line: &str,
    event: &mut EventBuilder,
) -> Result<(), HepMCError> {
    const HEPMC_OUTGOING: i32 = 1;

    debug_assert!(line.starts_with('P'));
    let (rest, _barcode) = any_entry(&line[1..])?;
    let (rest, id) = i32_entry(rest)?;
    let (rest, px) = double_entry(rest)?;
    let (rest, py) = double_entry(rest)?;
    let (rest, pz) = double_entry(rest)?;
    let (rest, e) = double_entry(rest)?;
    let (rest, _m) = any_entry(rest)?;
    let (_, status) = i32_entry(rest)?;
    if status != HEPMC_OUTGOING {
        return Ok(());
    }
    if ![e, px, py, pz].iter().all(|p| p.is_finite()) {
        return Err(HepMCError::NonFinite(line.to_owned()));
    }
    event.add_outgoing(
        ParticleID::new(id),
        [n64(e), n64(px), n64(py), n64(pz)].into(),
    );
    Ok(())
}
