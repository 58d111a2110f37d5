use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use audec::auto_decompress;
use log::debug;
use thiserror::Error;

use crate::{
    event::Event,
    formats::FileFormat,
    hepmc2::HepMCError,
    traits::Rewind,
    util::trim_ascii_start,
    yaml::YamlError,
};

const HEPMC_HEADER: &[u8] = b"HepMC::";
const HEPMC_EVENT_START: &[u8] = b"E ";

/// Reader for a single event file
///
/// Use [make_reader] to construct it.
pub struct FileReader(Box<dyn EventFileReader>);

impl Rewind for FileReader {
    type Error = RewindError;

    fn rewind(&mut self) -> Result<(), Self::Error> {
        self.0.rewind()
    }
}

impl Iterator for FileReader {
    type Item = Result<Event, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

/// Returns an event reader for the file at `path`
///
/// If no `format` is given, it is determined from the (decompressed)
/// start of the file.
pub fn make_reader<P: AsRef<Path>>(
    path: P,
    format: Option<FileFormat>,
) -> Result<FileReader, CreateError> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => detect_format(path)?,
    };
    debug!("Read {path:?} as {format:?}");
    let open_err = |source| CreateError::Open {
        path: path.to_owned(),
        source,
    };
    let reader: Box<dyn EventFileReader> = match format {
        FileFormat::HepMC2 => {
            let reader =
                crate::hepmc2::FileReader::new(path).map_err(open_err)?;
            Box::new(Adapter(reader))
        }
        FileFormat::Yaml => {
            let reader = crate::yaml::FileReader::new(path).map_err(open_err)?;
            Box::new(Adapter(reader))
        }
    };
    Ok(FileReader(reader))
}

fn detect_format(path: &Path) -> Result<FileFormat, CreateError> {
    let file = File::open(path).map_err(|source| CreateError::Open {
        path: path.to_owned(),
        source,
    })?;
    let mut r = auto_decompress(BufReader::new(file));
    let bytes = r.fill_buf().map_err(|source| CreateError::Open {
        path: path.to_owned(),
        source,
    })?;
    let bytes = trim_ascii_start(bytes);
    if bytes.starts_with(HEPMC_HEADER) || bytes.starts_with(HEPMC_EVENT_START) {
        Ok(FileFormat::HepMC2)
    } else {
        Ok(FileFormat::Yaml)
    }
}

/// Failed to open an event source
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("Failed to open event file {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RewindError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Error reading HepMC record: {0}")]
    HepMCError(#[from] HepMCError),
    #[error("Error reading YAML record: {0}")]
    YamlError(#[from] YamlError),
}

/// Chain of readers for several event files
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CombinedReader<R> {
    readers: Vec<R>,
    current: usize,
}

impl<R> CombinedReader<R> {
    pub fn new(readers: Vec<R>) -> Self {
        Self {
            readers,
            current: 0,
        }
    }
}

impl<R: Rewind> Rewind for CombinedReader<R> {
    type Error = <R as Rewind>::Error;

    fn rewind(&mut self) -> Result<(), Self::Error> {
        let last = std::cmp::min(self.current + 1, self.readers.len());
        for reader in &mut self.readers[..last] {
            reader.rewind()?;
        }
        self.current = 0;
        Ok(())
    }
}

impl<R: Iterator> Iterator for CombinedReader<R> {
    type Item = <R as Iterator>::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.readers.get_mut(self.current)?.next();
            if next.is_some() {
                return next;
            }
            if self.current + 1 >= self.readers.len() {
                return None;
            }
            self.current += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.readers
            .get(self.current..)
            .unwrap_or_default()
            .iter()
            .map(|r| r.size_hint())
            .reduce(|(accmin, accmax), (min, max)| {
                let accmax = match (accmax, max) {
                    (Some(accmax), Some(max)) => Some(accmax + max),
                    _ => None,
                };
                (accmin + min, accmax)
            })
            .unwrap_or_default()
    }
}

impl CombinedReader<FileReader> {
    /// Construct a new reader reading from the files with the given names
    pub fn from_files<I, P>(
        files: I,
        format: Option<FileFormat>,
    ) -> Result<Self, CreateError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let readers: Result<_, _> = files
            .into_iter()
            .map(|f| make_reader(f, format))
            .collect();
        Ok(Self::new(readers?))
    }
}

pub trait EventFileReader:
    Iterator<Item = Result<Event, ReadError>> + Rewind<Error = RewindError>
{
}

// lifts a format-specific reader to the common error types
struct Adapter<R>(R);

impl<R, E> Iterator for Adapter<R>
where
    R: Iterator<Item = Result<Event, E>>,
    ReadError: From<E>,
{
    type Item = Result<Event, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|ev| ev.map_err(ReadError::from))
    }
}

impl<R> Rewind for Adapter<R>
where
    R: Rewind<Error = std::io::Error>,
{
    type Error = RewindError;

    fn rewind(&mut self) -> Result<(), Self::Error> {
        self.0.rewind().map_err(RewindError::from)
    }
}

impl<R, E> EventFileReader for Adapter<R>
where
    R: Iterator<Item = Result<Event, E>> + Rewind<Error = std::io::Error>,
    ReadError: From<E>,
{
}
