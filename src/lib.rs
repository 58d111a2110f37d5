//! `dijets` scans collision events for the invariant masses of all
//! pairs of jets.
//!
//! # How to use
//!
//! ```no_run
//! use dijets::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let events = CombinedReader::from_files(["events.hepmc2.gz"], None)?;
//! let label: CollectionLabel = "skimmedPatJets::TstarBaseLine".parse()?;
//! let scanner = DijetMassScanner::new(ByLabel::new(), label);
//! let mut report = Report::new(std::io::stdout());
//! report.write_scan(scanner.scan(events))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Most relevant modules
//!
//! - [prelude] exports a list of the most relevant classes and objects
//! - [scan] contains the scanner computing the dijet masses
//! - [reader] defines readers from one or more event files
//! - [collection] for looking up jet collections in events
//! - [cluster] for adding clustered jet collections to events
//! - [report] for the text output
//!

/// Jet clustering
pub mod cluster;
/// Jet collections and their lookup
pub mod collection;
/// Output compression
pub mod compression;
pub mod config;
/// Scattering event class
pub mod event;
/// Event file formats
pub mod formats;
/// Four-vector class
pub mod four_vector;
/// HepMC2 interface
pub mod hepmc2;
/// Histograms of dijet masses
pub mod histogram;
/// Most important exports
pub mod prelude;
/// Event readers
pub mod reader;
/// Text report
pub mod report;
/// Dijet mass scanner
pub mod scan;
/// Common traits
pub mod traits;
/// YAML event interface
pub mod yaml;

mod parsing;
mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
