use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dijets::{
    cluster::JetAlgorithm,
    collection::CollectionLabel,
    compression::Compression,
    config::{Config, ProducerConfig, DEFAULT_COLLECTION},
    scan::MissingPolicy,
};
use lazy_static::lazy_static;
use regex::Regex;
use strum::{Display, EnumString};
use thiserror::Error;

const GZIP_DEFAULT_LEVEL: u8 = 6;
const LZ4_DEFAULT_LEVEL: u8 = 0;
const ZSTD_DEFAULT_LEVEL: u8 = 0;

lazy_static! {
    static ref COMPRESSION_RE: Regex =
        Regex::new(r"^(?P<algo>[[:alnum:]]+)(?P<lvl>_\d+)?$").unwrap();
}

pub(crate) fn parse_compr(s: &str) -> Result<Compression, ParseCompressionErr> {
    use Compression::*;
    use ParseCompressionErr::*;

    let lower_case = s.to_ascii_lowercase();
    let Some(captures) = COMPRESSION_RE.captures(&lower_case) else {
        return Err(UnknownAlgorithm(s.to_owned()));
    };
    let algo = &captures["algo"];
    let lvl = captures.name("lvl").map(|lvl| lvl.as_str());
    let parse_lvl = |lvl: &str, max: u8| match lvl[1..].parse::<u8>() {
        Ok(l) if l <= max => Ok(l),
        _ => Err(UnsupportedLevel(lvl.to_owned(), algo.to_owned())),
    };
    match (algo, lvl) {
        ("bzip2" | "bz2", None) => Ok(Bzip2),
        ("bzip2" | "bz2", Some(lvl)) => {
            Err(UnsupportedLevel(lvl.to_owned(), algo.to_owned()))
        }
        ("gzip" | "gz", None) => Ok(Gzip(GZIP_DEFAULT_LEVEL)),
        ("gzip" | "gz", Some(lvl)) => parse_lvl(lvl, 9).map(Gzip),
        ("lz4", None) => Ok(Lz4(LZ4_DEFAULT_LEVEL)),
        ("lz4", Some(lvl)) => parse_lvl(lvl, 16).map(Lz4),
        ("zstd" | "zstandard", None) => Ok(Zstd(ZSTD_DEFAULT_LEVEL)),
        ("zstd" | "zstandard", Some(lvl)) => parse_lvl(lvl, 19).map(Zstd),
        _ => Err(UnknownAlgorithm(s.to_owned())),
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum ParseCompressionErr {
    #[error("Unknown compression algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Level {0} not supported for {1} compression")]
    UnsupportedLevel(String, String),
}

#[derive(Debug, Display, Copy, Clone, ValueEnum, EnumString)]
#[clap(rename_all = "lower")]
pub(crate) enum FileFormat {
    HepMC2,
    Yaml,
}

impl From<FileFormat> for dijets::formats::FileFormat {
    fn from(source: FileFormat) -> Self {
        match source {
            FileFormat::HepMC2 => Self::HepMC2,
            FileFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Debug, Display, Copy, Clone, ValueEnum, EnumString)]
#[clap(rename_all = "lower")]
pub(crate) enum OnMissing {
    /// Stop with an error
    Abort,
    /// Skip the event with a warning
    Skip,
}

impl From<OnMissing> for MissingPolicy {
    fn from(source: OnMissing) -> Self {
        match source {
            OnMissing::Abort => Self::Abort,
            OnMissing::Skip => Self::Skip,
        }
    }
}

#[derive(Debug, Copy, Clone, Parser)]
pub(crate) struct JetDefinition {
    /// Jet algorithm.
    #[clap(
        short = 'a',
        long,
        requires = "jetradius",
        help = "Cluster outgoing partons into a new jet collection.\nPossible settings are 'anti-kt', 'kt', 'Cambridge-Aachen'."
    )]
    pub jetalgorithm: Option<JetAlgorithm>,
    /// Jet radius parameter.
    #[clap(short = 'R', long, requires = "jetalgorithm")]
    pub jetradius: Option<f64>,
    /// Minimum jet transverse momentum in GeV.
    #[clap(short = 'p', long, default_value = "0.")]
    pub jetpt: f64,
}

impl JetDefinition {
    /// Producer adding the clustered jets as the default collection
    pub(crate) fn to_producer_config(self) -> Option<ProducerConfig> {
        let (Some(algorithm), Some(radius)) = (self.jetalgorithm, self.jetradius)
        else {
            return None;
        };
        Some(ProducerConfig {
            label: DEFAULT_COLLECTION.to_owned(),
            instance: String::new(),
            algorithm,
            radius,
            min_pt: self.jetpt,
        })
    }
}

#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Configuration file.
    ///
    /// Defaults to 'dijets.yaml' in the working directory or
    /// 'dijets/config.yaml' in the user configuration directory.
    #[clap(short, long, value_parser)]
    pub(crate) config: Option<PathBuf>,

    /// Jet collection to scan, in the form 'label[:instance[:process]]'.
    #[clap(short = 'j', long)]
    pub(crate) collection: Option<CollectionLabel>,

    /// What to do with events without the requested jet collection.
    #[clap(value_enum, long)]
    pub(crate) on_missing: Option<OnMissing>,

    /// Input file format. Detected automatically if omitted.
    #[clap(value_enum, short, long)]
    pub(crate) format: Option<FileFormat>,

    #[clap(flatten)]
    pub(crate) jet_def: JetDefinition,

    /// Output file. Defaults to standard output.
    #[clap(long, short, value_parser)]
    pub(crate) outfile: Option<PathBuf>,

    #[clap(long, value_parser = parse_compr,
                help = "Compress output file.
Possible settings are 'bzip2', 'gzip', 'zstd', 'lz4'.
Compression levels can be set with algorithm_level e.g. 'zstd_5'.
Maximum levels are 'gzip_9', 'zstd_19', 'lz4_16'.")]
    pub(crate) compression: Option<Compression>,

    /// Verbosity level
    #[clap(
        short,
        long,
        default_value = "Info",
        help = "Verbosity level.
Possible values with increasing amount of output are
'off', 'error', 'warn', 'info', 'debug', 'trace'.\n"
    )]
    pub(crate) loglevel: String,

    /// Input files
    #[clap(name = "INFILES", value_parser)]
    pub(crate) infiles: Vec<PathBuf>,
}

impl Opt {
    /// Override the settings in `config` with the ones given on the
    /// command line
    pub(crate) fn apply(&mut self, config: &mut Config) {
        if !self.infiles.is_empty() {
            config.infiles = std::mem::take(&mut self.infiles);
        }
        if let Some(format) = self.format {
            config.format = Some(format.into());
        }
        if let Some(collection) = self.collection.take() {
            config.collection = Some(collection);
        }
        if let Some(on_missing) = self.on_missing {
            config.on_missing = on_missing.into();
        }
        if let Some(outfile) = self.outfile.take() {
            config.outfile = Some(outfile);
        }
        if let Some(producer) = self.jet_def.to_producer_config() {
            config.producers.push(producer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use dijets::{config::ConfigError, formats};

    #[test]
    fn compression() {
        assert_eq!(parse_compr("bzip2"), Ok(Compression::Bzip2));
        assert_eq!(parse_compr("GZ"), Ok(Compression::Gzip(GZIP_DEFAULT_LEVEL)));
        assert_eq!(parse_compr("zstd_5"), Ok(Compression::Zstd(5)));
        assert_eq!(parse_compr("lz4_16"), Ok(Compression::Lz4(16)));
        assert!(matches!(
            parse_compr("gzip_10"),
            Err(ParseCompressionErr::UnsupportedLevel(_, _))
        ));
        assert!(matches!(
            parse_compr("bz2_3"),
            Err(ParseCompressionErr::UnsupportedLevel(_, _))
        ));
        assert!(matches!(
            parse_compr("xz"),
            Err(ParseCompressionErr::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn args() {
        let opt = Opt::parse_from([
            "dijets",
            "-j",
            "skimmedPatJets::TstarBaseLine",
            "--on-missing",
            "skip",
            "-a",
            "anti-kt",
            "-R",
            "0.4",
            "events.hepmc2",
        ]);
        assert_eq!(
            opt.collection,
            Some(CollectionLabel::new("skimmedPatJets", "", "TstarBaseLine"))
        );
        assert!(matches!(opt.on_missing, Some(OnMissing::Skip)));
        let producer = opt.jet_def.to_producer_config().unwrap();
        assert_eq!(producer.algorithm, JetAlgorithm::AntiKt);
        assert_eq!(producer.label, DEFAULT_COLLECTION);
        assert_eq!(producer.min_pt, 0.);
        assert_eq!(opt.infiles, [PathBuf::from("events.hepmc2")]);
    }

    fn file_config() -> Config {
        Config {
            infiles: vec![PathBuf::from("file.yaml")],
            format: Some(formats::FileFormat::Yaml),
            collection: Some(CollectionLabel::new("skimmedPatJets", "", "")),
            on_missing: MissingPolicy::Skip,
            outfile: Some(PathBuf::from("file.out")),
            ..Default::default()
        }
    }

    #[test]
    fn command_line_overrides() {
        let mut opt = Opt::parse_from([
            "dijets",
            "--format",
            "hepmc2",
            "-j",
            "jets:akt4",
            "--on-missing",
            "abort",
            "-o",
            "cli.out",
            "cli.hepmc2",
        ]);
        let mut config = file_config();
        opt.apply(&mut config);
        assert_eq!(config.infiles, [PathBuf::from("cli.hepmc2")]);
        assert_eq!(config.format, Some(formats::FileFormat::HepMC2));
        assert_eq!(config.collection, Some(CollectionLabel::new("jets", "akt4", "")));
        assert_eq!(config.on_missing, MissingPolicy::Abort);
        assert_eq!(config.outfile, Some(PathBuf::from("cli.out")));
        assert!(config.producers.is_empty());
    }

    #[test]
    fn file_settings_survive() {
        let mut opt = Opt::parse_from(["dijets"]);
        let mut config = file_config();
        opt.apply(&mut config);
        assert_eq!(config, file_config());
    }

    #[test]
    fn command_line_producer() {
        let mut opt = Opt::parse_from(["dijets", "-a", "kt", "-R", "0.6", "-p", "25"]);
        let mut config = file_config();
        opt.apply(&mut config);
        let producers = config.jet_producers().unwrap();
        assert_eq!(producers.len(), 1);
        assert_eq!(
            producers[0].label(),
            &CollectionLabel::new(DEFAULT_COLLECTION, "", config.process())
        );
        assert_eq!(producers[0].jet_def().min_pt, 25.);

        let mut opt = Opt::parse_from(["dijets", "-a", "kt", "-R", "0"]);
        let mut config = Config::default();
        opt.apply(&mut config);
        assert!(matches!(
            config.jet_producers(),
            Err(ConfigError::InvalidRadius(_, _))
        ));
    }
}
