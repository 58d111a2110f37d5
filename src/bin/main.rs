mod opt;

use std::{
    fs::File,
    io::{stdout, BufWriter, Write},
};

use crate::opt::Opt;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dijets::{
    compression::{compress_writer, Compression},
    config::Config,
    prelude::*,
    GIT_BRANCH, GIT_REV, VERSION,
};
use env_logger::Env;
use log::{debug, info};

fn main() -> Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")?;
    let opt = Opt::parse_from(args);

    let env = Env::default().filter_or("DIJETS_LOG", &opt.loglevel);
    env_logger::init_from_env(env);

    if let (Some(rev), Some(branch)) = (GIT_REV, GIT_BRANCH) {
        info!("dijets {VERSION} rev {rev} ({branch})");
    } else {
        info!("dijets {VERSION}");
    }

    let (config, compression) = load_config(opt)?;
    debug!("settings: {:#?}", config);
    run(config, compression)?;
    info!("done");
    Ok(())
}

fn load_config(mut opt: Opt) -> Result<(Config, Option<Compression>)> {
    let mut config = match Config::locate(opt.config.take()) {
        Some(path) => Config::load(&path)?,
        None => {
            debug!("No configuration file found, using defaults");
            Config::default()
        }
    };
    opt.apply(&mut config);
    Ok((config, opt.compression))
}

fn run(config: Config, compression: Option<Compression>) -> Result<()> {
    if config.infiles.is_empty() {
        bail!("No input files given");
    }
    let reader = CombinedReader::from_files(&config.infiles, config.format)?;

    let producers = config.jet_producers()?;
    for producer in &producers {
        info!(
            "Adding jet collection `{}` ({:?}, R = {})",
            producer.label(),
            producer.jet_def().algorithm,
            producer.jet_def().radius
        );
    }
    let events = reader.map(|ev| {
        ev.map(|mut ev| {
            producers.produce(&mut ev);
            ev
        })
    });

    let out: Box<dyn Write> = match &config.outfile {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {path:?}"))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(stdout().lock()),
    };
    let out = compress_writer(out, compression)?;
    let mut report = Report::new(out);
    if let Some(settings) = config.histogram {
        report = report.with_histogram(Histogram::try_from(settings)?);
    }

    let scanner = DijetMassScanner::new(ByLabel::new(), config.collection())
        .on_missing(config.on_missing);
    info!("Scanning jet collection `{}`", scanner.label());
    let mut scan = scanner.scan(events);
    let res = report.write_scan(&mut scan);
    let stats = *scan.stats();
    info!(
        "Scanned {} events, skipped {}, found {} dijet masses",
        stats.events, stats.skipped, stats.masses
    );
    res.context("Dijet mass scan failed")?;

    let (_, histogram) = report.into_inner();
    if let Some(histogram) = histogram {
        log_histogram(&histogram);
    }
    Ok(())
}

fn log_histogram(histogram: &Histogram) {
    info!("Dijet mass histogram with {} entries", histogram.entries());
    let (min, max) = histogram.range();
    info!("(-inf, {min}): {}", histogram.underflow());
    for ((lo, hi), n) in histogram.edges().zip(histogram.bins()) {
        info!("[{lo}, {hi}): {n}");
    }
    info!("[{max}, inf): {}", histogram.overflow());
}
