use std::io::Write;

use thiserror::Error;

use crate::{
    histogram::Histogram,
    scan::{ScanError, ScanItem},
};

/// Line-oriented text report of dijet masses
///
/// Each event is announced with a line `At Event [i]`, followed by
/// one line `Dijet mass: m` per jet pair.
#[derive(Debug)]
pub struct Report<W> {
    out: W,
    histogram: Option<Histogram>,
}

#[derive(Debug, Error)]
pub enum ReportError<E> {
    #[error(transparent)]
    Scan(#[from] ScanError<E>),
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            histogram: None,
        }
    }

    /// Also fill all reported masses into the given histogram
    pub fn with_histogram(mut self, histogram: Histogram) -> Self {
        self.histogram = Some(histogram);
        self
    }

    pub fn histogram(&self) -> Option<&Histogram> {
        self.histogram.as_ref()
    }

    /// Write a single line for the given scan output
    pub fn write_item(&mut self, item: &ScanItem) -> std::io::Result<()> {
        match item {
            ScanItem::Event(idx) => writeln!(self.out, "At Event [{idx}]"),
            ScanItem::Mass(m) => {
                if let Some(histogram) = self.histogram.as_mut() {
                    histogram.fill(m.mass.raw());
                }
                writeln!(self.out, "Dijet mass: {}", m.mass)
            }
        }
    }

    /// Write the complete output of a scan
    ///
    /// Stops at the first error. Everything written up to that point
    /// is flushed to the output.
    pub fn write_scan<I, E>(&mut self, scan: I) -> Result<(), ReportError<E>>
    where
        I: IntoIterator<Item = Result<ScanItem, ScanError<E>>>,
    {
        for item in scan {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    self.out.flush()?;
                    return Err(err.into());
                }
            };
            self.write_item(&item)?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> (W, Option<Histogram>) {
        (self.out, self.histogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use noisy_float::prelude::*;

    use crate::{
        collection::{ByLabel, CollectionLabel},
        event::{Event, EventBuilder, Jet},
        four_vector::FourVector,
        scan::{DijetMass, DijetMassScanner},
    };

    fn p(px: f64, py: f64, pz: f64, e: f64) -> Jet {
        FourVector::from([n64(e), n64(px), n64(py), n64(pz)]).into()
    }

    fn label() -> CollectionLabel {
        CollectionLabel::new("skimmedPatJets", "", "TstarBaseLine")
    }

    fn event(jets: Vec<Jet>) -> Event {
        let mut ev = EventBuilder::new();
        ev.add_collection(label(), jets);
        ev.build()
    }

    fn events() -> Vec<Result<Event, Infallible>> {
        vec![
            Ok(event(vec![p(0., 0., 0., 10.), p(3., 4., 0., 10.)])),
            Ok(event(vec![])),
            Ok(event(vec![p(0., 0., 0., 1.5)])),
        ]
    }

    fn report(events: Vec<Result<Event, Infallible>>) -> String {
        let scanner = DijetMassScanner::new(ByLabel::new(), label());
        let mut report = Report::new(Vec::new());
        report.write_scan(scanner.scan(events)).unwrap();
        String::from_utf8(report.into_inner().0).unwrap()
    }

    #[test]
    fn lines() {
        let mut report = Report::new(Vec::new());
        report.write_item(&ScanItem::Event(3)).unwrap();
        report
            .write_item(&ScanItem::Mass(DijetMass {
                event: 3,
                a: 0,
                b: 0,
                mass: n64(91.5),
            }))
            .unwrap();
        let (out, histogram) = report.into_inner();
        assert!(histogram.is_none());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "At Event [3]\nDijet mass: 91.5\n"
        );
    }

    #[test]
    fn full_report() {
        let out = report(events());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3 + 4 + 1);
        assert_eq!(lines[0], "At Event [0]");
        assert_eq!(lines[1], "Dijet mass: 20");
        assert!(lines[2].starts_with("Dijet mass: 19.36"));
        assert_eq!(lines[2], lines[3]);
        assert!(lines[4].starts_with("Dijet mass: 17.32"));
        assert_eq!(lines[5], "At Event [1]");
        assert_eq!(lines[6], "At Event [2]");
        assert_eq!(lines[7], "Dijet mass: 3");
    }

    #[test]
    fn deterministic() {
        assert_eq!(report(events()), report(events()));
    }

    #[test]
    fn partial_output_on_error() {
        let events = vec![
            Ok(event(vec![p(0., 0., 0., 10.)])),
            Ok(Event::new()),
            Ok(event(vec![p(0., 0., 0., 10.)])),
        ];
        let scanner = DijetMassScanner::new(ByLabel::new(), label());
        let mut report = Report::new(Vec::new());
        let res = report.write_scan(scanner.scan(events));
        assert!(matches!(
            res,
            Err(ReportError::<Infallible>::Scan(
                ScanError::MissingCollection { event: 1, .. }
            ))
        ));
        let out = String::from_utf8(report.into_inner().0).unwrap();
        assert_eq!(out, "At Event [0]\nDijet mass: 20\n");
    }

    #[test]
    fn fill_histogram() {
        let scanner = DijetMassScanner::new(ByLabel::new(), label());
        let mut report = Report::new(std::io::sink())
            .with_histogram(Histogram::new(4, 0., 40.).unwrap());
        report.write_scan(scanner.scan(events())).unwrap();
        let histogram = report.histogram().unwrap();
        assert_eq!(histogram.entries(), 5);
        assert_eq!(histogram.bins(), &[1., 3., 1., 0.]);
    }
}
