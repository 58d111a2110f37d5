use std::ops::Range;

use itertools::{Itertools, Product};
use log::{debug, warn};
use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::{
    collection::{CollectionLabel, CollectionProvider},
    event::Event,
    four_vector::FourVector,
};

/// What to do with events that lack the requested jet collection
#[derive(
    Deserialize,
    Serialize,
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    EnumString,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MissingPolicy {
    /// Stop the scan with an error
    #[default]
    Abort,
    /// Log a warning and continue with the next event
    Skip,
}

/// Invariant mass of a pair of jets from the same event
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DijetMass {
    /// Index of the event in the scanned stream
    pub event: usize,
    /// Index of the first jet
    pub a: usize,
    /// Index of the second jet
    pub b: usize,
    pub mass: N64,
}

/// Output of a scan
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanItem {
    /// Start of the event with the given index
    Event(usize),
    /// A dijet mass belonging to the last announced event
    Mass(DijetMass),
}

#[derive(Debug, Error)]
pub enum ScanError<E> {
    #[error("Failed to read event: {0}")]
    DataSource(E),
    #[error("Event {event}: no jet collection matching `{label}`")]
    MissingCollection { event: usize, label: CollectionLabel },
}

/// Bookkeeping of a running scan
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanStats {
    /// Number of events with the requested jet collection
    pub events: usize,
    /// Number of events skipped due to a missing jet collection
    pub skipped: usize,
    /// Number of dijet masses
    pub masses: usize,
    /// Number of jet pairs with negative invariant mass square or
    /// a momentum sum outside the floating-point range
    pub degenerate: usize,
}

/// Scan events for the invariant masses of all jet pairs
///
/// For an event with `N` jets, the masses of all `N²` ordered pairs
/// `(a, b)` are produced, including `a == b`, with `b` running
/// fastest.
#[derive(Clone, Debug)]
pub struct DijetMassScanner<P> {
    provider: P,
    label: CollectionLabel,
    on_missing: MissingPolicy,
}

impl<P: CollectionProvider> DijetMassScanner<P> {
    /// Scanner for the jet collection with the given label
    pub fn new(provider: P, label: CollectionLabel) -> Self {
        Self {
            provider,
            label,
            on_missing: MissingPolicy::default(),
        }
    }

    /// Set the policy for events without matching jet collection
    pub fn on_missing(mut self, policy: MissingPolicy) -> Self {
        self.on_missing = policy;
        self
    }

    pub fn label(&self) -> &CollectionLabel {
        &self.label
    }

    /// Lazily scan the given events
    pub fn scan<I, E>(&self, events: I) -> Scan<'_, P, I::IntoIter>
    where
        I: IntoIterator<Item = Result<Event, E>>,
    {
        Scan {
            scanner: self,
            events: events.into_iter(),
            next_event: 0,
            current: None,
            stats: ScanStats::default(),
            done: false,
        }
    }
}

struct Pairs {
    event: usize,
    jets: Vec<FourVector>,
    indices: Product<Range<usize>, Range<usize>>,
}

impl Pairs {
    fn new(event: usize, jets: Vec<FourVector>) -> Self {
        let n = jets.len();
        Self {
            event,
            jets,
            indices: (0..n).cartesian_product(0..n),
        }
    }
}

/// Iterator over the output of a [DijetMassScanner]
///
/// After the first error, the iterator is exhausted.
pub struct Scan<'a, P, I> {
    scanner: &'a DijetMassScanner<P>,
    events: I,
    next_event: usize,
    current: Option<Pairs>,
    stats: ScanStats,
    done: bool,
}

impl<'a, P, I> Scan<'a, P, I> {
    /// Statistics for the events scanned so far
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    fn next_mass(&mut self) -> Option<DijetMass> {
        let pairs = self.current.as_mut()?;
        let Some((a, b)) = pairs.indices.next() else {
            self.current = None;
            return None;
        };
        let p = pairs.jets[a] + pairs.jets[b];
        let mass = if !p.is_finite() {
            debug!(
                "Event {}: momentum sum of jets {a}, {b} exceeds floating-point range, setting mass to zero",
                pairs.event
            );
            self.stats.degenerate += 1;
            n64(0.)
        } else {
            if p.is_spacelike() {
                debug!(
                    "Event {}: negative invariant mass square {} for jets {a}, {b}, setting mass to zero",
                    pairs.event,
                    p.m_sq()
                );
                self.stats.degenerate += 1;
            }
            p.m()
        };
        self.stats.masses += 1;
        Some(DijetMass {
            event: pairs.event,
            a,
            b,
            mass,
        })
    }
}

impl<'a, P, I, E> Iterator for Scan<'a, P, I>
where
    P: CollectionProvider,
    I: Iterator<Item = Result<Event, E>>,
{
    type Item = Result<ScanItem, ScanError<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(mass) = self.next_mass() {
            return Some(Ok(ScanItem::Mass(mass)));
        }
        while !self.done {
            let event = match self.events.next() {
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(ScanError::DataSource(err)));
                }
                None => {
                    self.done = true;
                    if self.stats.degenerate > 0 {
                        warn!(
                            "Set invariant mass to zero for {} jet pairs with negative invariant mass square",
                            self.stats.degenerate
                        );
                    }
                    return None;
                }
            };
            let idx = self.next_event;
            self.next_event += 1;
            let label = &self.scanner.label;
            match self.scanner.provider.jets(&event, label) {
                Ok(jets) => {
                    let jets = jets.iter().map(|jet| *jet.p4()).collect();
                    self.current = Some(Pairs::new(idx, jets));
                    self.stats.events += 1;
                    return Some(Ok(ScanItem::Event(idx)));
                }
                Err(missing) => match self.scanner.on_missing {
                    MissingPolicy::Abort => {
                        self.done = true;
                        return Some(Err(ScanError::MissingCollection {
                            event: idx,
                            label: missing.label,
                        }));
                    }
                    MissingPolicy::Skip => {
                        warn!("Skipping event {idx}: {missing}");
                        self.stats.skipped += 1;
                    }
                },
            }
        }
        None
    }
}

impl<'a, P, I, E> std::iter::FusedIterator for Scan<'a, P, I>
where
    P: CollectionProvider,
    I: Iterator<Item = Result<Event, E>>,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use crate::collection::ByLabel;
    use crate::event::{EventBuilder, Jet};

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn p(px: f64, py: f64, pz: f64, e: f64) -> FourVector {
        [n64(e), n64(px), n64(py), n64(pz)].into()
    }

    fn label() -> CollectionLabel {
        CollectionLabel::new("skimmedPatJets", "", "TstarBaseLine")
    }

    fn event(jets: &[FourVector]) -> Event {
        let mut ev = EventBuilder::new();
        let jets: Vec<_> = jets.iter().copied().map(Jet::from).collect();
        ev.add_collection(label(), jets);
        ev.build()
    }

    fn ok(events: Vec<Event>) -> Vec<Result<Event, Infallible>> {
        events.into_iter().map(Ok).collect()
    }

    fn scanner() -> DijetMassScanner<ByLabel> {
        DijetMassScanner::new(ByLabel::new(), label())
    }

    fn masses(items: &[ScanItem]) -> Vec<(usize, usize, usize, f64)> {
        items
            .iter()
            .filter_map(|item| match item {
                ScanItem::Mass(m) => Some((m.event, m.a, m.b, m.mass.raw())),
                ScanItem::Event(_) => None,
            })
            .collect()
    }

    #[test]
    fn two_jets() {
        log_init();

        let j0 = p(0., 0., 0., 10.);
        let j1 = p(3., 4., 0., 10.);
        let scanner = scanner();
        let items: Vec<_> = scanner
            .scan(ok(vec![event(&[j0, j1])]))
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], ScanItem::Event(0));
        let masses = masses(&items);
        let expected = [
            (0, 0, 0, 20.),
            (0, 0, 1, 375f64.sqrt()),
            (0, 1, 0, 375f64.sqrt()),
            (0, 1, 1, 300f64.sqrt()),
        ];
        for (m, e) in masses.iter().zip(expected.iter()) {
            assert_eq!((m.0, m.1, m.2), (e.0, e.1, e.2));
            assert!((m.3 - e.3).abs() < 1e-12);
        }
    }

    #[test]
    fn pair_count() {
        log_init();

        let jets: Vec<_> = (1..=5)
            .map(|i| p(i as f64, 0., 1., 10. * i as f64))
            .collect();
        let events = (0..=5).map(|n| event(&jets[..n])).collect();
        let scanner = scanner();
        let mut scan = scanner.scan(ok(events));
        let items: Vec<_> = (&mut scan).map(|item| item.unwrap()).collect();

        let mut expected_event = 0;
        let mut count = 0;
        for item in &items {
            match item {
                ScanItem::Event(idx) => {
                    if *idx > 0 {
                        assert_eq!(count, (*idx - 1) * (*idx - 1));
                    }
                    assert_eq!(*idx, expected_event);
                    expected_event += 1;
                    count = 0;
                }
                ScanItem::Mass(m) => {
                    assert_eq!(m.event, expected_event - 1);
                    count += 1;
                }
            }
        }
        assert_eq!(count, 25);
        assert_eq!(
            scan.stats(),
            &ScanStats {
                events: 6,
                skipped: 0,
                masses: 55,
                degenerate: 0
            }
        );
    }

    #[test]
    fn no_jets() {
        let scanner = scanner();
        let items: Vec<_> = scanner
            .scan(ok(vec![event(&[]), event(&[]), Event::new()]))
            .take(2)
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(items, [ScanItem::Event(0), ScanItem::Event(1)]);
    }

    #[test]
    fn self_pairs() {
        let jets = [p(1., 2., 3., 7.), p(0., -1., 2., 40.)];
        let scanner = scanner();
        let items: Vec<_> = scanner
            .scan(ok(vec![event(&jets)]))
            .map(|item| item.unwrap())
            .collect();
        let masses = masses(&items);
        for (a, jet) in jets.iter().enumerate() {
            let (_, _, _, m) = masses[a * jets.len() + a];
            assert!((m - 2. * jet.m().raw()).abs() < 1e-12);
        }
    }

    #[test]
    fn abort_on_missing() {
        log_init();

        let j0 = p(0., 0., 0., 10.);
        let events = ok(vec![event(&[j0]), Event::new(), event(&[j0, j0])]);
        let scanner = scanner();
        let mut scan = scanner.scan(events);
        assert_eq!(scan.next().unwrap().unwrap(), ScanItem::Event(0));
        assert!(matches!(scan.next(), Some(Ok(ScanItem::Mass(_)))));
        let err = scan.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            ScanError::MissingCollection { event: 1, .. }
        ));
        assert!(scan.next().is_none());
        assert!(scan.next().is_none());
        assert_eq!(scan.stats().events, 1);
    }

    #[test]
    fn skip_missing() {
        log_init();

        let j0 = p(0., 0., 0., 10.);
        let events = ok(vec![event(&[j0]), Event::new(), event(&[j0, j0])]);
        let scanner = scanner().on_missing(MissingPolicy::Skip);
        let mut scan = scanner.scan(events);
        let markers: Vec<_> = (&mut scan)
            .map(|item| item.unwrap())
            .filter(|item| matches!(item, ScanItem::Event(_)))
            .collect();
        assert_eq!(markers, [ScanItem::Event(0), ScanItem::Event(2)]);
        assert_eq!(scan.stats().skipped, 1);
        assert_eq!(scan.stats().masses, 5);
    }

    #[test]
    fn data_source_error() {
        let events =
            vec![Ok(event(&[p(0., 0., 0., 1.)])), Err("broken"), Ok(Event::new())];
        let scanner = scanner();
        let items: Vec<_> = scanner.scan(events).collect();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[2], Err(ScanError::DataSource("broken"))));
    }

    #[test]
    fn degenerate() {
        log_init();

        // spacelike "jets" with negative mass square
        let jets = [p(3., 4., 0., 1.), p(0., 0., 0., 1.)];
        let scanner = scanner();
        let mut scan = scanner.scan(ok(vec![event(&jets)]));
        let items: Vec<_> = (&mut scan).map(|item| item.unwrap()).collect();
        let masses = masses(&items);
        assert_eq!(masses[0].3, 0.);
        assert_eq!(masses[3].3, 2.);
        assert_eq!(scan.stats().degenerate, 3);
    }

    #[test]
    fn large_momenta() {
        log_init();

        let jets = [p(1e200, 0., 0., 1e200), p(0., 0., 0., 1e200)];
        let scanner = scanner();
        let mut scan = scanner.scan(ok(vec![event(&jets)]));
        let items: Vec<_> = (&mut scan).map(|item| item.unwrap()).collect();
        let masses = masses(&items);
        assert_eq!(masses.len(), 4);
        assert!(masses.iter().all(|m| m.3.is_finite()));
        assert_eq!(masses[0].3, 0.);
        let expected = 2e200 * 0.75f64.sqrt();
        assert!(((masses[1].3 - expected) / expected).abs() < 1e-12);
        assert_eq!(masses[3].3, 2e200);
        assert_eq!(scan.stats().degenerate, 0);

        let huge = [p(0., 0., 0., f64::MAX)];
        let mut scan = scanner.scan(ok(vec![event(&huge)]));
        let items: Vec<_> = (&mut scan).map(|item| item.unwrap()).collect();
        assert_eq!(self::masses(&items)[0].3, 0.);
        assert_eq!(scan.stats().degenerate, 1);
    }

    #[test]
    fn policy_names() {
        assert_eq!("skip".parse::<MissingPolicy>().unwrap(), MissingPolicy::Skip);
        assert_eq!(MissingPolicy::Abort.to_string(), "abort");
    }
}
