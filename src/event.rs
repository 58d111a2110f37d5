use crate::collection::CollectionLabel;
use crate::four_vector::FourVector;

use std::convert::From;
use std::default::Default;

use noisy_float::prelude::*;
use particle_id::ParticleID;

/// A reconstructed jet
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default)]
pub struct Jet {
    p: FourVector,
}

impl Jet {
    /// The jet four-momentum
    pub fn p4(&self) -> &FourVector {
        &self.p
    }
}

impl From<FourVector> for Jet {
    fn from(p: FourVector) -> Self {
        Self { p }
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct EventBuilder {
    outgoing: Vec<(ParticleID, FourVector)>,
    collections: Vec<(CollectionLabel, Box<[Jet]>)>,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            outgoing: Vec::with_capacity(cap),
            collections: Vec::new(),
        }
    }

    pub fn add_outgoing(&mut self, pid: ParticleID, p: FourVector) -> &mut Self {
        self.outgoing.push((pid, p));
        self
    }

    pub fn add_collection(
        &mut self,
        label: CollectionLabel,
        jets: impl Into<Box<[Jet]>>,
    ) -> &mut Self {
        self.collections.push((label, jets.into()));
        self
    }

    /// Multiply all momenta by the given factor
    pub fn rescale_energies(&mut self, scale: N64) {
        for (_, p) in &mut self.outgoing {
            *p *= scale;
        }
        for (_, jets) in &mut self.collections {
            for jet in jets.iter_mut() {
                jet.p *= scale;
            }
        }
    }

    pub fn build(self) -> Event {
        Event {
            outgoing: self.outgoing,
            collections: self.collections,
        }
    }
}

impl From<EventBuilder> for Event {
    fn from(b: EventBuilder) -> Self {
        b.build()
    }
}

/// A collision event
///
/// Holds the outgoing particles as found in the event record and
/// any number of labelled jet collections. Collections are kept in
/// the order in which they were added.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Event {
    outgoing: Vec<(ParticleID, FourVector)>,
    collections: Vec<(CollectionLabel, Box<[Jet]>)>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outgoing particles with their particle ids
    pub fn outgoing(&self) -> &[(ParticleID, FourVector)] {
        self.outgoing.as_slice()
    }

    /// All jet collections with their labels
    pub fn collections(&self) -> &[(CollectionLabel, Box<[Jet]>)] {
        self.collections.as_slice()
    }

    /// Store an additional jet collection
    pub fn add_collection(
        &mut self,
        label: CollectionLabel,
        jets: impl Into<Box<[Jet]>>,
    ) {
        self.collections.push((label, jets.into()));
    }
}
