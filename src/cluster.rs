use std::fmt::{self, Display};
use std::str::FromStr;

use jetty::{anti_kt_f, cambridge_aachen_f, cluster_if, kt_f, PseudoJet};
use log::trace;
use particle_id::{
    sm_elementary_particles::{bottom, gluon},
    ParticleID,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    collection::CollectionLabel,
    event::{Event, Jet},
    four_vector::FourVector,
    traits::Produce,
};

#[derive(Debug, Clone, Error)]
pub struct UnknownJetAlgorithm(String);

impl Display for UnknownJetAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown jet algorithm: {}", self.0)
    }
}

impl FromStr for JetAlgorithm {
    type Err = UnknownJetAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anti_kt" | "antikt" | "anti-kt" => Ok(Self::AntiKt),
            "kt" => Ok(Self::Kt),
            "Cambridge/Aachen" | "Cambridge-Aachen" | "Cambridge_Aachen"
            | "cambridge/aachen" | "cambridge-aachen" | "cambridge_aachen" => {
                Ok(Self::CambridgeAachen)
            }
            _ => Err(UnknownJetAlgorithm(s.to_string())),
        }
    }
}

/// Jet clustering algorithms
#[derive(Deserialize, Serialize, Debug, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum JetAlgorithm {
    /// The [anti-kt](https://arxiv.org/abs/0802.1189) algorithm
    AntiKt,
    /// The [Cambridge](https://arxiv.org/abs/hep-ph/9707323)/[Aachen](https://arxiv.org/abs/hep-ph/9907280) algorithm
    CambridgeAachen,
    /// The [kt](https://arxiv.org/abs/hep-ph/9305266) algorithm
    Kt,
}

#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq)]
pub struct JetDefinition {
    /// Jet algorithm
    pub algorithm: JetAlgorithm,
    /// Jet radius parameter
    pub radius: f64,
    /// Minimum jet transverse momentum
    pub min_pt: f64,
}

impl JetDefinition {
    pub fn cluster_partons(&self, partons: Vec<PseudoJet>) -> Vec<PseudoJet> {
        let minpt2 = self.min_pt * self.min_pt;
        let cut = |jet: PseudoJet| jet.pt2() > minpt2;
        let r = self.radius;
        match self.algorithm {
            JetAlgorithm::AntiKt => cluster_if(partons, &anti_kt_f(r), cut),
            JetAlgorithm::Kt => cluster_if(partons, &kt_f(r), cut),
            JetAlgorithm::CambridgeAachen => {
                cluster_if(partons, &cambridge_aachen_f(r), cut)
            }
        }
    }
}

pub(crate) fn is_parton(id: ParticleID) -> bool {
    id.id().abs() <= bottom.id() || id == gluon
}

/// Cluster the outgoing partons of an event into a new jet collection
///
/// Jets are stored in order of decreasing transverse momentum.
#[derive(Clone, Debug, PartialEq)]
pub struct JetProducer {
    label: CollectionLabel,
    jet_def: JetDefinition,
}

impl JetProducer {
    /// Construct a new producer adding jets under the given label
    pub fn new(label: CollectionLabel, jet_def: JetDefinition) -> Self {
        Self { label, jet_def }
    }

    pub fn label(&self) -> &CollectionLabel {
        &self.label
    }

    pub fn jet_def(&self) -> &JetDefinition {
        &self.jet_def
    }

    /// Cluster the outgoing partons of `event`
    pub fn cluster(&self, event: &Event) -> Vec<Jet> {
        let partons = event
            .outgoing()
            .iter()
            .filter(|(id, _)| is_parton(*id))
            .map(|(_, p)| PseudoJet::from(p))
            .collect();
        let mut jets: Vec<FourVector> = self
            .jet_def
            .cluster_partons(partons)
            .into_iter()
            .map(FourVector::from)
            .collect();
        jets.sort_by(|a, b| b.pt().cmp(&a.pt()));
        trace!("{} jets for `{}`", jets.len(), self.label);
        jets.into_iter().map(Jet::from).collect()
    }
}

impl Produce for JetProducer {
    fn produce(&self, event: &mut Event) {
        let jets = self.cluster(event);
        event.add_collection(self.label.clone(), jets);
    }
}
