use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{Event, Jet};

/// Label identifying a jet collection within an event
///
/// The textual form is `label[:instance[:process]]`. An empty
/// `process` matches whichever process added a collection with the
/// given `label` and `instance` last.
#[derive(
    Deserialize,
    Serialize,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionLabel {
    label: String,
    instance: String,
    process: String,
}

impl CollectionLabel {
    pub fn new(
        label: impl Into<String>,
        instance: impl Into<String>,
        process: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            instance: instance.into(),
            process: process.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    /// Whether a stored collection with label `stored` satisfies a
    /// request for `self`
    pub fn matches(&self, stored: &CollectionLabel) -> bool {
        self.label == stored.label
            && self.instance == stored.instance
            && (self.process.is_empty() || self.process == stored.process)
    }
}

impl Display for CollectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if !self.instance.is_empty() || !self.process.is_empty() {
            write!(f, ":{}", self.instance)?;
        }
        if !self.process.is_empty() {
            write!(f, ":{}", self.process)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseLabelError {
    #[error("Collection label is empty")]
    Empty,
    #[error("Too many components in collection label `{0}`: expected `label[:instance[:process]]`")]
    TooManyParts(String),
}

impl FromStr for CollectionLabel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let label = parts.next().unwrap_or_default();
        if label.is_empty() {
            return Err(ParseLabelError::Empty);
        }
        let instance = parts.next().unwrap_or_default();
        let process = parts.next().unwrap_or_default();
        if parts.next().is_some() {
            return Err(ParseLabelError::TooManyParts(s.to_owned()));
        }
        Ok(Self::new(label, instance, process))
    }
}

impl TryFrom<String> for CollectionLabel {
    type Error = ParseLabelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CollectionLabel> for String {
    fn from(label: CollectionLabel) -> Self {
        label.to_string()
    }
}

/// The requested collection does not exist in an event
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("No jet collection matching `{label}`")]
pub struct MissingCollection {
    pub label: CollectionLabel,
}

/// Look up jet collections in events
pub trait CollectionProvider {
    fn jets<'a>(
        &self,
        event: &'a Event,
        label: &CollectionLabel,
    ) -> Result<&'a [Jet], MissingCollection>;
}

impl<P: CollectionProvider> CollectionProvider for &P {
    fn jets<'a>(
        &self,
        event: &'a Event,
        label: &CollectionLabel,
    ) -> Result<&'a [Jet], MissingCollection> {
        P::jets(*self, event, label)
    }
}

/// Look up the collections stored in an event by label
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ByLabel {}

impl ByLabel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionProvider for ByLabel {
    fn jets<'a>(
        &self,
        event: &'a Event,
        label: &CollectionLabel,
    ) -> Result<&'a [Jet], MissingCollection> {
        event
            .collections()
            .iter()
            .rev()
            .find(|(stored, _)| label.matches(stored))
            .map(|(_, jets)| &**jets)
            .ok_or_else(|| MissingCollection {
                label: label.clone(),
            })
    }
}
