use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Histogram with equally sized bins
///
/// Bins are half-open intervals `[lo, hi)`. Values below the lower
/// edge count as underflow, values at or above the upper edge as
/// overflow.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    min: f64,
    max: f64,
    bins: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: usize,
}

/// Binning settings of a [Histogram]
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HistogramSettings {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Error, Copy, Clone, PartialEq)]
pub enum HistogramError {
    #[error("Histogram needs at least one bin")]
    NoBins,
    #[error("Invalid histogram range [{0}, {1})")]
    InvalidRange(f64, f64),
}

impl Histogram {
    pub fn new(nbins: usize, min: f64, max: f64) -> Result<Self, HistogramError> {
        if nbins == 0 {
            return Err(HistogramError::NoBins);
        }
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(HistogramError::InvalidRange(min, max));
        }
        Ok(Self {
            min,
            max,
            bins: vec![0.; nbins],
            underflow: 0.,
            overflow: 0.,
            entries: 0,
        })
    }

    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.)
    }

    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        if x < self.min {
            self.underflow += weight;
        } else if x >= self.max || x.is_nan() {
            self.overflow += weight;
        } else {
            let pos = (x - self.min) / self.bin_width();
            // guard against rounding up to the upper edge
            let idx = std::cmp::min(pos as usize, self.bins.len() - 1);
            self.bins[idx] += weight;
        }
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Number of calls to `fill`, including under- and overflow
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins.len() as f64
    }

    /// Lower and upper edges of all bins
    pub fn edges(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let width = self.bin_width();
        (0..self.bins.len()).map(move |i| {
            let lo = self.min + i as f64 * width;
            let hi = if i + 1 == self.bins.len() {
                self.max
            } else {
                self.min + (i + 1) as f64 * width
            };
            (lo, hi)
        })
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl TryFrom<HistogramSettings> for Histogram {
    type Error = HistogramError;

    fn try_from(settings: HistogramSettings) -> Result<Self, Self::Error> {
        Self::new(settings.bins, settings.min, settings.max)
    }
}
