//! Coefficient programs handed to a [`FilterBank`](crate::FilterBank) by
//! whoever designs the filters.

use crate::biquad::Coefficients;
use crate::consts::COEFFS_PER_SOS;
use crate::error::{Error, Result};
use crate::sample::Sample;

/// Coefficients destined for a single (channel, stage) section.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Entry<S>
where
    S: Sample,
{
    pub channel: usize,
    pub stage: usize,
    pub coeffs: Coefficients<S>,
}

/// An ordered list of section programs.
///
/// Entries are applied in insertion order, so if the same section appears
/// more than once the last entry wins. Sections that are not listed keep
/// whatever coefficients they already have.
///
/// ```
/// use sosbank::{Accelerator, CoefficientMap, Coefficients};
///
/// let mut map = CoefficientMap::new();
/// map.insert(0, 0, Coefficients::from_array([2, 1, 1, 0, 0]));
/// map.insert_values(3, 7, &[1, 0, 0, 0, 0]).unwrap();
///
/// let mut bank = Accelerator::new();
/// bank.apply(&map).unwrap();
///
/// assert_eq!(bank.coefficients(3, 7).unwrap(), &Coefficients::passthrough());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoefficientMap<S>
where
    S: Sample,
{
    entries: Vec<Entry<S>>,
}

impl<S> CoefficientMap<S>
where
    S: Sample,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Programs every section of a `CHANNELS` x `STAGES` bank with `coeffs`.
    pub fn uniform<const CHANNELS: usize, const STAGES: usize>(coeffs: Coefficients<S>) -> Self {
        (0..CHANNELS)
            .flat_map(|channel| (0..STAGES).map(move |stage| (channel, stage, coeffs)))
            .collect()
    }

    /// Builds a full program from a table laid out as
    /// `table[channel][stage] = [b0, b1, b2, a1, a2]`.
    pub fn from_table<const CHANNELS: usize, const STAGES: usize>(
        table: &[[[S; COEFFS_PER_SOS]; STAGES]; CHANNELS],
    ) -> Self {
        table
            .iter()
            .enumerate()
            .flat_map(|(channel, row)| {
                row.iter().enumerate().map(move |(stage, values)| {
                    (channel, stage, Coefficients::from_array(*values))
                })
            })
            .collect()
    }

    pub fn insert(&mut self, channel: usize, stage: usize, coeffs: Coefficients<S>) {
        self.entries.push(Entry {
            channel,
            stage,
            coeffs,
        });
    }

    /// Like [`insert`](Self::insert), but takes raw values ordered
    /// `[b0, b1, b2, a1, a2]`.
    pub fn insert_values(&mut self, channel: usize, stage: usize, values: &[S]) -> Result<()> {
        let coeffs = Coefficients::try_from(values)?;
        self.insert(channel, stage, coeffs);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<S>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks every entry against a `CHANNELS` x `STAGES` topology, failing
    /// on the first section that does not exist.
    pub fn validate<const CHANNELS: usize, const STAGES: usize>(&self) -> Result<()> {
        for entry in &self.entries {
            if entry.channel >= CHANNELS {
                return Err(Error::ChannelOutOfRange {
                    index: entry.channel,
                    count: CHANNELS,
                });
            }
            if entry.stage >= STAGES {
                return Err(Error::StageOutOfRange {
                    index: entry.stage,
                    count: STAGES,
                });
            }
        }

        Ok(())
    }
}

impl<S: Sample> FromIterator<(usize, usize, Coefficients<S>)> for CoefficientMap<S> {
    fn from_iter<T: IntoIterator<Item = (usize, usize, Coefficients<S>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (channel, stage, coeffs) in iter {
            map.insert(channel, stage, coeffs);
        }
        map
    }
}
