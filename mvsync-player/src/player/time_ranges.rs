//! Buffered time ranges

use crate::{Error, Result};

/// Ordered set of disjoint `[start, end]` intervals in seconds
///
/// Overlapping or touching ranges are merged on insertion, so the set stays
/// sorted by start time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeRanges {
    ranges: Vec<(f64, f64)>,
}

impl TimeRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of ranges
    pub fn from_ranges<I>(ranges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut set = Self::new();
        for (start, end) in ranges {
            set.add(start, end)?;
        }
        Ok(set)
    }

    /// Insert a range, merging with any range it overlaps or touches
    pub fn add(&mut self, start: f64, end: f64) -> Result<()> {
        if start.is_nan() || end.is_nan() || start > end {
            return Err(Error::InvalidTimeRange { start, end });
        }

        let mut merged = (start, end);
        self.ranges.retain(|&(s, e)| {
            if s <= merged.1 && merged.0 <= e {
                merged = (merged.0.min(s), merged.1.max(e));
                false
            } else {
                true
            }
        });

        let position = self
            .ranges
            .iter()
            .position(|&(s, _)| s > merged.0)
            .unwrap_or(self.ranges.len());
        self.ranges.insert(position, merged);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn start(&self, index: usize) -> Option<f64> {
        self.ranges.get(index).map(|r| r.0)
    }

    pub fn end(&self, index: usize) -> Option<f64> {
        self.ranges.get(index).map(|r| r.1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ranges.iter().copied()
    }

    /// True if `time` lies inside some range (bounds inclusive)
    pub fn contains(&self, time: f64) -> bool {
        !time.is_nan() && self.ranges.iter().any(|&(s, e)| s <= time && time <= e)
    }
}
