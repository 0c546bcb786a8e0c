//! Closed integer intervals and interval set flattening.

use crate::error::GeneCovError;

/// The integer type for genomic positions.
pub type Position = u64;

/// A closed interval `[start, end]`. Whether it is 0- or 1-based depends on
/// where it came from; gene exons are 0-based, transcript exons and introns
/// keep the 1-based GTF convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub start: Position,
    pub end: Position,
}

#[allow(clippy::len_without_is_empty)]
impl Interval {
    /// Create a new interval, rejecting `start > end`.
    pub fn new(start: Position, end: Position) -> Result<Self, GeneCovError> {
        if start > end {
            return Err(GeneCovError::DegenerateInterval(start, end));
        }
        Ok(Self { start, end })
    }

    /// Number of positions covered, counting both endpoints.
    pub fn len(&self) -> Position {
        self.end - self.start + 1
    }
}

/// Merge overlapping intervals into a sorted, disjoint set.
///
/// Intervals are sorted by `(start, end)`, then swept with a single running
/// interval that absorbs every following interval starting at or before its
/// end. In the output, `out[i].end < out[i + 1].start` for all `i`.
pub fn flatten(mut intervals: Vec<Interval>) -> Result<Vec<Interval>, GeneCovError> {
    intervals.sort_unstable();
    let mut iter = intervals.into_iter();
    let mut current = iter.next().ok_or(GeneCovError::EmptyIntervalSet)?;

    let mut merged = Vec::new();
    for next in iter {
        if next.start <= current.end {
            current.end = current.end.max(next.end);
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    Ok(merged)
}

/// Total number of positions covered by a flattened interval set.
pub fn total_length(intervals: &[Interval]) -> Position {
    intervals.iter().map(Interval::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ivs(pairs: &[(Position, Position)]) -> Vec<Interval> {
        pairs
            .iter()
            .map(|&(s, e)| Interval::new(s, e).unwrap())
            .collect()
    }

    fn covered(intervals: &[Interval]) -> BTreeSet<Position> {
        intervals.iter().flat_map(|iv| iv.start..=iv.end).collect()
    }

    #[test]
    fn test_degenerate_interval() {
        assert!(Interval::new(5, 4).is_err());
        assert_eq!(Interval::new(4, 4).unwrap().len(), 1);
    }

    #[test]
    fn test_flatten_single() {
        let flat = flatten(ivs(&[(10, 20)])).unwrap();
        assert_eq!(flat, ivs(&[(10, 20)]));
    }

    #[test]
    fn test_flatten_empty() {
        assert!(matches!(
            flatten(Vec::new()),
            Err(GeneCovError::EmptyIntervalSet)
        ));
    }

    #[test]
    fn test_flatten_overlapping_and_nested() {
        let flat = flatten(ivs(&[(50, 60), (0, 10), (5, 20), (8, 9), (20, 25), (40, 45)])).unwrap();
        assert_eq!(flat, ivs(&[(0, 25), (40, 45), (50, 60)]));
    }

    #[test]
    fn test_flatten_keeps_abutting_exons_apart() {
        let flat = flatten(ivs(&[(50, 99), (0, 49)])).unwrap();
        assert_eq!(flat, ivs(&[(0, 49), (50, 99)]));
        assert_eq!(total_length(&flat), 100);
    }

    #[test]
    fn test_flatten_properties() {
        let input = ivs(&[
            (100, 200),
            (150, 180),
            (190, 250),
            (300, 300),
            (251, 260),
            (0, 3),
            (2, 2),
            (400, 500),
            (250, 251),
        ]);
        let flat = flatten(input.clone()).unwrap();

        // idempotent
        assert_eq!(flatten(flat.clone()).unwrap(), flat);
        // coverage preserved
        assert_eq!(covered(&flat), covered(&input));
        // sorted and disjoint
        for pair in flat.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
        assert_eq!(total_length(&flat), covered(&input).len() as Position);
    }
}
