use ndarray::Array1;
use num_traits::Float;
use std::{cmp::Ordering, fmt::Display};

use crate::interval::Position;
use crate::strand::Strand;

/// Assert to float iterables are the same up to `eps`.
#[allow(dead_code)]
pub fn assert_float_eq<T>(left: T, right: T, eps: T)
where
    T: Float + Display,
{
    if left.is_nan() {
        assert!(right.is_nan(), "left is NaN, but right is not");
    } else {
        let diff = (left - right).abs();
        assert!(
            diff < eps,
            "values |{} - {}| ≥ {} (diff: {})",
            left,
            right,
            eps,
            diff
        );
    }
}

/// Assert to float values are the same up to `eps`.
#[allow(dead_code)]
pub fn assert_floats_eq<T>(left: &[T], right: &[T], eps: T)
where
    T: Float + Display,
{
    assert_eq!(left.len(), right.len());
    for (l, r) in left.iter().zip(right.iter()) {
        assert_float_eq(*l, *r, eps)
    }
}

#[derive(Debug, PartialEq)]
pub enum SearchResult {
    Exact(usize),
    LowerBound(usize),
    UpperBound(usize),
    LeftOf(usize),
}

impl SearchResult {
    pub fn get_index(&self) -> usize {
        match self {
            SearchResult::Exact(idx) => *idx,
            SearchResult::LeftOf(idx) => *idx,
            SearchResult::LowerBound(idx) => *idx,
            SearchResult::UpperBound(idx) => *idx,
        }
    }
}

pub fn search_sorted<T: Ord>(vec: &[T], new_val: T) -> SearchResult {
    let mut left = 0;
    let mut right = vec.len();
    while left < right {
        let mid = left + (right - left) / 2;

        match vec[mid].cmp(&new_val) {
            Ordering::Less => left = mid + 1,
            Ordering::Greater => right = mid,
            Ordering::Equal => return SearchResult::Exact(mid),
        }
    }

    if left == 0 {
        SearchResult::LowerBound(left)
    } else if left < vec.len() {
        SearchResult::LeftOf(left)
    } else {
        SearchResult::UpperBound(left)
    }
}

/// Map a base at `offset` along a transcript of `length` bases to one of `bins`
/// bins, reading the transcript 5' to 3' on its strand.
///
/// The bin is `floor(bins * x / length)`, with `x = offset` on the plus strand
/// and `x = length - 1 - offset` on the minus strand, clamped to `bins - 1`.
/// Both `bins` and `length` must be positive.
pub fn bin_index(bins: usize, offset: Position, length: Position, strand: Strand) -> usize {
    debug_assert!(bins > 0 && length > 0);
    let along = match strand {
        Strand::Plus => offset,
        Strand::Minus => (length - 1).saturating_sub(offset),
    };
    let idx = (bins as u128 * along as u128) / length as u128;
    (idx as usize).min(bins - 1)
}

/// Scale `xs` in place so it sums to one, returning the original sum.
///
/// Returns `None`, leaving `xs` unchanged, if the sum is not positive.
pub fn normalize<T: Float>(xs: &mut Array1<T>) -> Option<T> {
    let total = xs.sum();
    if total > T::zero() {
        xs.mapv_inplace(|x| x / total);
        Some(total)
    } else {
        None
    }
}

/// Format a float in scientific notation with a signed, two-digit exponent,
/// e.g. `2.500000e-01`.
pub fn format_sci(x: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, x);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        // NaN and infinities have no exponent
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_search_sorted_empty() {
        let vec: Vec<i32> = vec![];
        assert_eq!(search_sorted(&vec, 5), SearchResult::LowerBound(0));
    }

    #[test]
    fn test_search_sorted_exact_match() {
        let vec = vec![1, 2, 3, 4, 5];
        assert_eq!(search_sorted(&vec, 3), SearchResult::Exact(2));
    }

    #[test]
    fn test_search_sorted_no_exact_match_left_of() {
        let vec = vec![1, 3, 5, 7, 9];
        assert_eq!(search_sorted(&vec, 4), SearchResult::LeftOf(2));
    }

    #[test]
    fn test_search_sorted_no_exact_match_lower_bound() {
        let vec = vec![10, 20, 30, 40, 50];
        assert_eq!(search_sorted(&vec, 5), SearchResult::LowerBound(0));
    }

    #[test]
    fn test_search_sorted_no_exact_match_upper_bound() {
        let vec = vec![10, 20, 30, 40, 50];
        assert_eq!(search_sorted(&vec, 55), SearchResult::UpperBound(5));
        assert_eq!(search_sorted(&vec, 55).get_index(), 5);
    }

    #[test]
    fn test_bin_index_by_strand() {
        assert_eq!(bin_index(10, 55, 100, Strand::Plus), 5);
        assert_eq!(bin_index(10, 55, 100, Strand::Minus), 4);
        assert_eq!(bin_index(10, 0, 100, Strand::Plus), 0);
        assert_eq!(bin_index(10, 99, 100, Strand::Plus), 9);
        assert_eq!(bin_index(10, 0, 100, Strand::Minus), 9);
        assert_eq!(bin_index(10, 99, 100, Strand::Minus), 0);
    }

    #[test]
    fn test_bin_index_clamps() {
        // one past the end
        assert_eq!(bin_index(4, 100, 100, Strand::Plus), 3);
        assert_eq!(bin_index(4, 100, 100, Strand::Minus), 0);
        // more bins than bases
        assert_eq!(bin_index(100, 2, 3, Strand::Plus), 66);
        assert_eq!(bin_index(1, 7, 8, Strand::Minus), 0);
    }

    #[test]
    fn test_normalize() {
        let mut xs = array![25.0, 25.0, 25.0, 25.0];
        assert_eq!(normalize(&mut xs), Some(100.0));
        assert_floats_eq(xs.as_slice().unwrap(), &[0.25, 0.25, 0.25, 0.25], 1e-12);

        let mut zeros = array![0.0_f64, 0.0];
        assert_eq!(normalize(&mut zeros), None);
        assert_floats_eq(zeros.as_slice().unwrap(), &[0.0, 0.0], 1e-12);
    }

    #[test]
    fn test_format_sci() {
        assert_eq!(format_sci(0.25, 6), "2.500000e-01");
        assert_eq!(format_sci(0.0, 6), "0.000000e+00");
        assert_eq!(format_sci(12000.0, 2), "1.20e+04");
        assert_eq!(format_sci(1.5e-120, 1), "1.5e-120");
    }
}
