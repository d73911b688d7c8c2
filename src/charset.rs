//! # Character Ranges
//!
//! [`CharRange`] is an ordered set of code points stored as disjoint inclusive
//! intervals. It backs both the default alphabet and the expanded domain of a
//! character class, and supports the rank/select pair the generator needs to
//! turn a chosen index into a code point and back.

use std::fmt;

/// An ordered set of code points, stored as sorted, disjoint, non-adjacent spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharRange {
    spans: Vec<(u32, u32)>,
}

impl CharRange {
    /// The empty range.
    pub fn new() -> Self {
        Self::default()
    }

    /// A range holding exactly `value`.
    pub fn single(value: u32) -> Self {
        Self::span(value, value)
    }

    /// The inclusive interval `lo..=hi`; empty when `lo > hi`.
    pub fn span(
        lo: u32,
        hi: u32,
    ) -> Self {
        let mut range = Self::new();
        range.add_span(lo, hi);
        range
    }

    /// The printable ASCII alphabet, `32..=126`.
    pub fn printable() -> Self {
        Self::span(32, 126)
    }

    /// Adds the inclusive interval `lo..=hi`.
    pub fn add_span(
        &mut self,
        lo: u32,
        hi: u32,
    ) -> &mut Self {
        if lo > hi {
            return self;
        }
        let (mut lo, mut hi) = (lo, hi);

        // Spans that overlap or touch the new one are merged into it.
        let start = self
            .spans
            .partition_point(|&(_, end)| end.saturating_add(1) < lo);
        let mut stop = start;
        while stop < self.spans.len() && self.spans[stop].0 <= hi.saturating_add(1) {
            lo = lo.min(self.spans[stop].0);
            hi = hi.max(self.spans[stop].1);
            stop += 1;
        }
        self.spans.splice(start..stop, [(lo, hi)]);
        self
    }

    /// Set union.
    pub fn add(
        &mut self,
        other: &CharRange,
    ) -> &mut Self {
        for &(lo, hi) in &other.spans {
            self.add_span(lo, hi);
        }
        self
    }

    /// Set difference.
    pub fn subtract(
        &mut self,
        other: &CharRange,
    ) -> &mut Self {
        let mut kept = Vec::with_capacity(self.spans.len());
        for &(lo, hi) in &self.spans {
            let mut cursor = lo;
            let mut open = true;
            for &(cut_lo, cut_hi) in &other.spans {
                if cut_hi < cursor {
                    continue;
                }
                if cut_lo > hi {
                    break;
                }
                if cut_lo > cursor {
                    kept.push((cursor, cut_lo - 1));
                }
                if cut_hi >= hi {
                    open = false;
                    break;
                }
                cursor = cut_hi + 1;
            }
            if open {
                kept.push((cursor, hi));
            }
        }
        self.spans = kept;
        self
    }

    /// Set intersection.
    pub fn intersect(
        &mut self,
        other: &CharRange,
    ) -> &mut Self {
        let mut kept = Vec::new();
        let (mut a, mut b) = (0, 0);
        while a < self.spans.len() && b < other.spans.len() {
            let (a_lo, a_hi) = self.spans[a];
            let (b_lo, b_hi) = other.spans[b];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                kept.push((lo, hi));
            }
            if a_hi < b_hi {
                a += 1;
            } else {
                b += 1;
            }
        }
        self.spans = kept;
        self
    }

    /// Number of code points in the set.
    pub fn len(&self) -> usize {
        self.spans
            .iter()
            .map(|&(lo, hi)| (hi - lo) as usize + 1)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn contains(
        &self,
        value: u32,
    ) -> bool {
        self.rank(value).is_some()
    }

    /// The `k`-th smallest code point in the set.
    pub fn index(
        &self,
        k: usize,
    ) -> Option<u32> {
        let mut k = k;
        for &(lo, hi) in &self.spans {
            let width = (hi - lo) as usize + 1;
            if k < width {
                return Some(lo + k as u32);
            }
            k -= width;
        }
        None
    }

    /// Position of `value` within the set; the inverse of [`index`](Self::index).
    pub fn rank(
        &self,
        value: u32,
    ) -> Option<usize> {
        let mut before = 0;
        for &(lo, hi) in &self.spans {
            if value < lo {
                return None;
            }
            if value <= hi {
                return Some(before + (value - lo) as usize);
            }
            before += (hi - lo) as usize + 1;
        }
        None
    }

    /// The stored spans, in ascending order.
    pub fn spans(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.spans.iter().copied()
    }
}

impl fmt::Display for CharRange {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[")?;
        for (i, (lo, hi)) in self.spans().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if lo == hi {
                write!(f, "{lo}")?;
            } else {
                write!(f, "{lo}-{hi}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn spans(range: &CharRange) -> Vec<(u32, u32)> {
        range.spans().collect()
    }

    #[test]
    fn add_merges_overlapping_and_adjacent_spans() {
        let mut range = CharRange::span(10, 20);
        range.add_span(30, 40).add_span(21, 25);
        assert_eq!(spans(&range), vec![(10, 25), (30, 40)]);

        range.add_span(26, 29);
        assert_eq!(spans(&range), vec![(10, 40)]);

        range.add_span(0, 3).add_span(50, 50);
        assert_eq!(spans(&range), vec![(0, 3), (10, 40), (50, 50)]);
        assert_eq!(range.len(), 4 + 31 + 1);
    }

    #[test]
    fn empty_span_is_ignored() {
        assert!(CharRange::span(5, 4).is_empty());
        assert_eq!(CharRange::new().len(), 0);
    }

    #[test]
    fn subtract_splits_spans() {
        let mut range = CharRange::span(0, 100);
        let mut cut = CharRange::span(10, 20);
        cut.add_span(50, 200);
        range.subtract(&cut);
        assert_eq!(spans(&range), vec![(0, 9), (21, 49)]);

        let mut whole = CharRange::span(5, 6);
        whole.subtract(&CharRange::span(0, 10));
        assert!(whole.is_empty());
    }

    #[test]
    fn intersect_keeps_common_points() {
        let mut range = CharRange::span(0, 10);
        range.add_span(20, 30);
        let mut other = CharRange::span(5, 25);
        other.add_span(29, 40);
        range.intersect(&other);
        assert_eq!(spans(&range), vec![(5, 10), (20, 25), (29, 30)]);
    }

    #[test]
    fn index_and_rank_agree() {
        let mut range = CharRange::span('a' as u32, 'c' as u32);
        range.add_span('x' as u32, 'z' as u32);

        assert_eq!(range.index(0), Some('a' as u32));
        assert_eq!(range.index(3), Some('x' as u32));
        assert_eq!(range.index(6), None);

        for k in 0..range.len() {
            let value = range.index(k).unwrap();
            assert_eq!(range.rank(value), Some(k));
        }
        assert_eq!(range.rank('d' as u32), None);
        assert!(!range.contains('w' as u32));
    }

    #[test]
    fn displays_spans() {
        let mut range = CharRange::span(1, 3);
        range.add_span(7, 7);
        assert_eq!(range.to_string(), "[1-3, 7]");
    }
}
