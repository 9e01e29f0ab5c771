//! Sorted interval set with merge-overlaps semantics.
//!
//! Spans are half-open `[start, end)`. The set starts out as an insertion
//! log; [`IntervalSet::merge_overlaps`] sorts and coalesces everything that
//! touches or overlaps into the minimal equivalent span list. Queries are
//! valid before merging but may then visit redundant overlapping spans.

/// A half-open `[start, end)` span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<T> {
    pub start: T,
    pub end: T,
}

/// A collection of half-open spans over an ordered point type.
#[derive(Debug, Clone, Default)]
pub struct IntervalSet<T> {
    spans: Vec<Span<T>>,
}

impl<T: Copy + Ord> IntervalSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Insert a half-open span. Inserting `start >= end` is a no-op.
    pub fn insert(&mut self, start: T, end: T) {
        if start >= end {
            return;
        }
        self.spans.push(Span { start, end });
    }

    /// Coalesce all spans that touch or overlap into the minimal sorted,
    /// non-overlapping set. Idempotent.
    pub fn merge_overlaps(&mut self) {
        if self.spans.len() < 2 {
            return;
        }
        self.spans.sort_by_key(|s| (s.start, s.end));
        let mut merged: Vec<Span<T>> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            match merged.last_mut() {
                // Touching counts as overlapping: [0,5) + [5,10) = [0,10)
                Some(last) if span.start <= last.end => {
                    if span.end > last.end {
                        last.end = span.end;
                    }
                }
                _ => merged.push(span),
            }
        }
        self.spans = merged;
    }

    /// Whether any span contains the given point.
    pub fn overlaps(&self, point: T) -> bool {
        self.spans
            .iter()
            .any(|s| s.start <= point && point < s.end)
    }

    /// The end of the last span, or `None` if the set is empty.
    pub fn upper_bound(&self) -> Option<T> {
        self.spans.iter().map(|s| s.end).max()
    }

    /// Number of stored spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the set holds no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Iterate over the stored spans in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Span<T>> {
        self.spans.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_insert_is_noop() {
        let mut set = IntervalSet::new();
        set.insert(5u64, 5);
        set.insert(7, 3);
        assert!(set.is_empty());
        assert_eq!(set.upper_bound(), None);
    }

    #[test]
    fn test_touching_spans_merge() {
        let mut set = IntervalSet::new();
        set.insert(0u64, 5);
        set.insert(5, 10);
        set.merge_overlaps();
        assert_eq!(set.len(), 1);
        let span = set.iter().next().unwrap();
        assert_eq!((span.start, span.end), (0, 10));
    }

    #[test]
    fn test_overlapping_spans_merge() {
        let mut set = IntervalSet::new();
        set.insert(0u64, 6);
        set.insert(4, 10);
        set.insert(20, 30);
        set.merge_overlaps();
        assert_eq!(set.len(), 2);
        assert_eq!(set.upper_bound(), Some(30));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut set = IntervalSet::new();
        set.insert(0u64, 5);
        set.insert(3, 8);
        set.insert(8, 12);
        set.insert(40, 50);
        set.merge_overlaps();
        let once: Vec<_> = set.iter().copied().collect();
        set.merge_overlaps();
        let twice: Vec<_> = set.iter().copied().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_contained_span_merges_away() {
        let mut set = IntervalSet::new();
        set.insert(0u64, 100);
        set.insert(10, 20);
        set.merge_overlaps();
        assert_eq!(set.len(), 1);
        assert_eq!(set.upper_bound(), Some(100));
    }

    #[test]
    fn test_point_query_half_open() {
        let mut set = IntervalSet::new();
        set.insert(2u64, 5);
        set.merge_overlaps();
        assert!(!set.overlaps(1));
        assert!(set.overlaps(2));
        assert!(set.overlaps(4));
        assert!(!set.overlaps(5));
    }

    #[test]
    fn test_query_before_merge_is_permitted() {
        let mut set = IntervalSet::new();
        set.insert(0u64, 5);
        set.insert(3, 8);
        assert!(set.overlaps(4));
        assert_eq!(set.upper_bound(), Some(8));
    }
}
