//! Bounded, degree-ordered cache of recurrence vectors.
//!
//! The windowed evaluator keeps only the `v1`-side Chebyshev vectors whose
//! degree lies within `bandwidth` of the current `v2`-side degree. The access
//! pattern is strictly evict-from-front, push-to-back, which maps onto a
//! double-ended queue; the capacity bound is enforced by the evaluator's
//! explicit evict-before-insert stepping rather than by the container itself.
//!
//! [`DegreeWindow`] tracks the degree of every held vector with a single
//! running counter instead of per-slot tags: vectors are admitted in strictly
//! increasing degree order and evicted oldest-first, so the `k`-th slot always
//! holds degree `lowest_degree + k`. That invariant is what lets the evaluator
//! map a slot to a coefficient row with one offset instead of a search.

use faer::{Mat, c64};
use std::collections::VecDeque;

/// A sliding window of Chebyshev vectors, keyed by 1-based degree.
///
/// Degree `d` holds the vector `T_{d-1}(H)·v1`, matching the 1-based row
/// indexing of the coefficient matrix.
#[derive(Debug)]
pub struct DegreeWindow {
    slots: VecDeque<Mat<c64>>,
    /// Degree that the next pushed vector will carry; starts at 1.
    next_degree: usize,
}

impl DegreeWindow {
    /// Creates an empty window; the first pushed vector gets degree 1.
    pub fn new() -> Self {
        Self {
            slots: VecDeque::new(),
            next_degree: 1,
        }
    }

    /// Number of vectors currently held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the window currently holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Degree of the oldest held vector, if any.
    pub fn lowest_degree(&self) -> Option<usize> {
        if self.slots.is_empty() {
            None
        } else {
            Some(self.next_degree - self.slots.len())
        }
    }

    /// Appends a vector at the next degree in sequence.
    pub fn push(&mut self, vector: Mat<c64>) {
        self.slots.push_back(vector);
        self.next_degree += 1;
    }

    /// Removes and returns the lowest-degree vector.
    pub fn evict_oldest(&mut self) -> Option<Mat<c64>> {
        self.slots.pop_front()
    }

    /// Iterates over `(degree, vector)` pairs in increasing degree order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Mat<c64>)> {
        let lowest = self.next_degree - self.slots.len();
        self.slots
            .iter()
            .enumerate()
            .map(move |(k, v)| (lowest + k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: f64) -> Mat<c64> {
        Mat::from_fn(2, 1, |i, _| c64::new(tag, i as f64))
    }

    #[test]
    fn degrees_stay_consecutive_through_evictions() {
        let mut window = DegreeWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.lowest_degree(), None);

        for d in 1..=4 {
            window.push(tagged(d as f64));
        }
        assert_eq!(window.len(), 4);
        assert_eq!(window.lowest_degree(), Some(1));

        // Evict, then insert: the stepping order used by the evaluator.
        let evicted = window.evict_oldest().unwrap();
        assert!((evicted[(0, 0)].re - 1.0).abs() < 1e-15);
        window.push(tagged(5.0));

        let degrees: Vec<usize> = window.iter().map(|(d, _)| d).collect();
        assert_eq!(degrees, vec![2, 3, 4, 5]);
        assert_eq!(window.lowest_degree(), Some(2));

        // Slot contents travel with their degree tag.
        for (degree, vector) in window.iter() {
            assert!((vector[(0, 0)].re - degree as f64).abs() < 1e-15);
        }
    }

    #[test]
    fn draining_the_window_resets_nothing_but_contents() {
        let mut window = DegreeWindow::new();
        window.push(tagged(1.0));
        window.push(tagged(2.0));
        window.evict_oldest();
        window.evict_oldest();

        assert!(window.evict_oldest().is_none());
        assert_eq!(window.lowest_degree(), None);

        // Degrees keep counting from where they left off.
        window.push(tagged(3.0));
        assert_eq!(window.lowest_degree(), Some(3));
    }
}
