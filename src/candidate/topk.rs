//! Top-K tracking for correlation peaks.

use std::cmp::Ordering;

/// Placement of a template in image space with its ZNCC score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the template's top-left corner.
    pub x: usize,
    /// Y coordinate (row) of the template's top-left corner.
    pub y: usize,
    /// ZNCC score at the placement.
    pub score: f32,
}

fn peak_cmp_desc(a: &Peak, b: &Peak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts peaks by descending score with deterministic tie-breaking.
pub(crate) fn sort_peaks_desc(peaks: &mut [Peak]) {
    peaks.sort_by(peak_cmp_desc);
}

/// Top-K container with O(k) insertion cost.
pub struct TopK {
    k: usize,
    items: Vec<Peak>,
}

impl TopK {
    /// Creates a new Top-K collector.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k),
        }
    }

    /// Pushes a peak, evicting the lowest score if at capacity.
    pub fn push(&mut self, peak: Peak) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(peak);
            return;
        }

        let mut worst_idx = 0usize;
        for (idx, item) in self.items.iter().enumerate().skip(1) {
            if peak_cmp_desc(item, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if peak_cmp_desc(&peak, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = peak;
        }
    }

    /// Absorbs every peak of another collector.
    pub fn merge(&mut self, other: TopK) {
        for peak in other.items {
            self.push(peak);
        }
    }

    /// Returns peaks sorted by descending score.
    pub fn into_sorted_desc(mut self) -> Vec<Peak> {
        sort_peaks_desc(&mut self.items);
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::{Peak, TopK};

    fn peak(x: usize, score: f32) -> Peak {
        Peak { x, y: 0, score }
    }

    #[test]
    fn keeps_highest_scores() {
        let mut topk = TopK::new(2);
        for (x, score) in [(0, 0.1), (1, 0.9), (2, 0.5), (3, 0.7)] {
            topk.push(peak(x, score));
        }
        let kept = topk.into_sorted_desc();
        assert_eq!(kept, vec![peak(1, 0.9), peak(3, 0.7)]);
    }

    #[test]
    fn ties_prefer_lower_coordinates() {
        let mut topk = TopK::new(1);
        topk.push(peak(5, 0.5));
        topk.push(peak(2, 0.5));
        assert_eq!(topk.into_sorted_desc(), vec![peak(2, 0.5)]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut topk = TopK::new(0);
        topk.push(peak(0, 1.0));
        assert!(topk.into_sorted_desc().is_empty());
    }
}
