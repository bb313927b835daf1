use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Interval index keyed on the low coordinate.
///
/// A `BTreeMap` from `low` to the intervals starting there. The tree also
/// remembers the longest span it has held, so an overlap query only scans
/// lows in `[q_low - longest, q_high]`. Whole rows or columns push `longest`
/// to the full axis and degrade the scan to a prefix. Each `[low, high]` node
/// holds the set of values indexed under exactly that interval.
#[derive(Debug, Clone)]
struct IntervalNode<T: Clone + Eq + Hash> {
    high: u32,
    values: FxHashSet<T>,
}

#[derive(Debug, Clone)]
pub struct IntervalTree<T: Clone + Eq + Hash> {
    map: BTreeMap<u32, Vec<IntervalNode<T>>>,
    size: usize,
    /// Largest `high - low` inserted since the last `clear`.
    longest: u32,
}

impl<T: Clone + Eq + Hash> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> IntervalTree<T> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            size: 0,
            longest: 0,
        }
    }

    /// Number of indexed values.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.size = 0;
        self.longest = 0;
    }

    /// Index `value` under `[low, high]`.
    pub fn insert(&mut self, low: u32, high: u32, value: T) {
        let nodes = self.map.entry(low).or_default();
        let inserted = match nodes.iter_mut().find(|n| n.high == high) {
            Some(node) => node.values.insert(value),
            None => {
                let mut values = FxHashSet::default();
                values.insert(value);
                nodes.push(IntervalNode { high, values });
                true
            }
        };
        if inserted {
            self.size += 1;
            self.longest = self.longest.max(high.saturating_sub(low));
        }
    }

    /// Every value whose interval overlaps `[q_low, q_high]`.
    pub fn query(&self, q_low: u32, q_high: u32) -> impl Iterator<Item = &T> + '_ {
        let start = q_low.saturating_sub(self.longest).min(q_high);
        self.map
            .range(start..=q_high)
            .flat_map(|(_, nodes)| nodes.iter())
            .filter(move |node| node.high >= q_low)
            .flat_map(|node| node.values.iter())
    }

    pub fn remove(&mut self, low: u32, high: u32, value: &T) -> bool {
        if let Some(nodes) = self.map.get_mut(&low)
            && let Some(node) = nodes.iter_mut().find(|n| n.high == high)
        {
            let removed = node.values.remove(value);
            if node.values.is_empty() {
                nodes.retain(|n| n.high != high);
            }
            if nodes.is_empty() {
                self.map.remove(&low);
            }
            if removed {
                self.size -= 1;
            }
            return removed;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(tree: &IntervalTree<u32>, lo: u32, hi: u32) -> Vec<u32> {
        let mut v: Vec<u32> = tree.query(lo, hi).copied().collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn point_and_range_queries() {
        let mut tree = IntervalTree::new();
        tree.insert(5, 5, 100);
        tree.insert(10, 20, 1);
        tree.insert(15, 25, 2);
        tree.insert(30, 40, 3);

        assert_eq!(hits(&tree, 5, 5), vec![100]);
        assert_eq!(hits(&tree, 12, 22), vec![1, 2]);
        assert_eq!(hits(&tree, 35, 45), vec![3]);
        assert_eq!(hits(&tree, 26, 29), Vec::<u32>::new());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn values_share_a_node() {
        let mut tree = IntervalTree::new();
        tree.insert(5, 5, 100);
        tree.insert(5, 5, 200);
        tree.insert(5, 5, 200);
        assert_eq!(tree.len(), 2);

        assert!(tree.remove(5, 5, &100));
        assert!(!tree.remove(5, 5, &100));
        assert_eq!(hits(&tree, 0, 10), vec![200]);
        assert!(tree.remove(5, 5, &200));
        assert!(tree.is_empty());
    }

    #[test]
    fn unbounded_high_end() {
        let mut tree = IntervalTree::new();
        tree.insert(3, u32::MAX, 7);
        assert_eq!(hits(&tree, 1_000_000, 1_000_000), vec![7]);
        assert_eq!(hits(&tree, 0, 2), Vec::<u32>::new());
    }

    #[test]
    fn scan_starts_at_the_longest_span() {
        let mut tree = IntervalTree::new();
        tree.insert(0, 2, 1);
        tree.insert(100, 104, 2);
        tree.insert(200, 200, 3);
        assert_eq!(tree.longest, 4);
        assert_eq!(hits(&tree, 103, 150), vec![2]);
        assert_eq!(hits(&tree, 2, 2), vec![1]);
        assert_eq!(hits(&tree, 105, 199), Vec::<u32>::new());

        tree.insert(50, 60, 4);
        assert_eq!(hits(&tree, 58, 58), vec![4]);
        tree.clear();
        assert_eq!(tree.longest, 0);
    }
}
