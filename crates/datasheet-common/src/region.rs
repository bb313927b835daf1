//! Rectangular grid regions.
//!
//! All coordinates are 0-based and inclusive. `bottom`/`right` may hold
//! [`UNBOUNDED`] to describe whole rows or whole columns; an unbounded edge is
//! never moved by [`Region::shift`] or [`Region::expand`].

use std::fmt;

use crate::address::cell_to_a1;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sentinel for an edge that extends to the end of the grid.
pub const UNBOUNDED: u32 = u32::MAX;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Col,
}

impl Axis {
    pub fn other(self) -> Axis {
        match self {
            Axis::Row => Axis::Col,
            Axis::Col => Axis::Row,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// The edge that grows when inserting along `axis`.
    pub fn trailing(axis: Axis) -> Edge {
        match axis {
            Axis::Row => Edge::Bottom,
            Axis::Col => Edge::Right,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

fn offset(v: u32, d: i64) -> u32 {
    if v == UNBOUNDED {
        return v;
    }
    (v as i64 + d).clamp(0, (UNBOUNDED - 1) as i64) as u32
}

impl Region {
    pub const ALL: Region = Region {
        top: 0,
        left: 0,
        bottom: UNBOUNDED,
        right: UNBOUNDED,
    };

    /// Build a region from two corners; the corners are normalised so that
    /// `top <= bottom` and `left <= right`.
    pub fn new(r0: u32, c0: u32, r1: u32, c1: u32) -> Self {
        Region {
            top: r0.min(r1),
            left: c0.min(c1),
            bottom: r0.max(r1),
            right: c0.max(c1),
        }
    }

    pub fn cell(row: u32, col: u32) -> Self {
        Region::new(row, col, row, col)
    }

    /// Whole rows `start..=end`.
    pub fn rows(start: u32, end: u32) -> Self {
        Region::new(start, 0, end, UNBOUNDED)
    }

    /// Whole columns `start..=end`.
    pub fn cols(start: u32, end: u32) -> Self {
        Region::new(0, start, UNBOUNDED, end)
    }

    /// Whole rows or columns along `axis`.
    pub fn span_of(axis: Axis, start: u32, end: u32) -> Self {
        match axis {
            Axis::Row => Region::rows(start, end),
            Axis::Col => Region::cols(start, end),
        }
    }

    pub fn height(&self) -> u64 {
        self.bottom as u64 - self.top as u64 + 1
    }

    pub fn width(&self) -> u64 {
        self.right as u64 - self.left as u64 + 1
    }

    pub fn area(&self) -> u128 {
        self.height() as u128 * self.width() as u128
    }

    pub fn is_single_cell(&self) -> bool {
        self.top == self.bottom && self.left == self.right
    }

    pub fn is_unbounded(&self) -> bool {
        self.bottom == UNBOUNDED || self.right == UNBOUNDED
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.top && row <= self.bottom && col >= self.left && col <= self.right
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        other.top >= self.top
            && other.bottom <= self.bottom
            && other.left >= self.left
            && other.right <= self.right
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.top <= other.bottom
            && other.top <= self.bottom
            && self.left <= other.right
            && other.left <= self.right
    }

    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if !self.intersects(other) {
            return None;
        }
        Some(Region {
            top: self.top.max(other.top),
            left: self.left.max(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.min(other.right),
        })
    }

    /// Smallest region covering both.
    pub fn bounding_union(&self, other: &Region) -> Region {
        Region {
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.max(other.right),
        }
    }

    /// Grow (positive `n`) or shrink (negative `n`) one edge.
    pub fn expand(&self, edge: Edge, n: i64) -> Region {
        let mut r = *self;
        match edge {
            Edge::Top => r.top = offset(r.top, -n),
            Edge::Left => r.left = offset(r.left, -n),
            Edge::Bottom => r.bottom = offset(r.bottom, n),
            Edge::Right => r.right = offset(r.right, n),
        }
        r.top = r.top.min(r.bottom);
        r.left = r.left.min(r.right);
        r
    }

    pub fn shift(&self, drow: i64, dcol: i64) -> Region {
        Region {
            top: offset(self.top, drow),
            left: offset(self.left, dcol),
            bottom: offset(self.bottom, drow),
            right: offset(self.right, dcol),
        }
    }

    pub fn shift_along(&self, axis: Axis, d: i64) -> Region {
        match axis {
            Axis::Row => self.shift(d, 0),
            Axis::Col => self.shift(0, d),
        }
    }

    pub fn leading(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.top,
            Axis::Col => self.left,
        }
    }

    pub fn trailing(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.bottom,
            Axis::Col => self.right,
        }
    }

    /// Replace the extent along `axis`, keeping the other axis.
    pub fn with_span(&self, axis: Axis, lead: u32, trail: u32) -> Region {
        let mut r = *self;
        match axis {
            Axis::Row => {
                r.top = lead;
                r.bottom = trail;
            }
            Axis::Col => {
                r.left = lead;
                r.right = trail;
            }
        }
        r
    }

    /// The parts of `self` not covered by `other`, as at most four regions.
    pub fn subtract(&self, other: &Region) -> Vec<Region> {
        let Some(i) = self.intersection(other) else {
            return vec![*self];
        };
        let mut out = Vec::with_capacity(4);
        if i.top > self.top {
            out.push(Region::new(self.top, self.left, i.top - 1, self.right));
        }
        if i.bottom < self.bottom {
            out.push(Region::new(i.bottom + 1, self.left, self.bottom, self.right));
        }
        if i.left > self.left {
            out.push(Region::new(i.top, self.left, i.bottom, i.left - 1));
        }
        if i.right < self.right {
            out.push(Region::new(i.top, i.right + 1, i.bottom, self.right));
        }
        out
    }

    /// Iterate every cell of a bounded region, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.top..=self.bottom).flat_map(move |r| (self.left..=self.right).map(move |c| (r, c)))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.right == UNBOUNDED && self.left == 0 && self.bottom != UNBOUNDED {
            return write!(f, "{}:{}", self.top + 1, self.bottom + 1);
        }
        if self.bottom == UNBOUNDED && self.top == 0 && self.right != UNBOUNDED {
            let s = cell_to_a1(0, self.left);
            let e = cell_to_a1(0, self.right);
            return write!(
                f,
                "{}:{}",
                s.trim_end_matches('1'),
                e.trim_end_matches('1')
            );
        }
        if self.is_single_cell() {
            return f.write_str(&cell_to_a1(self.top, self.left));
        }
        write!(
            f,
            "{}:{}",
            cell_to_a1(self.top, self.left),
            cell_to_a1(self.bottom, self.right)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalises_corners() {
        let r = Region::new(5, 4, 1, 2);
        assert_eq!((r.top, r.left, r.bottom, r.right), (1, 2, 5, 4));
        assert_eq!(r.height(), 5);
        assert_eq!(r.width(), 3);
    }

    #[test]
    fn unbounded_edges_survive_shift_and_expand() {
        let r = Region::rows(3, 4);
        assert_eq!(r.shift(0, 10).right, UNBOUNDED);
        assert_eq!(r.expand(Edge::Right, 2).right, UNBOUNDED);
        assert_eq!(r.shift(2, 0), Region::rows(5, 6));
    }

    #[test]
    fn subtract_yields_non_overlapping_pieces() {
        let outer = Region::new(0, 0, 4, 4);
        let hole = Region::new(1, 1, 2, 2);
        let pieces = outer.subtract(&hole);
        assert_eq!(pieces.len(), 4);
        let covered: u128 = pieces.iter().map(|p| p.area()).sum();
        assert_eq!(covered, outer.area() - hole.area());
        for (i, a) in pieces.iter().enumerate() {
            assert!(!a.intersects(&hole));
            for b in &pieces[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
        assert_eq!(outer.subtract(&Region::cell(9, 9)), vec![outer]);
        assert!(hole.subtract(&outer).is_empty());
    }

    #[test]
    fn intersection_and_union() {
        let a = Region::new(0, 0, 2, 2);
        let b = Region::new(2, 2, 5, 5);
        assert_eq!(a.intersection(&b), Some(Region::cell(2, 2)));
        assert_eq!(a.bounding_union(&b), Region::new(0, 0, 5, 5));
        assert!(a.intersection(&Region::cell(3, 0)).is_none());
        assert!(Region::cols(1, 1).intersects(&Region::cell(1000, 1)));
    }

    #[test]
    fn displays_as_a1() {
        assert_eq!(Region::new(0, 0, 2, 1).to_string(), "A1:B3");
        assert_eq!(Region::cell(9, 27).to_string(), "AB10");
        assert_eq!(Region::rows(1, 2).to_string(), "2:3");
        assert_eq!(Region::cols(0, 2).to_string(), "A:C");
    }
}
