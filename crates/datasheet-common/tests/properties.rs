use datasheet_common::{Axis, Edge, Region};
use proptest::prelude::*;

fn region() -> impl Strategy<Value = Region> {
    (0u32..12, 0u32..12, 0u32..6, 0u32..6).prop_map(|(r, c, h, w)| Region::new(r, c, r + h, c + w))
}

fn axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::Row), Just(Axis::Col)]
}

/// Every cell of the 20x20 grid the generated regions can touch.
fn grid() -> impl Iterator<Item = (u32, u32)> {
    (0..20u32).flat_map(|r| (0..20u32).map(move |c| (r, c)))
}

proptest! {
    #[test]
    fn intersection_holds_exactly_the_shared_cells(a in region(), b in region()) {
        let i = a.intersection(&b);
        prop_assert_eq!(i, b.intersection(&a));
        prop_assert_eq!(i.is_some(), a.intersects(&b));
        for (r, c) in grid() {
            let shared = a.contains(r, c) && b.contains(r, c);
            prop_assert_eq!(i.is_some_and(|i| i.contains(r, c)), shared);
        }
    }

    #[test]
    fn subtract_tiles_the_remainder(a in region(), b in region()) {
        let pieces = a.subtract(&b);
        prop_assert!(pieces.len() <= 4);
        for (r, c) in grid() {
            let hits = pieces.iter().filter(|p| p.contains(r, c)).count();
            let expected = usize::from(a.contains(r, c) && !b.contains(r, c));
            prop_assert_eq!(hits, expected, "cell ({}, {})", r, c);
        }
        let covered: u128 = pieces.iter().map(Region::area).sum();
        let shared = a.intersection(&b).map_or(0, |i| i.area());
        prop_assert_eq!(covered + shared, a.area());
    }

    #[test]
    fn shift_is_reversible_away_from_the_origin(a in region(), d in 0i64..8, axis in axis()) {
        let moved = a.shift_along(axis, d);
        prop_assert_eq!(moved.height(), a.height());
        prop_assert_eq!(moved.width(), a.width());
        prop_assert_eq!(moved.leading(axis), a.leading(axis) + d as u32);
        prop_assert_eq!(moved.shift_along(axis, -d), a);
    }

    #[test]
    fn shift_clamps_at_the_origin(a in region(), axis in axis()) {
        let moved = a.shift_along(axis, -100);
        prop_assert_eq!(moved.leading(axis), 0);
        prop_assert_eq!(moved.trailing(axis), 0);
        prop_assert_eq!(moved.leading(axis.other()), a.leading(axis.other()));
    }

    #[test]
    fn bounding_union_covers_both(a in region(), b in region()) {
        let u = a.bounding_union(&b);
        prop_assert!(u.contains_region(&a) && u.contains_region(&b));
        prop_assert_eq!(u, b.bounding_union(&a));
    }

    #[test]
    fn expand_then_shrink_restores(a in region(), n in 0i64..5) {
        for edge in [Edge::Top, Edge::Left, Edge::Bottom, Edge::Right] {
            let grown = a.expand(edge, n);
            prop_assert!(grown.contains_region(&a));
            let clamped = match edge {
                Edge::Top => i64::from(a.top) < n,
                Edge::Left => i64::from(a.left) < n,
                _ => false,
            };
            if !clamped {
                prop_assert_eq!(grown.expand(edge, -n), a);
            }
        }
    }
}
