//! Geometric checks on placed crates.
//!
//! These work on placements directly, independent of the occupancy grid, and
//! are used to audit finished plans.

use crate::model::{CrateId, PlacedCrate, Truck};

/// Checks whether two placed crates share a cell.
///
/// Uses axis-aligned bounding box separation: the crates are disjoint as soon
/// as they are separated along one axis.
pub fn intersects(a: &PlacedCrate, b: &PlacedCrate) -> bool {
    a.bounding_box().intersects(&b.bounding_box())
}

/// Checks whether a placed crate lies completely inside the truck.
pub fn within_bounds(placed: &PlacedCrate, truck: &Truck) -> bool {
    truck.bounds().contains_box(&placed.bounding_box())
}

/// Returns the ids of the first pair of overlapping crates, in placement order.
pub fn first_collision(placements: &[PlacedCrate]) -> Option<(CrateId, CrateId)> {
    placements.iter().enumerate().find_map(|(i, a)| {
        placements[i + 1..]
            .iter()
            .find(|b| intersects(a, b))
            .map(|b| (a.crate_id, b.crate_id))
    })
}

/// Returns the id of the first crate sticking out of the truck.
pub fn first_out_of_bounds(placements: &[PlacedCrate], truck: &Truck) -> Option<CrateId> {
    placements
        .iter()
        .find(|p| !within_bounds(p, truck))
        .map(|p| p.crate_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Crate, Orientation};
    use crate::types::Point3;

    fn placed(id: CrateId, dims: (i64, i64, i64), pos: (i64, i64, i64)) -> PlacedCrate {
        let crate_ = Crate::new(id, dims.0, dims.1, dims.2).unwrap();
        PlacedCrate::new(&crate_, Orientation::Original, Point3::new(pos.0, pos.1, pos.2))
    }

    #[test]
    fn face_contact_is_not_a_collision() {
        let a = placed(1, (1, 1, 1), (0, 0, 0));
        let b = placed(2, (1, 1, 1), (0, 0, 1));
        assert!(!intersects(&a, &b));
        assert_eq!(first_collision(&[a, b]), None);
    }

    #[test]
    fn reports_first_overlapping_pair() {
        let a = placed(1, (2, 1, 1), (0, 0, 0));
        let b = placed(2, (1, 1, 1), (0, 1, 0));
        let c = placed(3, (1, 1, 1), (1, 0, 0));
        assert_eq!(first_collision(&[a, b, c]), Some((1, 3)));
    }

    #[test]
    fn detects_crates_outside_truck() {
        let truck = Truck::new(2, 1, 1).unwrap();
        let inside = placed(1, (2, 1, 1), (0, 0, 0));
        let outside = placed(2, (1, 1, 2), (0, 0, 0));

        assert!(within_bounds(&inside, &truck));
        assert!(!within_bounds(&outside, &truck));
        assert_eq!(first_out_of_bounds(&[inside, outside], &truck), Some(2));
    }
}
